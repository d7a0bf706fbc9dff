//! Precision-tagged dense matrices
//!
//! The system matrix of a panel model can be stored in single or double
//! precision. [`DenseMatrix`] and [`DenseLu`] carry the storage type as an
//! enum variant so callers pick the precision at runtime while every entry
//! point keeps working with `f64` right-hand sides and solutions.

use crate::direct::{LuError, LuFactorization, lu_factorize_owned};
use crate::traits::RealField;
use ndarray::{Array2, ArrayViewMut2};
use serde::{Deserialize, Serialize};

/// Storage precision of a dense system matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// 32-bit floats
    Single,
    /// 64-bit floats
    #[default]
    Double,
}

impl Precision {
    /// Bytes used per matrix entry
    pub fn bytes_per_entry(self) -> usize {
        match self {
            Precision::Single => std::mem::size_of::<f32>(),
            Precision::Double => std::mem::size_of::<f64>(),
        }
    }
}

/// Dense square matrix in the selected storage precision
#[derive(Debug, Clone)]
pub enum DenseMatrix {
    /// Single precision storage
    Single(Array2<f32>),
    /// Double precision storage
    Double(Array2<f64>),
}

impl DenseMatrix {
    /// Allocate an `n x n` zero matrix
    pub fn zeros(n: usize, precision: Precision) -> Self {
        match precision {
            Precision::Single => DenseMatrix::Single(Array2::zeros((n, n))),
            Precision::Double => DenseMatrix::Double(Array2::zeros((n, n))),
        }
    }

    /// Storage precision
    pub fn precision(&self) -> Precision {
        match self {
            DenseMatrix::Single(_) => Precision::Single,
            DenseMatrix::Double(_) => Precision::Double,
        }
    }

    /// Matrix dimension
    pub fn dim(&self) -> usize {
        match self {
            DenseMatrix::Single(m) => m.nrows(),
            DenseMatrix::Double(m) => m.nrows(),
        }
    }

    /// Read an entry widened to `f64`
    pub fn get(&self, row: usize, col: usize) -> f64 {
        match self {
            DenseMatrix::Single(m) => m[[row, col]].to_f64_lossy(),
            DenseMatrix::Double(m) => m[[row, col]],
        }
    }

    /// Copy to a double precision array
    pub fn to_f64(&self) -> Array2<f64> {
        match self {
            DenseMatrix::Single(m) => m.mapv(|v| v.to_f64_lossy()),
            DenseMatrix::Double(m) => m.clone(),
        }
    }

    /// Run a closure over the typed storage
    pub fn with_storage_mut<V: DenseVisitor>(&mut self, visitor: V) -> V::Output {
        match self {
            DenseMatrix::Single(m) => visitor.visit(m.view_mut()),
            DenseMatrix::Double(m) => visitor.visit(m.view_mut()),
        }
    }

    /// Factorize, consuming the matrix storage
    pub fn factorize(self) -> Result<DenseLu, LuError> {
        match self {
            DenseMatrix::Single(m) => Ok(DenseLu::Single(lu_factorize_owned(m)?)),
            DenseMatrix::Double(m) => Ok(DenseLu::Double(lu_factorize_owned(m)?)),
        }
    }
}

/// Generic operation over the typed storage of a [`DenseMatrix`]
///
/// Lets assembly code be written once for `f32` and `f64`.
pub trait DenseVisitor {
    /// Result of the visit
    type Output;

    /// Visit the storage
    fn visit<T: RealField>(self, matrix: ArrayViewMut2<'_, T>) -> Self::Output;
}

/// LU factorization in the selected storage precision
#[derive(Debug, Clone)]
pub enum DenseLu {
    /// Single precision factors
    Single(LuFactorization<f32>),
    /// Double precision factors
    Double(LuFactorization<f64>),
}

impl DenseLu {
    /// Storage precision of the factors
    pub fn precision(&self) -> Precision {
        match self {
            DenseLu::Single(_) => Precision::Single,
            DenseLu::Double(_) => Precision::Double,
        }
    }

    /// System dimension
    pub fn dim(&self) -> usize {
        match self {
            DenseLu::Single(lu) => lu.n,
            DenseLu::Double(lu) => lu.n,
        }
    }

    /// Solve for every column of `rhs`, converting through the storage precision
    pub fn solve_many(&self, rhs: &Array2<f64>) -> Result<Array2<f64>, LuError> {
        match self {
            DenseLu::Single(lu) => {
                let b = rhs.mapv(f32::from_f64_lossy);
                Ok(lu.solve_many(&b)?.mapv(|v| v.to_f64_lossy()))
            }
            DenseLu::Double(lu) => lu.solve_many(rhs),
        }
    }
}
