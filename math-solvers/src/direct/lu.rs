//! LU decomposition solver
//!
//! Provides LU factorization with partial pivoting for solving dense linear systems.
//! The elimination step updates the trailing rows in parallel when the
//! `parallel` feature is enabled.

use crate::traits::RealField;
use ndarray::{Array1, Array2, ArrayViewMut1, Axis, s};
use thiserror::Error;

#[cfg(feature = "parallel")]
use ndarray::parallel::prelude::*;

/// Below this dimension the elimination stays sequential
#[cfg(feature = "parallel")]
const PARALLEL_THRESHOLD: usize = 128;

/// Errors that can occur during LU factorization
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LuError {
    /// A pivot column vanished during elimination
    #[error("Matrix is singular or nearly singular (pivot column {column})")]
    SingularMatrix {
        /// Column at which elimination failed
        column: usize,
    },
    /// Right-hand side or matrix has the wrong shape
    #[error("Matrix dimensions mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected size
        expected: usize,
        /// Actual size
        got: usize,
    },
}

/// LU factorization result
///
/// Stores L and U factors along with pivot information
#[derive(Debug, Clone)]
pub struct LuFactorization<T: RealField> {
    /// Combined L and U matrices (L is unit lower triangular, stored below diagonal)
    pub lu: Array2<T>,
    /// Row interchanges: at step `k` row `k` was swapped with row `pivots[k]`
    pub pivots: Vec<usize>,
    /// Matrix dimension
    pub n: usize,
}

impl<T: RealField> LuFactorization<T> {
    /// Solve Ax = b using the pre-computed LU factorization
    pub fn solve(&self, b: &Array1<T>) -> Result<Array1<T>, LuError> {
        if b.len() != self.n {
            return Err(LuError::DimensionMismatch {
                expected: self.n,
                got: b.len(),
            });
        }

        let mut x = b.clone();
        self.solve_in_place(x.view_mut())?;
        Ok(x)
    }

    /// Solve AX = B for every column of `b`
    pub fn solve_many(&self, b: &Array2<T>) -> Result<Array2<T>, LuError> {
        if b.nrows() != self.n {
            return Err(LuError::DimensionMismatch {
                expected: self.n,
                got: b.nrows(),
            });
        }

        let mut x = b.clone();
        for column in x.axis_iter_mut(Axis(1)) {
            self.solve_in_place(column)?;
        }
        Ok(x)
    }

    fn solve_in_place(&self, mut x: ArrayViewMut1<'_, T>) -> Result<(), LuError> {
        // Apply the row interchanges in the order they were made
        for (i, &pivot) in self.pivots.iter().enumerate() {
            if pivot != i {
                x.swap(i, pivot);
            }
        }

        // Forward substitution: Ly = Pb
        for i in 0..self.n {
            let mut acc = x[i];
            for j in 0..i {
                acc -= self.lu[[i, j]] * x[j];
            }
            x[i] = acc;
        }

        // Backward substitution: Ux = y
        for i in (0..self.n).rev() {
            let mut acc = x[i];
            for j in (i + 1)..self.n {
                acc -= self.lu[[i, j]] * x[j];
            }
            let u_ii = self.lu[[i, i]];
            if u_ii.abs() < T::singular_threshold() {
                return Err(LuError::SingularMatrix { column: i });
            }
            x[i] = acc / u_ii;
        }

        Ok(())
    }
}

/// Compute LU factorization with partial pivoting, consuming the matrix
pub fn lu_factorize_owned<T: RealField>(mut lu: Array2<T>) -> Result<LuFactorization<T>, LuError> {
    let n = lu.nrows();
    if n != lu.ncols() {
        return Err(LuError::DimensionMismatch {
            expected: n,
            got: lu.ncols(),
        });
    }

    let mut pivots: Vec<usize> = (0..n).collect();

    for k in 0..n {
        // Find pivot
        let mut max_val = lu[[k, k]].abs();
        let mut max_row = k;
        for i in (k + 1)..n {
            let val = lu[[i, k]].abs();
            if val > max_val {
                max_val = val;
                max_row = i;
            }
        }

        if max_val < T::singular_threshold() {
            return Err(LuError::SingularMatrix { column: k });
        }

        if max_row != k {
            for j in 0..n {
                lu.swap([k, j], [max_row, j]);
            }
        }
        pivots[k] = max_row;

        let (top, mut bottom) = lu.view_mut().split_at(Axis(0), k + 1);
        let pivot_row = top.row(k);
        let pivot = pivot_row[k];

        let eliminate = |mut row: ArrayViewMut1<'_, T>| {
            let mult = row[k] / pivot;
            row[k] = mult;
            if mult != T::zero() {
                row.slice_mut(s![k + 1..])
                    .zip_mut_with(&pivot_row.slice(s![k + 1..]), |r, &p| *r -= mult * p);
            }
        };

        #[cfg(feature = "parallel")]
        {
            if n >= PARALLEL_THRESHOLD {
                bottom
                    .axis_iter_mut(Axis(0))
                    .into_par_iter()
                    .for_each(eliminate);
            } else {
                bottom.axis_iter_mut(Axis(0)).for_each(eliminate);
            }
        }

        #[cfg(not(feature = "parallel"))]
        {
            bottom.axis_iter_mut(Axis(0)).for_each(eliminate);
        }
    }

    Ok(LuFactorization { lu, pivots, n })
}

/// Compute LU factorization with partial pivoting
pub fn lu_factorize<T: RealField>(a: &Array2<T>) -> Result<LuFactorization<T>, LuError> {
    lu_factorize_owned(a.clone())
}

/// Solve Ax = b using LU decomposition
///
/// This is a convenience function that combines factorization and solve.
pub fn lu_solve<T: RealField>(a: &Array2<T>, b: &Array1<T>) -> Result<Array1<T>, LuError> {
    let factorization = lu_factorize(a)?;
    factorization.solve(b)
}
