//! Dense least-squares solver
//!
//! Solves overdetermined systems `min ||A x - b||` with Householder QR.
//! Used for small local fits (a handful of rows, two or three unknowns), so
//! everything stays sequential.

use crate::traits::RealField;
use ndarray::{Array2, ArrayView2, Axis};
use thiserror::Error;

/// Errors that can occur during a least-squares solve
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LstsqError {
    /// Fewer equations than unknowns
    #[error("Underdetermined system: {rows} rows for {cols} unknowns")]
    Underdetermined {
        /// Number of equations
        rows: usize,
        /// Number of unknowns
        cols: usize,
    },
    /// Right-hand side has the wrong number of rows
    #[error("Right-hand side has {got} rows, expected {expected}")]
    DimensionMismatch {
        /// Expected row count
        expected: usize,
        /// Actual row count
        got: usize,
    },
    /// The columns of the system are (numerically) linearly dependent
    #[error("Rank deficient system at column {column}")]
    RankDeficient {
        /// First column found to be dependent
        column: usize,
    },
}

/// Solve `min ||A X - B||` column by column
///
/// `a` is `m x n` with `m >= n`, `b` is `m x k`; the result is `n x k`.
pub fn least_squares<T: RealField>(
    a: ArrayView2<'_, T>,
    b: ArrayView2<'_, T>,
) -> Result<Array2<T>, LstsqError> {
    let (m, n) = a.dim();
    if m < n {
        return Err(LstsqError::Underdetermined { rows: m, cols: n });
    }
    if b.nrows() != m {
        return Err(LstsqError::DimensionMismatch {
            expected: m,
            got: b.nrows(),
        });
    }

    let mut r = a.to_owned();
    let mut qtb = b.to_owned();
    let scale = r.iter().fold(T::zero(), |acc, v| acc.max(v.abs()));
    let tolerance = scale * T::epsilon() * T::from_f64_lossy((m.max(n) * 10) as f64);

    for j in 0..n {
        // Householder vector for column j, rows j..m
        let mut norm = T::zero();
        for i in j..m {
            norm += r[[i, j]] * r[[i, j]];
        }
        let norm = norm.sqrt();
        if norm <= tolerance {
            return Err(LstsqError::RankDeficient { column: j });
        }

        let alpha = if r[[j, j]] > T::zero() { -norm } else { norm };
        let mut v: Vec<T> = (j..m).map(|i| r[[i, j]]).collect();
        v[0] -= alpha;
        let v_norm_sq = v.iter().fold(T::zero(), |acc, &x| acc + x * x);
        if v_norm_sq == T::zero() {
            continue;
        }
        let two = T::one() + T::one();

        for col in j..n {
            let dot = v
                .iter()
                .enumerate()
                .fold(T::zero(), |acc, (k, &vk)| acc + vk * r[[j + k, col]]);
            let f = two * dot / v_norm_sq;
            for (k, &vk) in v.iter().enumerate() {
                r[[j + k, col]] -= f * vk;
            }
        }
        for mut rhs in qtb.axis_iter_mut(Axis(1)) {
            let dot = v
                .iter()
                .enumerate()
                .fold(T::zero(), |acc, (k, &vk)| acc + vk * rhs[j + k]);
            let f = two * dot / v_norm_sq;
            for (k, &vk) in v.iter().enumerate() {
                rhs[j + k] -= f * vk;
            }
        }
    }

    // Back substitution on the leading n x n block of R
    let k = b.ncols();
    let mut x = Array2::from_elem((n, k), T::zero());
    for c in 0..k {
        for i in (0..n).rev() {
            let mut acc = qtb[[i, c]];
            for j in (i + 1)..n {
                acc -= r[[i, j]] * x[[j, c]];
            }
            let diag = r[[i, i]];
            if diag.abs() <= tolerance {
                return Err(LstsqError::RankDeficient { column: i });
            }
            x[[i, c]] = acc / diag;
        }
    }

    Ok(x)
}
