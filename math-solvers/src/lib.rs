//! Dense linear solvers for panel-method flow models
//!
//! This crate provides the direct solvers used by the panel solver, along with
//! a precision-tagged dense matrix type.
//!
//! # Features
//!
//! - **Direct Solvers**: LU decomposition with partial pivoting, multiple right-hand sides
//! - **Least Squares**: Householder QR for small local fits
//! - **Runtime Precision**: Single or double precision storage behind one API
//! - **Parallel Elimination**: Row updates distributed with rayon (`parallel` feature)
//!
//! # Example
//!
//! ```ignore
//! use math_flow_solvers::{DenseMatrix, Precision};
//!
//! let mut matrix = DenseMatrix::zeros(n, Precision::Single);
//! // ... fill the matrix ...
//! let lu = matrix.factorize()?;
//! let solution = lu.solve_many(&rhs)?;
//! ```

#![warn(missing_docs)]

pub mod dense;
pub mod direct;
pub mod traits;

// Re-export main types
pub use dense::{DenseLu, DenseMatrix, DenseVisitor, Precision};
pub use traits::RealField;

// Re-export direct solvers
pub use direct::{
    LstsqError, LuError, LuFactorization, least_squares, lu_factorize, lu_factorize_owned,
    lu_solve,
};
