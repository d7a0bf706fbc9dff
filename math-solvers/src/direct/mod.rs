//! Direct solvers for linear systems
//!
//! This module provides direct (non-iterative) solvers:
//! - [`lu_solve`]: LU decomposition with partial pivoting
//! - [`least_squares`]: Householder QR for small overdetermined fits

mod lstsq;
mod lu;

pub use lstsq::{LstsqError, least_squares};
pub use lu::{LuError, LuFactorization, lu_factorize, lu_factorize_owned, lu_solve};
