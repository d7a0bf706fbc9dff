//! # Panel: 3D Potential-Flow Panel Method
//!
//! Dense boundary-element solver for lifting surfaces and thick bodies in
//! inviscid, incompressible flow.
//!
//! ## Features
//!
//! - Linear (three basis functions per triangle) and uniform doublet formulations
//! - Neumann and Dirichlet boundary conditions, ground and free-surface images
//! - Flat trailing wake with implicit Kutta condition
//! - Single or double precision LU factorization shared by all flow conditions
//! - Surface velocity and Cp reconstruction, Kutta-Joukowski forces
//! - Stability derivatives by central differences on the unit flows
//! - Vorton wake for induced-drag estimation
//! - Parallel assembly with Rayon and cooperative cancellation
//!
//! ## Example
//!
//! ```ignore
//! use panel::{AnalysisConfig, FlatPlateSpec, PanelAnalysis, flat_plate};
//!
//! let mesh = flat_plate(&FlatPlateSpec::default())?;
//! let mut analysis = PanelAnalysis::new(mesh, AnalysisConfig::default())?;
//! analysis.run()?;
//! let op = analysis.solve_operating_point(2.0_f64.to_radians(), 0.0, 10.0)?;
//! println!("CL = {:.4}", op.coefficients.cl);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)] // Scientific code often has many parameters

pub mod core;
pub mod error;

// Re-exports
pub use crate::core::*;
pub use error::{PanelError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git commit hash (set during build)
pub const GIT_HASH: &str = env!("GIT_HASH");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
