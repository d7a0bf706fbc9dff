//! Panel-method potential-flow solver
//!
//! This module assembles and solves the doublet system of a triangulated
//! body with its trailing wake, then derives surface pressures, loads,
//! stability derivatives and the vorton wake from the solution.
//!
//! ## Architecture
//!
//! - `types`: Vector algebra and panel classification
//! - `config`: Analysis configuration (precision, threads, formulation, images)
//! - `mesh`: Panels, wake panels, nodes and mesh generators
//! - `integration`: Triangle quadrature and singularity kernels
//! - `assembly`: Influence matrix, wake columns and right-hand sides
//! - `parallel`: Worker pool, row-block parallel loops and stage flags
//! - `postprocess`: Velocities, Cp, forces, stability derivatives, vortons
//! - `analysis`: Staged analysis driving all of the above

pub mod analysis;
pub mod assembly;
pub mod config;
pub mod integration;
pub mod mesh;
pub mod parallel;
pub mod postprocess;
pub mod types;

// Re-exports for convenience
pub use analysis::{OperatingPoint, PanelAnalysis};
pub use assembly::{FlowField, wind_direction};
pub use config::{
    AnalysisConfig, AxisStrategy, BoundaryCondition, Formulation, ReferenceGeometry,
    SurfaceEffect, VortonConfig,
};
pub use integration::TriangleRule;
pub use mesh::{
    ClosedWingSpec, FlatPlateSpec, PanelMesh, PanelSpec, WakePanelSpec, closed_wing, flat_plate,
    two_panel_mesh,
};
pub use parallel::CancelToken;
pub use postprocess::{AeroCoefficients, StabDerivatives, VortonDrag};
pub use solvers::Precision;
pub use types::*;
