//! Numerical integration for panel influences
//!
//! ## Module Organization
//!
//! - [`gauss`] - Gauss quadrature rules on triangles
//! - [`kernels`] - Closed-form source, doublet and vortex kernels of flat triangles

pub mod gauss;
pub mod kernels;

pub use gauss::{TriangleRule, linear_basis, triangle_quadrature};
pub use kernels::{
    FOUR_PI, KernelParams, PlaneSide, SourceField, linear_doublet_potentials,
    linear_doublet_velocities, solid_angle, source_field, uniform_doublet_potential,
    uniform_doublet_velocity, vortex_segment_velocity,
};
