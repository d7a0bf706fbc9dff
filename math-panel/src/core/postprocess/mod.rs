//! Post-processing of solved doublet strengths
//!
//! ## Module Organization
//!
//! - [`velocity`] - Node frames and least-squares surface velocities
//! - [`cp`] - Pressure coefficients on thick and thin panels
//! - [`field`] - Off-body perturbation velocity
//! - [`forces`] - Kutta-Joukowski forces, pressure moments, coefficients
//! - [`stability`] - Central-difference stability derivatives
//! - [`trim`] - Zero-moment angle search
//! - [`vorton`] - Vorton wake and induced drag

pub mod cp;
pub mod field;
pub mod forces;
pub mod stability;
pub mod trim;
pub mod velocity;
pub mod vorton;

pub use cp::{panel_average, vertex_cp};
pub use field::velocity_at;
pub use forces::{
    AeroCoefficients, far_wake_velocities, pressure_force, pressure_moment, trailing_force,
};
pub use stability::{StabDerivatives, stability_axes, stability_derivatives};
pub use trim::zero_moment_angle;
pub use velocity::{NodeFailure, node_frame, node_values, node_velocities, vertex_densities};
pub use vorton::{NegatingVortex, Vorton, VortonDrag, VortonWake};
