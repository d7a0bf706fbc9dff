//! Forces, moments and aerodynamic coefficients
//!
//! Forces come from the Kutta-Joukowski theorem applied on each trailing
//! strip, with the velocity taken where the wake has rolled past the body:
//! the wake-induced velocity at the middle of the last wake edge plus the
//! local freestream. Moments come from the surface pressure.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use super::cp::panel_average;
use crate::core::assembly::{
    AssemblyContext, FlowField, wake_velocity, wind_direction, wind_normal, wind_side,
};
use crate::core::config::ReferenceGeometry;
use crate::core::integration::FOUR_PI;
use crate::core::types::Vector3;

/// Wake-induced velocity at the far end of every wake column
pub fn far_wake_velocities(ctx: &AssemblyContext<'_>, mu: ArrayView1<'_, f64>) -> Vec<Vector3> {
    ctx.columns
        .iter()
        .map(|column| wake_velocity(ctx, mu, column.far_point(ctx.mesh)))
        .collect()
}

/// Circulation of each trailing strip
///
/// `-4π` times the mean of the column's left and right strengths.
pub fn strip_circulations(ctx: &AssemblyContext<'_>, mu: ArrayView1<'_, f64>) -> Vec<f64> {
    ctx.columns
        .iter()
        .map(|column| {
            let (left, right) = column.strengths(mu, ctx.formulation);
            -FOUR_PI * 0.5 * (left + right)
        })
        .collect()
}

/// Kutta-Joukowski force summed over the trailing strips (N)
///
/// `far_velocity` holds the wake-induced velocity of each column, from
/// [`far_wake_velocities`].
pub fn trailing_force(
    ctx: &AssemblyContext<'_>,
    mu: ArrayView1<'_, f64>,
    far_velocity: &[Vector3],
    field: &FlowField,
    density: f64,
) -> Vector3 {
    let cog = ctx.reference.cog;
    let circulations = strip_circulations(ctx, mu);
    ctx.columns
        .iter()
        .zip(circulations)
        .zip(far_velocity)
        .map(|((column, gamma), &induced)| {
            let panel = &ctx.mesh.panels[column.panel];
            let wg = induced + field.at(panel.geom.centroid, cog);
            wg.cross(&panel.trailing_vortex()) * (density * gamma)
        })
        .sum()
}

/// Pressure moment about the reference CoG (N·m)
pub fn pressure_moment(
    ctx: &AssemblyContext<'_>,
    cp: &[[f64; 3]],
    q_inf: f64,
    density: f64,
) -> Vector3 {
    let dynamic = 0.5 * density * q_inf * q_inf;
    let cog = ctx.reference.cog;
    ctx.mesh
        .panels
        .iter()
        .zip(cp)
        .map(|(panel, values)| {
            let force = panel.geom.normal * (-panel_average(values) * panel.geom.area * dynamic);
            (panel.geom.centroid - cog).cross(&force)
        })
        .sum()
}

/// Force from integrating the surface pressure (N)
pub fn pressure_force(
    ctx: &AssemblyContext<'_>,
    cp: &[[f64; 3]],
    q_inf: f64,
    density: f64,
) -> Vector3 {
    let dynamic = 0.5 * density * q_inf * q_inf;
    ctx.mesh
        .panels
        .iter()
        .zip(cp)
        .map(|(panel, values)| {
            panel.geom.normal * (-panel_average(values) * panel.geom.area * dynamic)
        })
        .sum()
}

/// Pitching moment coefficient of a unit-speed pressure field in the x-z plane
pub fn pitching_moment_coefficient(ctx: &AssemblyContext<'_>, cp: &[[f64; 3]]) -> f64 {
    let cog = ctx.reference.cog;
    ctx.mesh
        .panels
        .iter()
        .zip(cp)
        .map(|(panel, values)| {
            let f = panel.geom.normal * (-panel_average(values) * panel.geom.area);
            let arm = panel.geom.centroid - cog;
            -arm.x * f.z + arm.z * f.x
        })
        .sum()
}

/// Force and moment coefficients in wind axes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AeroCoefficients {
    /// Lift
    pub cl: f64,
    /// Induced drag
    pub cd: f64,
    /// Side force
    pub cy: f64,
    /// Rolling moment
    pub cl_roll: f64,
    /// Pitching moment
    pub cm: f64,
    /// Yawing moment
    pub cn: f64,
}

impl AeroCoefficients {
    /// Normalise a force and moment by the dynamic pressure and reference geometry
    pub fn from_loads(
        force: Vector3,
        moment: Vector3,
        alpha: f64,
        beta: f64,
        q_inf: f64,
        density: f64,
        reference: &ReferenceGeometry,
    ) -> Self {
        let q_s = 0.5 * density * q_inf * q_inf * reference.area;
        if q_s <= 0.0 {
            return Self::default();
        }
        Self {
            cl: force.dot(&wind_normal(alpha, beta)) / q_s,
            cd: force.dot(&wind_direction(alpha, beta)) / q_s,
            cy: force.dot(&wind_side(alpha, beta)) / q_s,
            cl_roll: moment.x / (q_s * reference.span),
            cm: moment.y / (q_s * reference.chord),
            cn: moment.z / (q_s * reference.span),
        }
    }
}
