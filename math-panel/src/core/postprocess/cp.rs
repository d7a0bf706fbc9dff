//! Pressure coefficients
//!
//! Thick panels use `Cp = 1 - |V|²/Q²` with the node-normal component of the
//! surface velocity removed. Thin panels carry a velocity jump: the upper and
//! lower surfaces see `V∞ ± ΔV/2` and the panel reports the pressure
//! difference `Cp_upper - Cp_lower`.

use crate::core::assembly::{AssemblyContext, FlowField};
use crate::core::types::Vector3;

/// Cp at the three vertices of every panel
///
/// `node_velocity` is the doublet-induced velocity of each node, `q_inf` the
/// reference speed used for the normalisation.
pub fn vertex_cp(
    ctx: &AssemblyContext<'_>,
    field: &FlowField,
    node_velocity: &[Vector3],
    q_inf: f64,
) -> Vec<[f64; 3]> {
    let q2 = q_inf * q_inf;
    let cog = ctx.reference.cog;
    ctx.mesh
        .panels
        .iter()
        .map(|panel| {
            let mut cp = [0.0; 3];
            for (value, (&node, &vertex)) in cp
                .iter_mut()
                .zip(panel.nodes.iter().zip(panel.geom.vertices.iter()))
            {
                let local = field.at(vertex, cog);
                let induced = node_velocity[node];
                *value = if panel.is_mid() {
                    let upper = local + induced * 0.5;
                    let lower = local - induced * 0.5;
                    (1.0 - upper.norm_squared() / q2) - (1.0 - lower.norm_squared() / q2)
                } else {
                    let normal = ctx.mesh.nodes[node].normal;
                    let mut v = local + induced;
                    v -= normal * v.dot(&normal);
                    1.0 - v.norm_squared() / q2
                };
            }
            cp
        })
        .collect()
}

/// Panel average of vertex values
#[inline]
pub fn panel_average(values: &[f64; 3]) -> f64 {
    (values[0] + values[1] + values[2]) / 3.0
}
