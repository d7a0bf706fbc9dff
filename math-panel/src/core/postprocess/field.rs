//! Off-body perturbation velocity

use ndarray::ArrayView1;

use crate::core::assembly::{AssemblyContext, wake_velocity};
use crate::core::config::Formulation;
use crate::core::types::Vector3;

/// Perturbation velocity at `point` for doublet strengths `mu` and sources `sigma`
///
/// Sums the body doublets, the sources of thick panels and the wake columns,
/// images included. With `wake_only` only the wake contributes. The
/// freestream is not included.
pub fn velocity_at(
    ctx: &AssemblyContext<'_>,
    mu: ArrayView1<'_, f64>,
    sigma: ArrayView1<'_, f64>,
    point: Vector3,
    wake_only: bool,
) -> Vector3 {
    let mut velocity = wake_velocity(ctx, mu, point);
    if wake_only {
        return velocity;
    }

    for (k, panel) in ctx.mesh.panels.iter().enumerate() {
        let image = ctx.panel_image(k);
        match ctx.formulation {
            Formulation::Linear => {
                let basis = ctx.linear_velocities(&panel.geom, image, point);
                for (n, v) in basis.iter().enumerate() {
                    velocity += *v * mu[3 * k + n];
                }
            }
            Formulation::Uniform => {
                velocity += ctx.uniform_velocity(&panel.geom, image, point) * mu[k];
            }
        }
        if !panel.is_mid() && sigma[k] != 0.0 {
            velocity += ctx.source_velocity(&panel.geom, image, point) * sigma[k];
        }
    }
    velocity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AnalysisConfig;
    use crate::core::mesh::{FlatPlateSpec, flat_plate};
    use approx::assert_relative_eq;
    use ndarray::Array1;

    #[test]
    fn test_zero_strengths_induce_nothing() {
        let mesh = flat_plate(&FlatPlateSpec::default()).unwrap();
        let ctx = AssemblyContext::new(&mesh, &AnalysisConfig::default()).unwrap();
        let mu = Array1::zeros(ctx.n_unknowns());
        let sigma = Array1::zeros(mesh.n_panels());
        let v = velocity_at(&ctx, mu.view(), sigma.view(), Vector3::new(0.5, 0.0, 0.3), false);
        assert_eq!(v, Vector3::zero());
    }

    #[test]
    fn test_constant_doublet_without_wake_is_a_ring() {
        // A plate of constant doublet density is a single vortex ring along its edge
        let mesh = flat_plate(&FlatPlateSpec {
            nx: 2,
            ny: 2,
            wake_panels: 1,
            ..Default::default()
        })
        .unwrap();
        let ctx = AssemblyContext::new(&mesh, &AnalysisConfig::default()).unwrap();
        let mu = Array1::from_elem(ctx.n_unknowns(), 1.0);
        let sigma = Array1::zeros(mesh.n_panels());
        let point = Vector3::new(0.5, 0.0, 0.4);
        let body = velocity_at(&ctx, mu.view(), sigma.view(), point, false)
            - velocity_at(&ctx, mu.view(), sigma.view(), point, true);
        // Centre of a square ring: on the axis, no in-plane component
        assert_relative_eq!(body.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(body.y, 0.0, epsilon = 1e-9);
        assert!(body.z > 0.0);
    }
}
