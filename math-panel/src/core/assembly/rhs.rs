//! Flow fields and right-hand sides
//!
//! The relative wind seen by the body at `x` is `v_inf + (x - cog) x omega`.
//! The system is linear in that wind, so the six unit fields (three
//! translations, three rotations about the reference CoG) span every flow
//! condition and [`combine_unit`] rebuilds any right-hand side from the unit
//! set without touching the matrix.

use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::AssemblyContext;
use crate::core::integration::FOUR_PI;
use crate::core::mesh::PanelMesh;
use crate::core::parallel::{StageFlags, parallel_row_blocks};
use crate::core::types::Vector3;
use crate::error::Result;

/// Uniform translation plus rigid rotation about the reference CoG
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowField {
    /// Freestream velocity (m/s)
    pub v_inf: Vector3,
    /// Rotation rate (rad/s)
    pub omega: Vector3,
}

impl FlowField {
    /// Pure translation
    pub fn translation(v_inf: Vector3) -> Self {
        Self {
            v_inf,
            omega: Vector3::zero(),
        }
    }

    /// Unit field `j`: translations along x, y, z then rotations about x, y, z
    pub fn unit(j: usize) -> Self {
        let axis = match j % 3 {
            0 => Vector3::unit_x(),
            1 => Vector3::unit_y(),
            _ => Vector3::unit_z(),
        };
        if j < 3 {
            Self::translation(axis)
        } else {
            Self {
                v_inf: Vector3::zero(),
                omega: axis,
            }
        }
    }

    /// Relative wind at `point`
    #[inline]
    pub fn at(&self, point: Vector3, cog: Vector3) -> Vector3 {
        self.v_inf + (point - cog).cross(&self.omega)
    }
}

/// Wind direction for angle of attack `alpha` and sideslip `beta` (radians)
pub fn wind_direction(alpha: f64, beta: f64) -> Vector3 {
    Vector3::new(
        alpha.cos() * beta.cos(),
        -beta.sin(),
        alpha.sin() * beta.cos(),
    )
}

/// Lift direction for angle of attack `alpha`
pub fn wind_normal(alpha: f64, _beta: f64) -> Vector3 {
    Vector3::new(-alpha.sin(), 0.0, alpha.cos())
}

/// Sideforce direction, completing the wind frame
pub fn wind_side(alpha: f64, beta: f64) -> Vector3 {
    wind_normal(alpha, beta).cross(&wind_direction(alpha, beta))
}

/// Source strength of each panel for `field`
///
/// `σ = -V·n / 4π` at the panel centroid; thin panels carry no source.
pub fn source_strengths(mesh: &PanelMesh, field: &FlowField, cog: Vector3) -> Array1<f64> {
    mesh.panels
        .iter()
        .map(|panel| {
            if panel.is_mid() {
                0.0
            } else {
                -field.at(panel.geom.centroid, cog).dot(&panel.geom.normal) / FOUR_PI
            }
        })
        .collect()
}

/// Build one right-hand side column per flow field
///
/// Normal-velocity rows receive `-V·n` integrated against the row weights,
/// potential rows receive nothing from the freestream; every row then adds
/// the source contribution `B·σ` with `B` from
/// [`assemble_source_matrix`](super::assemble_source_matrix).
pub fn build_rhs(
    ctx: &AssemblyContext<'_>,
    source_matrix: ArrayView2<'_, f64>,
    fields: &[FlowField],
    flags: &StageFlags,
    n_blocks: usize,
) -> Result<Array2<f64>> {
    let p = ctx.unknowns_per_panel();
    let cog = ctx.reference.cog;

    let mut sigma = Array2::<f64>::zeros((ctx.mesh.n_panels(), fields.len()));
    for (j, field) in fields.iter().enumerate() {
        sigma
            .column_mut(j)
            .assign(&source_strengths(ctx.mesh, field, cog));
    }

    let mut rhs = Array2::<f64>::zeros((ctx.n_unknowns(), fields.len()));
    parallel_row_blocks(rhs.view_mut(), p, n_blocks, |first, mut rows| {
        for local in 0..rows.nrows() / p {
            if flags.poll()? {
                return Ok(());
            }
            let i = first + local;
            let target = &ctx.mesh.panels[i];
            let weights = ctx.row_weights(target);
            let normal_velocity =
                matches!(ctx.condition(target), super::Condition::NormalVelocity(_));

            for m in 0..p {
                let row = source_matrix.row(i * p + m);
                for (j, field) in fields.iter().enumerate() {
                    let mut value = row.dot(&sigma.column(j));
                    if normal_velocity {
                        value -= field.at(target.geom.centroid, cog).dot(&target.geom.normal)
                            * weights[m];
                    }
                    rows[[local * p + m, j]] = value;
                }
            }
        }
        Ok(())
    })?;
    flags.poll()?;
    Ok(rhs)
}

/// Right-hand sides of the six unit fields, in [`FlowField::unit`] order
pub fn unit_rhs(
    ctx: &AssemblyContext<'_>,
    source_matrix: ArrayView2<'_, f64>,
    flags: &StageFlags,
    n_blocks: usize,
) -> Result<Array2<f64>> {
    let fields: Vec<FlowField> = (0..6).map(FlowField::unit).collect();
    build_rhs(ctx, source_matrix, &fields, flags, n_blocks)
}

/// Superpose unit columns (right-hand sides or solutions) for `v_inf` and `omega`
pub fn combine_unit(unit: ArrayView2<'_, f64>, v_inf: Vector3, omega: Vector3) -> Array1<f64> {
    let coefficients = [v_inf.x, v_inf.y, v_inf.z, omega.x, omega.y, omega.z];
    let mut combined = Array1::<f64>::zeros(unit.nrows());
    for (column, &c) in unit.axis_iter(Axis(1)).zip(coefficients.iter()) {
        if c != 0.0 {
            combined.scaled_add(c, &column);
        }
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assembly::assemble_source_matrix;
    use crate::core::config::{AnalysisConfig, BoundaryCondition, Formulation, ReferenceGeometry};
    use crate::core::mesh::{FlatPlateSpec, PanelSpec, flat_plate};
    use crate::core::parallel::CancelToken;
    use crate::core::types::SurfacePosition;
    use approx::assert_relative_eq;

    fn tetrahedron() -> PanelMesh {
        let positions = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
        ];
        let panels = [[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]]
            .into_iter()
            .map(|nodes| PanelSpec::new(nodes, SurfacePosition::Side))
            .collect();
        PanelMesh::new(positions, panels, Vec::new()).unwrap()
    }

    #[test]
    fn test_wind_frame_is_orthonormal() {
        let (alpha, beta) = (0.1, -0.05);
        let d = wind_direction(alpha, beta);
        let n = wind_normal(alpha, beta);
        assert_relative_eq!(d.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(d.dot(&n), 0.0, epsilon = 1e-12);
        assert_relative_eq!(wind_side(alpha, 0.0).y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_wind_uses_cog_lever_arm() {
        let field = FlowField::unit(5);
        let v = field.at(Vector3::new(2.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
        // (1, 0, 0) x (0, 0, 1) = (0, -1, 0)
        assert_relative_eq!(v.y, -1.0);
        assert_relative_eq!(v.x, 0.0);
    }

    #[test]
    fn test_source_strengths_outward_flux() {
        let mesh = tetrahedron();
        let sigma = source_strengths(&mesh, &FlowField::unit(0), Vector3::zero());
        // Upstream face -x sees the wind entering
        assert!(sigma[2] > 0.0);
        assert!(sigma[3] < 0.0);
        assert_relative_eq!(sigma[0], 0.0);
        let total: f64 = mesh
            .panels
            .iter()
            .zip(sigma.iter())
            .map(|(p, s)| p.geom.area * s)
            .sum();
        assert_relative_eq!(total, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_thin_surface_rhs_is_minus_normal_wind() {
        let mesh = flat_plate(&FlatPlateSpec {
            nx: 2,
            ny: 2,
            wake_panels: 2,
            ..Default::default()
        })
        .unwrap();
        let config = AnalysisConfig::default().with_formulation(Formulation::Uniform);
        let ctx = AssemblyContext::new(&mesh, &config).unwrap();
        let flags = StageFlags::new(&CancelToken::new());
        let b = assemble_source_matrix(&ctx, &flags, 2).unwrap();
        let field = FlowField::translation(Vector3::new(10.0, 0.0, 0.5));
        let rhs = build_rhs(&ctx, b.view(), &[field], &flags, 3).unwrap();
        for value in rhs.column(0) {
            assert_relative_eq!(*value, -0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_combined_unit_rhs_matches_direct_build() {
        let mesh = tetrahedron();
        for bc in [BoundaryCondition::Neumann, BoundaryCondition::Dirichlet] {
            let config = AnalysisConfig::default()
                .with_boundary_condition(bc)
                .with_reference(ReferenceGeometry {
                    cog: Vector3::new(0.2, 0.1, -0.1),
                    ..Default::default()
                });
            let ctx = AssemblyContext::new(&mesh, &config).unwrap();
            let flags = StageFlags::new(&CancelToken::new());
            let b = assemble_source_matrix(&ctx, &flags, 2).unwrap();

            let unit = unit_rhs(&ctx, b.view(), &flags, 2).unwrap();
            let field = FlowField {
                v_inf: Vector3::new(9.5, -0.3, 1.2),
                omega: Vector3::new(0.1, 0.4, -0.2),
            };
            let direct = build_rhs(&ctx, b.view(), &[field], &flags, 1).unwrap();
            let combined = combine_unit(unit.view(), field.v_inf, field.omega);
            for (d, c) in direct.column(0).iter().zip(combined.iter()) {
                assert_relative_eq!(*d, *c, epsilon = 1e-10, max_relative = 1e-10);
            }
        }
    }
}
