//! Influence matrix assembly
//!
//! ## Module Organization
//!
//! - [`influence`] - Panel-to-panel doublet and source scalar products
//! - [`wake`] - Wake columns and their contribution to the system
//! - [`rhs`] - Flow fields, source strengths and right-hand sides
//!
//! Row `i·p + m` of the system belongs to basis function `m` of target panel
//! `i`, with `p = 3` unknowns per panel for the linear formulation and `p = 1`
//! for the uniform one. Each worker owns the rows of a contiguous block of
//! target panels.

pub mod influence;
pub mod rhs;
pub mod wake;

pub use influence::Condition;
pub use rhs::{
    FlowField, build_rhs, combine_unit, source_strengths, unit_rhs, wind_direction, wind_normal,
    wind_side,
};
pub use wake::{WakeChain, WakeColumn, resolve_wake_columns, scalar_product_wake, wake_velocity};

use ndarray::{Array2, ArrayViewMut2, s};
use solvers::{DenseMatrix, DenseVisitor, RealField};
use std::time::Instant;

use crate::core::config::{AnalysisConfig, BoundaryCondition, Formulation, ReferenceGeometry};
use crate::core::integration::{KernelParams, linear_basis, triangle_quadrature};
use crate::core::mesh::{Panel, PanelMesh, Triangle};
use crate::core::parallel::{StageFlags, parallel_row_blocks};
use crate::core::types::Vector3;
use crate::error::Result;

/// Mirror images of the body and wake below the image plane
#[derive(Debug, Clone)]
pub struct Images {
    /// +1 for ground, -1 for free surface
    pub coefficient: f64,
    /// Height of the body above the image plane
    pub height: f64,
    /// Image of each body panel
    pub panels: Vec<Triangle>,
    /// Image of each wake panel
    pub wake: Vec<Triangle>,
}

/// Evaluation point on a target panel with the weight of each row
#[derive(Debug, Clone, Copy)]
pub struct TestPoint {
    /// Physical point
    pub point: Vector3,
    /// Weight of the point for rows `0..p` of the target panel
    pub weights: [f64; 3],
}

/// Everything the assembly and post-processing loops read
#[derive(Debug, Clone)]
pub struct AssemblyContext<'a> {
    /// Mesh
    pub mesh: &'a PanelMesh,
    /// Doublet discretisation
    pub formulation: Formulation,
    /// Condition on thick panels
    pub boundary_condition: BoundaryCondition,
    /// Kernel parameters
    pub params: KernelParams,
    /// Reference geometry
    pub reference: ReferenceGeometry,
    /// Resolved wake columns, one per wake-shedding panel
    pub columns: Vec<WakeColumn>,
    /// Ground or free-surface images
    pub images: Option<Images>,
    quadrature: Vec<(f64, f64, f64)>,
}

impl<'a> AssemblyContext<'a> {
    /// Prepare the assembly of `mesh`
    ///
    /// Walks every wake column once; a column longer than the configured hop
    /// cap is an error.
    pub fn new(mesh: &'a PanelMesh, config: &AnalysisConfig) -> Result<Self> {
        let columns = resolve_wake_columns(mesh, config.max_wake_hops)?;
        let images = config.surface_effect.coefficient().map(|coefficient| Images {
            coefficient,
            height: config.ground_height,
            panels: mesh
                .panels
                .iter()
                .map(|p| p.geom.mirrored(config.ground_height))
                .collect(),
            wake: mesh
                .wake_panels
                .iter()
                .map(|w| w.geom.mirrored(config.ground_height))
                .collect(),
        });

        Ok(Self {
            mesh,
            formulation: config.formulation,
            boundary_condition: config.boundary_condition,
            params: config.kernel_params(),
            reference: config.reference,
            columns,
            images,
            quadrature: triangle_quadrature(config.quadrature),
        })
    }

    /// Unknowns per panel
    #[inline]
    pub fn unknowns_per_panel(&self) -> usize {
        self.formulation.unknowns_per_panel()
    }

    /// System dimension
    pub fn n_unknowns(&self) -> usize {
        self.mesh.n_panels() * self.unknowns_per_panel()
    }

    /// Condition enforced on a target panel
    pub fn condition(&self, target: &Panel) -> Condition {
        if self.boundary_condition == BoundaryCondition::Neumann || target.is_mid() {
            Condition::NormalVelocity(target.geom.normal)
        } else {
            Condition::Potential
        }
    }

    /// Points where the condition of `target` is tested
    ///
    /// Gauss points weighted by the basis functions for the linear formulation,
    /// the centroid for the uniform one.
    pub fn test_points(&self, target: &Panel) -> Vec<TestPoint> {
        match self.formulation {
            Formulation::Linear => {
                let two_area = 2.0 * target.geom.area;
                self.quadrature
                    .iter()
                    .map(|&(xi, eta, w)| {
                        let b = linear_basis(xi, eta);
                        TestPoint {
                            point: target.geom.point_at(xi, eta),
                            weights: b.map(|bm| w * two_area * bm),
                        }
                    })
                    .collect()
            }
            Formulation::Uniform => vec![TestPoint {
                point: target.geom.centroid,
                weights: [1.0, 0.0, 0.0],
            }],
        }
    }

    /// Integral of each row weight over the target panel
    pub fn row_weights(&self, target: &Panel) -> [f64; 3] {
        match self.formulation {
            Formulation::Linear => [target.geom.area / 3.0; 3],
            Formulation::Uniform => [1.0, 0.0, 0.0],
        }
    }

    /// Image of body panel `k` with its coefficient
    #[inline]
    pub fn panel_image(&self, k: usize) -> Option<(&Triangle, f64)> {
        self.images
            .as_ref()
            .map(|images| (&images.panels[k], images.coefficient))
    }

    /// Image of wake panel `w` with its coefficient
    #[inline]
    pub fn wake_image(&self, w: usize) -> Option<(&Triangle, f64)> {
        self.images
            .as_ref()
            .map(|images| (&images.wake[w], images.coefficient))
    }
}

/// Fills the doublet influence matrix, wake included
struct MatrixFill<'c, 'm> {
    ctx: &'c AssemblyContext<'m>,
    flags: &'c StageFlags,
    n_blocks: usize,
}

impl DenseVisitor for MatrixFill<'_, '_> {
    type Output = Result<()>;

    fn visit<T: RealField>(self, matrix: ArrayViewMut2<'_, T>) -> Result<()> {
        let ctx = self.ctx;
        let flags = self.flags;
        let p = ctx.unknowns_per_panel();
        let n = ctx.n_unknowns();

        parallel_row_blocks(matrix, p, self.n_blocks, |first, mut rows| {
            let mut buffer = Array2::<f64>::zeros((p, n));
            for local in 0..rows.nrows() / p {
                if flags.poll()? {
                    return Ok(());
                }
                let target = first + local;
                buffer.fill(0.0);
                influence::doublet_rows(ctx, target, buffer.view_mut(), flags)?;
                wake::wake_rows(ctx, target, buffer.view_mut(), flags)?;
                rows.slice_mut(s![local * p..(local + 1) * p, ..])
                    .zip_mut_with(&buffer, |a, &b| *a = T::from_f64_lossy(b));
            }
            Ok(())
        })
    }
}

/// Assemble the doublet influence matrix into `matrix`
///
/// The matrix must be `n_unknowns` square. On error the content of `matrix`
/// is partially written and must be discarded.
pub fn assemble_matrix(
    ctx: &AssemblyContext<'_>,
    matrix: &mut DenseMatrix,
    flags: &StageFlags,
    n_blocks: usize,
) -> Result<()> {
    let start = Instant::now();
    matrix.with_storage_mut(MatrixFill {
        ctx,
        flags,
        n_blocks,
    })?;
    // A block that returned early on cancellation leaves the flag set
    flags.poll()?;
    log::debug!(
        "Influence matrix {}x{} assembled in {:.2?}",
        matrix.dim(),
        matrix.dim(),
        start.elapsed()
    );
    Ok(())
}

/// Assemble the source influence matrix (`n_unknowns x n_panels`)
///
/// Entries are negated so that `B·σ` is the source part of the right-hand side.
pub fn assemble_source_matrix(
    ctx: &AssemblyContext<'_>,
    flags: &StageFlags,
    n_blocks: usize,
) -> Result<Array2<f64>> {
    let start = Instant::now();
    let p = ctx.unknowns_per_panel();
    let mut sources = Array2::<f64>::zeros((ctx.n_unknowns(), ctx.mesh.n_panels()));
    parallel_row_blocks(sources.view_mut(), p, n_blocks, |first, mut rows| {
        for local in 0..rows.nrows() / p {
            if flags.poll()? {
                return Ok(());
            }
            let target = first + local;
            influence::source_rows(
                ctx,
                target,
                rows.slice_mut(s![local * p..(local + 1) * p, ..]),
                flags,
            )?;
        }
        Ok(())
    })?;
    flags.poll()?;
    log::debug!("Source influence matrix assembled in {:.2?}", start.elapsed());
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SurfaceEffect;
    use crate::core::mesh::{FlatPlateSpec, flat_plate};
    use crate::core::parallel::CancelToken;
    use crate::error::PanelError;
    use solvers::Precision;

    fn plate() -> PanelMesh {
        flat_plate(&FlatPlateSpec {
            nx: 2,
            ny: 2,
            wake_panels: 4,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_test_point_weights_integrate_basis() {
        let mesh = plate();
        let ctx = AssemblyContext::new(&mesh, &AnalysisConfig::default()).unwrap();
        let target = &mesh.panels[0];
        let points = ctx.test_points(target);
        assert_eq!(points.len(), 7);
        let expected = ctx.row_weights(target);
        for m in 0..3 {
            let sum: f64 = points.iter().map(|tp| tp.weights[m]).sum();
            assert!((sum - expected[m]).abs() < 1e-10);
        }
    }

    #[test]
    fn test_single_and_double_matrices_agree() {
        let mesh = plate();
        let config = AnalysisConfig::default();
        let ctx = AssemblyContext::new(&mesh, &config).unwrap();
        let flags = StageFlags::new(&CancelToken::new());

        let mut double = DenseMatrix::zeros(ctx.n_unknowns(), Precision::Double);
        let mut single = DenseMatrix::zeros(ctx.n_unknowns(), Precision::Single);
        assemble_matrix(&ctx, &mut double, &flags, 3).unwrap();
        assemble_matrix(&ctx, &mut single, &flags, 2).unwrap();

        let n = ctx.n_unknowns();
        for i in 0..n {
            for j in 0..n {
                let d = double.get(i, j);
                assert!((d - single.get(i, j)).abs() <= 1e-5 * d.abs().max(1.0));
            }
        }
    }

    #[test]
    fn test_block_count_does_not_change_matrix() {
        let mesh = plate();
        let config = AnalysisConfig::default().with_formulation(Formulation::Uniform);
        let ctx = AssemblyContext::new(&mesh, &config).unwrap();
        let flags = StageFlags::new(&CancelToken::new());

        let mut a = DenseMatrix::zeros(ctx.n_unknowns(), Precision::Double);
        let mut b = DenseMatrix::zeros(ctx.n_unknowns(), Precision::Double);
        assemble_matrix(&ctx, &mut a, &flags, 1).unwrap();
        assemble_matrix(&ctx, &mut b, &flags, 5).unwrap();
        assert_eq!(a.to_f64(), b.to_f64());
    }

    #[test]
    fn test_ground_images_change_matrix() {
        let mesh = plate();
        let free = AnalysisConfig::default().with_formulation(Formulation::Uniform);
        let ground = free.clone().with_surface_effect(SurfaceEffect::Ground, 0.5);
        let flags = StageFlags::new(&CancelToken::new());

        let mut a = DenseMatrix::zeros(mesh.n_panels(), Precision::Double);
        let mut b = DenseMatrix::zeros(mesh.n_panels(), Precision::Double);
        assemble_matrix(&AssemblyContext::new(&mesh, &free).unwrap(), &mut a, &flags, 2).unwrap();
        assemble_matrix(&AssemblyContext::new(&mesh, &ground).unwrap(), &mut b, &flags, 2)
            .unwrap();
        // The image of a flat plate above the ground weakens its self influence
        assert!(b.get(0, 0).abs() < a.get(0, 0).abs());
    }

    #[test]
    fn test_cancelled_assembly() {
        let mesh = plate();
        let ctx = AssemblyContext::new(&mesh, &AnalysisConfig::default()).unwrap();
        let token = CancelToken::new();
        token.cancel();
        let flags = StageFlags::new(&token);
        let mut m = DenseMatrix::zeros(ctx.n_unknowns(), Precision::Double);
        let result = assemble_matrix(&ctx, &mut m, &flags, 2);
        assert!(matches!(result, Err(PanelError::Cancelled)));
    }

    #[test]
    fn test_source_matrix_is_zero_for_thin_surfaces() {
        let mesh = plate();
        let ctx = AssemblyContext::new(&mesh, &AnalysisConfig::default()).unwrap();
        let flags = StageFlags::new(&CancelToken::new());
        let b = assemble_source_matrix(&ctx, &flags, 2).unwrap();
        assert_eq!(b.dim(), (ctx.n_unknowns(), mesh.n_panels()));
        assert!(b.iter().all(|&v| v == 0.0));
    }
}
