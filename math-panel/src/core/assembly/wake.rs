//! Wake columns
//!
//! Each wake-shedding panel carries a column of wake panels linked through
//! their `next` index. The doublet strength of a column is fixed by the
//! trailing edge strengths of its shedding panel (implicit Kutta condition),
//! so the wake adds to the system columns of the shedding panel instead of
//! bringing unknowns of its own:
//! - mid panels: left and right strengths are the trailing vertex unknowns
//! - bottom panels: strengths are the jump between the paired top panel and
//!   the bottom panel, so the contribution is added on the top panel's columns
//!   and subtracted from the bottom panel's

use ndarray::{ArrayView1, ArrayViewMut2};

use super::influence::{Condition, blow_up};
use super::AssemblyContext;
use crate::core::config::Formulation;
use crate::core::mesh::{PanelMesh, WakePanel};
use crate::core::parallel::StageFlags;
use crate::core::types::Vector3;
use crate::error::{PanelError, Result};

/// Walk of a wake column, bounded by a hop cap
///
/// Yields `Err(WakeChainTooLong)` once `max_hops` panels have been visited
/// without reaching the end of the column, then stops.
#[derive(Debug, Clone)]
pub struct WakeChain<'a> {
    wake: &'a [WakePanel],
    start: usize,
    next: Option<usize>,
    hops: usize,
    max_hops: usize,
}

impl<'a> WakeChain<'a> {
    /// Chain starting at wake panel `start`
    pub fn new(wake: &'a [WakePanel], start: usize, max_hops: usize) -> Self {
        Self {
            wake,
            start,
            next: Some(start),
            hops: 0,
            max_hops,
        }
    }
}

impl<'a> Iterator for WakeChain<'a> {
    type Item = Result<&'a WakePanel>;

    fn next(&mut self) -> Option<Self::Item> {
        let w = self.next?;
        if self.hops >= self.max_hops {
            self.next = None;
            return Some(Err(PanelError::WakeChainTooLong {
                start: self.start,
                max_hops: self.max_hops,
            }));
        }
        let panel = self.wake.get(w)?;
        self.hops += 1;
        self.next = panel.next;
        Some(Ok(panel))
    }
}

/// Resolved wake column of one shedding panel
#[derive(Debug, Clone, PartialEq)]
pub struct WakeColumn {
    /// Shedding panel
    pub panel: usize,
    /// Paired top panel of a bottom shedding panel
    pub opposite: Option<usize>,
    /// Wake panels from the trailing edge downstream
    pub wake_panels: Vec<usize>,
    /// Local vertices of the left and right trailing nodes of the shedding panel
    pub trailing: [usize; 2],
    /// Local vertices of the left and right trailing nodes of the paired top panel
    pub opposite_trailing: [usize; 2],
}

impl WakeColumn {
    /// Mid-point of the downstream edge of the last wake panel
    pub fn far_point(&self, mesh: &PanelMesh) -> Vector3 {
        match self.wake_panels.last() {
            Some(&w) => {
                let last = &mesh.wake_panels[w];
                (last.downstream_left() + last.downstream_right()) * 0.5
            }
            None => mesh.panels[self.panel].geom.centroid,
        }
    }

    /// Unit direction of the downstream edges of the last left and right wake panels
    pub fn far_directions(&self, mesh: &PanelMesh) -> Option<(Vector3, Vector3)> {
        let n = self.wake_panels.len();
        if n < 2 {
            return None;
        }
        let left = &mesh.wake_panels[self.wake_panels[n - 2]];
        let right = &mesh.wake_panels[self.wake_panels[n - 1]];
        // Left panel: S2 -> S0, right panel: S1 -> S0
        let d_left = (left.geom.vertices[0] - left.geom.vertices[2]).normalized()?;
        let d_right = (right.geom.vertices[0] - right.geom.vertices[1]).normalized()?;
        Some((d_left, d_right))
    }

    /// Linear unknowns at the left and right trailing nodes of the shedding
    /// panel and of its paired top panel
    pub fn linear_unknowns(&self) -> ([usize; 2], Option<[usize; 2]>) {
        let k = self.panel;
        let own = [3 * k + self.trailing[0], 3 * k + self.trailing[1]];
        let top = self.opposite.map(|kt| {
            [
                3 * kt + self.opposite_trailing[0],
                3 * kt + self.opposite_trailing[1],
            ]
        });
        (own, top)
    }

    /// Left and right doublet strengths of the column
    pub fn strengths(&self, mu: ArrayView1<'_, f64>, formulation: Formulation) -> (f64, f64) {
        let k = self.panel;
        match (formulation, self.linear_unknowns()) {
            (Formulation::Linear, ([l, r], None)) => (mu[l], mu[r]),
            (Formulation::Linear, ([l, r], Some([tl, tr]))) => (mu[tl] - mu[l], mu[tr] - mu[r]),
            (Formulation::Uniform, _) => match self.opposite {
                None => (mu[k], mu[k]),
                Some(kt) => (mu[kt] - mu[k], mu[kt] - mu[k]),
            },
        }
    }
}

/// Walk the wake column of every shedding panel
pub fn resolve_wake_columns(mesh: &PanelMesh, max_hops: usize) -> Result<Vec<WakeColumn>> {
    let mut columns = Vec::new();
    for panel in mesh.wake_shedding_panels() {
        let start = panel.wake.ok_or_else(|| {
            PanelError::InvalidMesh(format!("trailing panel {} has no wake", panel.index))
        })?;
        let wake_panels = WakeChain::new(&mesh.wake_panels, start, max_hops)
            .map(|w| w.map(|w| w.index))
            .collect::<Result<Vec<_>>>()?;
        let (left, right) = panel.trailing_vertices();
        let opposite_trailing = match panel.opposite {
            Some(kt) => {
                let (left, right) = mesh.panels[kt].trailing_vertices();
                [left, right]
            }
            None => [1, 2],
        };
        columns.push(WakeColumn {
            panel: panel.index,
            opposite: panel.opposite,
            wake_panels,
            trailing: [left, right],
            opposite_trailing,
        });
    }
    log::debug!(
        "{} wake columns, {} wake panels in use",
        columns.len(),
        columns.iter().map(|c| c.wake_panels.len()).sum::<usize>()
    );
    Ok(columns)
}

/// Field at `point` of a column with unit left and right strengths
fn column_scalars(
    ctx: &AssemblyContext<'_>,
    column: &WakeColumn,
    point: Vector3,
    condition: Condition,
) -> (f64, f64) {
    let mut left = 0.0;
    let mut right = 0.0;
    for &w in &column.wake_panels {
        let wake = &ctx.mesh.wake_panels[w];
        let image = ctx.wake_image(w);
        match ctx.formulation {
            Formulation::Linear => {
                let values = ctx.linear_values(&wake.geom, image, point, condition);
                for (value, is_left) in values.iter().zip(wake.side.left_vertices()) {
                    if is_left {
                        left += value;
                    } else {
                        right += value;
                    }
                }
            }
            Formulation::Uniform => {
                left += ctx.uniform_value(&wake.geom, image, point, condition);
            }
        }
    }
    (left, right)
}

/// Scalar products of a wake column with the rows of target panel `i`
///
/// Returns the row-wise products for the left and right strengths. The uniform
/// formulation has a single strength per column, returned as the left one.
pub fn scalar_product_wake(
    ctx: &AssemblyContext<'_>,
    i: usize,
    column: &WakeColumn,
) -> Result<([f64; 3], [f64; 3])> {
    let target = &ctx.mesh.panels[i];
    let condition = ctx.condition(target);
    let mut left = [0.0; 3];
    let mut right = [0.0; 3];
    for tp in ctx.test_points(target) {
        let (l, r) = column_scalars(ctx, column, tp.point, condition);
        for m in 0..3 {
            left[m] += tp.weights[m] * l;
            right[m] += tp.weights[m] * r;
        }
    }
    if left.iter().chain(right.iter()).all(|v| v.is_finite()) {
        Ok((left, right))
    } else {
        Err(PanelError::NumericalBlowUp {
            target_panel: i,
            source_panel: column.panel,
        })
    }
}

/// Add the wake contributions to the rows of target panel `i`
pub(crate) fn wake_rows(
    ctx: &AssemblyContext<'_>,
    i: usize,
    mut rows: ArrayViewMut2<'_, f64>,
    flags: &StageFlags,
) -> Result<()> {
    let p = ctx.unknowns_per_panel();
    for column in &ctx.columns {
        let (left, right) = match scalar_product_wake(ctx, i, column) {
            Ok(products) => products,
            Err(_) => return Err(blow_up(flags, i, column.panel)),
        };
        let k = column.panel;
        let ([l, r], top) = column.linear_unknowns();
        for m in 0..p {
            match ctx.formulation {
                Formulation::Linear => match top {
                    None => {
                        rows[[m, l]] += left[m];
                        rows[[m, r]] += right[m];
                    }
                    Some([tl, tr]) => {
                        rows[[m, l]] -= left[m];
                        rows[[m, r]] -= right[m];
                        rows[[m, tl]] += left[m];
                        rows[[m, tr]] += right[m];
                    }
                },
                Formulation::Uniform => match column.opposite {
                    None => rows[[m, k]] += left[m],
                    Some(kt) => {
                        rows[[m, k]] -= left[m];
                        rows[[m, kt]] += left[m];
                    }
                },
            }
        }
    }
    Ok(())
}

/// Velocity induced at `point` by all wake columns for the strengths `mu`
pub fn wake_velocity(
    ctx: &AssemblyContext<'_>,
    mu: ArrayView1<'_, f64>,
    point: Vector3,
) -> Vector3 {
    let mut velocity = Vector3::zero();
    for column in &ctx.columns {
        let (g_left, g_right) = column.strengths(mu, ctx.formulation);
        for &w in &column.wake_panels {
            let wake = &ctx.mesh.wake_panels[w];
            let image = ctx.wake_image(w);
            match ctx.formulation {
                Formulation::Linear => {
                    let velocities = ctx.linear_velocities(&wake.geom, image, point);
                    for (v, is_left) in velocities.iter().zip(wake.side.left_vertices()) {
                        velocity += *v * if is_left { g_left } else { g_right };
                    }
                }
                Formulation::Uniform => {
                    velocity += ctx.uniform_velocity(&wake.geom, image, point) * g_left;
                }
            }
        }
    }
    velocity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AnalysisConfig;
    use crate::core::mesh::{FlatPlateSpec, PanelSpec, WakePanelSpec, flat_plate};
    use crate::core::types::{SurfacePosition, WakeSide};
    use approx::assert_relative_eq;
    use ndarray::Array2;

    fn plate() -> PanelMesh {
        flat_plate(&FlatPlateSpec {
            nx: 2,
            ny: 2,
            wake_panels: 3,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_columns_follow_the_chain() {
        let mesh = plate();
        let columns = resolve_wake_columns(&mesh, 100).unwrap();
        assert_eq!(columns.len(), 2);
        for column in &columns {
            assert_eq!(column.wake_panels.len(), 6);
            assert!(column.opposite.is_none());
            let far = column.far_point(&mesh);
            assert_relative_eq!(far.x, 31.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_hop_cap_is_an_error() {
        let mesh = plate();
        let result = resolve_wake_columns(&mesh, 5);
        assert!(matches!(
            result,
            Err(PanelError::WakeChainTooLong { max_hops: 5, .. })
        ));
    }

    #[test]
    fn test_cyclic_chain_is_reported() {
        let positions = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
        ];
        let panels = vec![PanelSpec::new([0, 1, 2], SurfacePosition::Mid).with_wake(0)];
        let wake = vec![
            WakePanelSpec {
                vertices: [
                    Vector3::new(2.0, 0.0, 0.0),
                    Vector3::new(1.0, 1.0, 0.0),
                    Vector3::new(1.0, 0.0, 0.0),
                ],
                side: WakeSide::Left,
                next: Some(1),
            },
            WakePanelSpec {
                vertices: [
                    Vector3::new(2.0, 1.0, 0.0),
                    Vector3::new(1.0, 1.0, 0.0),
                    Vector3::new(2.0, 0.0, 0.0),
                ],
                side: WakeSide::Right,
                next: Some(0),
            },
        ];
        let mesh = PanelMesh::new(positions, panels, wake).unwrap();
        let mut chain = WakeChain::new(&mesh.wake_panels, 0, 10);
        for _ in 0..10 {
            assert!(chain.next().unwrap().is_ok());
        }
        assert!(matches!(
            chain.next(),
            Some(Err(PanelError::WakeChainTooLong { start: 0, max_hops: 10 }))
        ));
        assert!(chain.next().is_none());
    }

    #[test]
    fn test_uniform_column_is_sum_of_linear_sides() {
        let mesh = plate();
        let linear = AnalysisConfig::default();
        let uniform = linear.clone().with_formulation(Formulation::Uniform);
        let ctx_l = AssemblyContext::new(&mesh, &linear).unwrap();
        let ctx_u = AssemblyContext::new(&mesh, &uniform).unwrap();
        let point = Vector3::new(0.4, 0.1, 0.3);
        let condition = Condition::NormalVelocity(Vector3::unit_z());

        let (l, r) = column_scalars(&ctx_l, &ctx_l.columns[0], point, condition);
        let (u, zero) = column_scalars(&ctx_u, &ctx_u.columns[0], point, condition);
        assert_relative_eq!(l + r, u, max_relative = 1e-9);
        assert_eq!(zero, 0.0);
    }

    #[test]
    fn test_wake_rows_only_touch_trailing_columns() {
        let mesh = plate();
        let ctx = AssemblyContext::new(&mesh, &AnalysisConfig::default()).unwrap();
        let flags = StageFlags::new(&Default::default());
        let mut rows = Array2::<f64>::zeros((3, ctx.n_unknowns()));
        wake_rows(&ctx, 0, rows.view_mut(), &flags).unwrap();

        let shedding: Vec<usize> = ctx.columns.iter().map(|c| c.panel).collect();
        for k in 0..mesh.n_panels() {
            for n in 0..3 {
                let touched = rows.column(3 * k + n).iter().any(|&v| v != 0.0);
                assert_eq!(touched, shedding.contains(&k) && n > 0, "column {}", 3 * k + n);
            }
        }
    }

    #[test]
    fn test_column_strengths() {
        let column = WakeColumn {
            panel: 1,
            opposite: None,
            wake_panels: vec![],
            trailing: [1, 2],
            opposite_trailing: [1, 2],
        };
        let mu = ndarray::array![0.0, 0.0, 0.0, 1.0, 2.0, 3.0];
        assert_eq!(column.strengths(mu.view(), Formulation::Linear), (2.0, 3.0));
        assert_eq!(column.strengths(mu.view(), Formulation::Uniform), (0.0, 0.0));

        // Bottom panel 0 carries its trailing edge reversed
        let mu = ndarray::array![0.0, 0.5, 0.25, 1.0, 2.0, 3.0];
        let bottom = WakeColumn {
            panel: 0,
            opposite: Some(1),
            wake_panels: vec![],
            trailing: [2, 1],
            opposite_trailing: [1, 2],
        };
        assert_eq!(bottom.linear_unknowns(), ([2, 1], Some([4, 5])));
        assert_eq!(bottom.strengths(mu.view(), Formulation::Linear), (1.75, 2.5));
        assert_eq!(bottom.strengths(mu.view(), Formulation::Uniform), (0.5, 0.5));
    }
}
