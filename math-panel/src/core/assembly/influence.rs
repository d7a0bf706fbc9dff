//! Panel-to-panel scalar products
//!
//! The influence of a source panel on a target panel is the field of its
//! singularity (normal velocity or potential, depending on the target's
//! condition) tested at the target's test points. Mirror panels add their
//! field with the image coefficient, their basis columns mapped back onto the
//! vertices of the original panel.

use ndarray::ArrayViewMut2;

use super::AssemblyContext;
use crate::core::integration::{
    PlaneSide, linear_doublet_potentials, linear_doublet_velocities, source_field,
    uniform_doublet_potential, uniform_doublet_velocity,
};
use crate::core::mesh::{MIRROR_VERTEX_MAP, Triangle};
use crate::core::parallel::StageFlags;
use crate::core::types::Vector3;
use crate::error::{PanelError, Result};

/// Quantity matched at a test point
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Condition {
    /// Velocity component along the target normal
    NormalVelocity(Vector3),
    /// Perturbation potential, interior limit on the panel itself
    Potential,
}

impl<'a> AssemblyContext<'a> {
    fn raw_linear_values(&self, tri: &Triangle, point: Vector3, condition: Condition) -> [f64; 3] {
        match condition {
            Condition::NormalVelocity(normal) => {
                linear_doublet_velocities(tri, point, &self.params).map(|v| v.dot(&normal))
            }
            Condition::Potential => {
                linear_doublet_potentials(tri, point, &self.params, PlaneSide::Interior)
            }
        }
    }

    fn raw_uniform_value(&self, tri: &Triangle, point: Vector3, condition: Condition) -> f64 {
        match condition {
            Condition::NormalVelocity(normal) => {
                uniform_doublet_velocity(tri, point, &self.params).dot(&normal)
            }
            Condition::Potential => {
                uniform_doublet_potential(tri, point, &self.params, PlaneSide::Interior)
            }
        }
    }

    fn raw_source_value(&self, tri: &Triangle, point: Vector3, condition: Condition) -> f64 {
        match condition {
            Condition::NormalVelocity(normal) => {
                source_field(tri, point, &self.params, PlaneSide::Exterior)
                    .velocity
                    .dot(&normal)
            }
            Condition::Potential => {
                source_field(tri, point, &self.params, PlaneSide::Interior).potential
            }
        }
    }

    /// Field of the three linear doublet basis distributions of `tri`
    pub fn linear_values(
        &self,
        tri: &Triangle,
        image: Option<(&Triangle, f64)>,
        point: Vector3,
        condition: Condition,
    ) -> [f64; 3] {
        let mut values = self.raw_linear_values(tri, point, condition);
        if let Some((mirror, coefficient)) = image {
            let mirrored = self.raw_linear_values(mirror, point, condition);
            for (n, &original) in MIRROR_VERTEX_MAP.iter().enumerate() {
                values[original] += coefficient * mirrored[n];
            }
        }
        values
    }

    /// Field of a uniform unit doublet on `tri`
    pub fn uniform_value(
        &self,
        tri: &Triangle,
        image: Option<(&Triangle, f64)>,
        point: Vector3,
        condition: Condition,
    ) -> f64 {
        let mut value = self.raw_uniform_value(tri, point, condition);
        if let Some((mirror, coefficient)) = image {
            value += coefficient * self.raw_uniform_value(mirror, point, condition);
        }
        value
    }

    /// Field of a unit source on `tri`
    pub fn source_value(
        &self,
        tri: &Triangle,
        image: Option<(&Triangle, f64)>,
        point: Vector3,
        condition: Condition,
    ) -> f64 {
        let mut value = self.raw_source_value(tri, point, condition);
        if let Some((mirror, coefficient)) = image {
            value += coefficient * self.raw_source_value(mirror, point, condition);
        }
        value
    }

    /// Velocities of the three linear doublet basis distributions, images included
    pub fn linear_velocities(
        &self,
        tri: &Triangle,
        image: Option<(&Triangle, f64)>,
        point: Vector3,
    ) -> [Vector3; 3] {
        let mut velocities = linear_doublet_velocities(tri, point, &self.params);
        if let Some((mirror, coefficient)) = image {
            let mirrored = linear_doublet_velocities(mirror, point, &self.params);
            for (n, &original) in MIRROR_VERTEX_MAP.iter().enumerate() {
                velocities[original] += mirrored[n] * coefficient;
            }
        }
        velocities
    }

    /// Velocity of a uniform unit doublet, images included
    pub fn uniform_velocity(
        &self,
        tri: &Triangle,
        image: Option<(&Triangle, f64)>,
        point: Vector3,
    ) -> Vector3 {
        let mut velocity = uniform_doublet_velocity(tri, point, &self.params);
        if let Some((mirror, coefficient)) = image {
            velocity += uniform_doublet_velocity(mirror, point, &self.params) * coefficient;
        }
        velocity
    }

    /// Velocity of a unit source, images included
    pub fn source_velocity(
        &self,
        tri: &Triangle,
        image: Option<(&Triangle, f64)>,
        point: Vector3,
    ) -> Vector3 {
        let mut velocity = source_field(tri, point, &self.params, PlaneSide::Exterior).velocity;
        if let Some((mirror, coefficient)) = image {
            velocity += source_field(mirror, point, &self.params, PlaneSide::Exterior).velocity
                * coefficient;
        }
        velocity
    }

    /// Doublet scalar products of source panel `k` on target panel `i`
    ///
    /// Entry `[m][n]` couples row `m` of the target with unknown `n` of the
    /// source; only the first `p x p` entries are meaningful.
    pub fn doublet_products(&self, i: usize, k: usize) -> [[f64; 3]; 3] {
        let target = &self.mesh.panels[i];
        let condition = self.condition(target);
        self.doublet_products_at(&self.test_points(target), condition, k)
    }

    fn doublet_products_at(
        &self,
        points: &[super::TestPoint],
        condition: Condition,
        k: usize,
    ) -> [[f64; 3]; 3] {
        let source = &self.mesh.panels[k].geom;
        let image = self.panel_image(k);
        let p = self.unknowns_per_panel();
        let mut products = [[0.0; 3]; 3];
        for tp in points {
            let values = match p {
                3 => self.linear_values(source, image, tp.point, condition),
                _ => [self.uniform_value(source, image, tp.point, condition), 0.0, 0.0],
            };
            for m in 0..p {
                for n in 0..p {
                    products[m][n] += tp.weights[m] * values[n];
                }
            }
        }
        products
    }

    /// Source scalar products of panel `k` on the rows of target panel `i`
    pub fn source_products(&self, i: usize, k: usize) -> [f64; 3] {
        let target = &self.mesh.panels[i];
        let condition = self.condition(target);
        let source = &self.mesh.panels[k].geom;
        let image = self.panel_image(k);
        let mut products = [0.0; 3];
        for tp in self.test_points(target) {
            let value = self.source_value(source, image, tp.point, condition);
            for (m, product) in products.iter_mut().enumerate() {
                *product += tp.weights[m] * value;
            }
        }
        products
    }
}

pub(crate) fn blow_up(flags: &StageFlags, target_panel: usize, source_panel: usize) -> PanelError {
    flags.raise_error();
    log::error!(
        "Numerical error in the influence of panel {} on panel {}, aborting assembly",
        source_panel,
        target_panel
    );
    PanelError::NumericalBlowUp {
        target_panel,
        source_panel,
    }
}

/// Body doublet rows of target panel `i` into `rows` (`p x n_unknowns`)
pub(crate) fn doublet_rows(
    ctx: &AssemblyContext<'_>,
    i: usize,
    mut rows: ArrayViewMut2<'_, f64>,
    flags: &StageFlags,
) -> Result<()> {
    let p = ctx.unknowns_per_panel();
    let target = &ctx.mesh.panels[i];
    let condition = ctx.condition(target);
    let points = ctx.test_points(target);

    for k in 0..ctx.mesh.n_panels() {
        let products = ctx.doublet_products_at(&points, condition, k);
        for m in 0..p {
            for n in 0..p {
                let value = products[m][n];
                if !value.is_finite() {
                    return Err(blow_up(flags, i, k));
                }
                rows[[m, p * k + n]] += value;
            }
        }
    }
    Ok(())
}

/// Negated source rows of target panel `i` into `rows` (`p x n_panels`)
pub(crate) fn source_rows(
    ctx: &AssemblyContext<'_>,
    i: usize,
    mut rows: ArrayViewMut2<'_, f64>,
    flags: &StageFlags,
) -> Result<()> {
    let p = ctx.unknowns_per_panel();
    let target = &ctx.mesh.panels[i];
    let condition = ctx.condition(target);
    let points = ctx.test_points(target);

    for (k, source) in ctx.mesh.panels.iter().enumerate() {
        // No sources on thin surfaces
        if source.is_mid() {
            continue;
        }
        let image = ctx.panel_image(k);
        let mut products = [0.0; 3];
        for tp in &points {
            let value = ctx.source_value(&source.geom, image, tp.point, condition);
            for (m, product) in products.iter_mut().enumerate().take(p) {
                *product += tp.weights[m] * value;
            }
        }
        for m in 0..p {
            if !products[m].is_finite() {
                return Err(blow_up(flags, i, k));
            }
            rows[[m, k]] = -products[m];
        }
    }
    Ok(())
}
