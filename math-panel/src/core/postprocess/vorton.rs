//! Vorton wake and induced drag
//!
//! The trailing vortex sheet behind the last wake panels is discretised into
//! rows of regularised point vortices. Every strip contributes one vorton on
//! each of its lateral edges, with opposite vortex vectors, so adjacent strips
//! leave the difference of their circulations on the shared edge. The rows are
//! convected along the wind; the induced drag is read at the middle row.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::core::assembly::AssemblyContext;
use crate::core::config::VortonConfig;
use crate::core::integration::FOUR_PI;
use crate::core::parallel::parallel_map_indexed;
use crate::core::types::Vector3;
use crate::error::{PanelError, Result};

/// Regularised point vortex
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vorton {
    /// Position
    pub position: Vector3,
    /// Vortex vector, circulation times length
    pub vortex: Vector3,
}

impl Vorton {
    /// Induced velocity with core size `sigma`
    ///
    /// `V = (ω × r) / 4π · (r² + 5σ²/2) / (r² + σ²)^(5/2)`; finite at the
    /// vorton itself and equal to Biot-Savart far from the core.
    pub fn velocity_at(&self, point: Vector3, sigma: f64) -> Vector3 {
        let r = point - self.position;
        let r2 = r.norm_squared();
        let s2 = sigma * sigma;
        let factor = (r2 + 2.5 * s2) / (r2 + s2).powf(2.5);
        self.vortex.cross(&r) * (factor / FOUR_PI)
    }

    /// Image through the plane `z = -height`
    pub fn mirrored(&self, height: f64, coefficient: f64) -> Vorton {
        Vorton {
            position: self.position.mirrored_z(height),
            vortex: Vector3::new(-self.vortex.x, -self.vortex.y, self.vortex.z) * coefficient,
        }
    }
}

/// Segment closing a strip at the upstream end of a row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NegatingVortex {
    /// Left end
    pub start: Vector3,
    /// Right end
    pub end: Vector3,
    /// Circulation
    pub gamma: f64,
}

/// Induced drag of a vorton wake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VortonDrag {
    /// Force of each strip divided by the dynamic pressure (m²)
    pub strip_forces: Vec<Vector3>,
    /// Induced angle of each strip (radians)
    pub induced_angles: Vec<f64>,
    /// Total force divided by the dynamic pressure (m²)
    pub total: Vector3,
    /// Drag component of the total along the wind (m²)
    pub drag_area: f64,
}

/// Rows of vortons shed by the trailing strips
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VortonWake {
    /// Vortons of each row, the first row at the end of the panel wake
    pub rows: Vec<Vec<Vorton>>,
    /// Negating vortex of each strip in the first row
    pub negating: Vec<NegatingVortex>,
    /// Rows within the discard distance
    pub active_rows: usize,
    /// Streamwise spacing (m)
    pub spacing: f64,
    /// Core size (m)
    pub core: f64,
    /// Convection direction
    pub wind: Vector3,
    /// Image plane height and coefficient
    pub image: Option<(f64, f64)>,
}

impl VortonWake {
    /// Build the vorton rows for doublet strengths `mu`
    ///
    /// Every wake column needs at least one left and one right wake panel.
    pub fn build(
        ctx: &AssemblyContext<'_>,
        mu: ArrayView1<'_, f64>,
        wind: Vector3,
        config: &VortonConfig,
    ) -> Result<Self> {
        if ctx.columns.is_empty() {
            return Err(PanelError::InvalidMesh(
                "vorton wake needs at least one wake column".to_string(),
            ));
        }
        let wind = wind
            .normalized()
            .ok_or_else(|| PanelError::InvalidConfig("wind direction is zero".to_string()))?;
        let chord = ctx.reference.chord;
        let spacing = config.l0 * chord;
        let core = config.core_size * chord;

        let mut first_row = Vec::with_capacity(2 * ctx.columns.len());
        let mut negating = Vec::with_capacity(ctx.columns.len());
        for column in &ctx.columns {
            let (d_left, d_right) = column.far_directions(ctx.mesh).ok_or_else(|| {
                PanelError::InvalidMesh(format!(
                    "wake column of panel {} is too short for vortons",
                    column.panel
                ))
            })?;
            let (mu_left, mu_right) = column.strengths(mu, ctx.formulation);
            let gamma = 0.5 * FOUR_PI * (mu_left + mu_right);

            let last = column
                .wake_panels
                .last()
                .map(|&w| &ctx.mesh.wake_panels[w])
                .ok_or_else(|| PanelError::InvalidMesh("empty wake column".to_string()))?;
            let left = last.downstream_left();
            let right = last.downstream_right();

            first_row.push(Vorton {
                position: left + d_left * (0.5 * spacing),
                vortex: d_left * (gamma * spacing),
            });
            first_row.push(Vorton {
                position: right + d_right * (0.5 * spacing),
                vortex: d_right * (-gamma * spacing),
            });
            negating.push(NegatingVortex {
                start: left,
                end: right,
                gamma: -gamma,
            });
        }

        let discard = config.discard_distance * chord;
        let rows: Vec<Vec<Vorton>> = (0..config.rows)
            .map(|r| {
                let shift = wind * (r as f64 * spacing);
                first_row
                    .iter()
                    .map(|v| Vorton {
                        position: v.position + shift,
                        vortex: v.vortex,
                    })
                    .collect()
            })
            .collect();
        let active_rows = (0..config.rows)
            .take_while(|&r| r as f64 * spacing <= discard)
            .count()
            .max(1)
            .min(config.rows);

        let image = ctx
            .images
            .as_ref()
            .map(|images| (images.height, images.coefficient));

        log::debug!(
            "Vorton wake: {} rows of {} vortons, {} active, spacing {:.3} m, core {:.3} m",
            rows.len(),
            first_row.len(),
            active_rows,
            spacing,
            core
        );

        Ok(Self {
            rows,
            negating,
            active_rows,
            spacing,
            core,
            wind,
            image,
        })
    }

    /// Velocity induced at `point` by the active rows, images included
    pub fn velocity_at(&self, point: Vector3) -> Vector3 {
        let per_row = parallel_map_indexed(self.active_rows, |r| {
            let mut v = Vector3::zero();
            for vorton in &self.rows[r] {
                v += vorton.velocity_at(point, self.core);
                if let Some((height, coefficient)) = self.image {
                    v += vorton.mirrored(height, coefficient).velocity_at(point, self.core);
                }
            }
            v
        });
        per_row.into_iter().sum()
    }

    /// Negating vortices of row `r`
    pub fn negating_row(&self, r: usize) -> impl Iterator<Item = NegatingVortex> + '_ {
        let shift = self.wind * (r as f64 * self.spacing);
        self.negating.iter().map(move |n| NegatingVortex {
            start: n.start + shift,
            end: n.end + shift,
            gamma: n.gamma,
        })
    }

    /// Induced drag evaluated at the middle row
    ///
    /// A wake of fewer than two rows has no interior row to evaluate and
    /// reports zero drag on every strip.
    pub fn induced_drag(&self, q_inf: f64) -> VortonDrag {
        if self.rows.len() < 2 {
            log::debug!("Vorton wake has {} row, drag not evaluated", self.rows.len());
            let strips = self.negating.len();
            return VortonDrag {
                strip_forces: vec![Vector3::zero(); strips],
                induced_angles: vec![0.0; strips],
                total: Vector3::zero(),
                drag_area: 0.0,
            };
        }
        let row = (self.rows.len() / 2).min(self.active_rows.saturating_sub(1));
        let q2 = q_inf * q_inf;

        let mut strip_forces = Vec::with_capacity(self.negating.len());
        let mut induced_angles = Vec::with_capacity(self.negating.len());
        for segment in self.negating_row(row) {
            let span = segment.end - segment.start;
            let wg = self.velocity_at((segment.start + segment.end) * 0.5) * 0.5;
            let force = if q2 > 0.0 {
                wg.cross(&span) * (segment.gamma * 2.0 / q2)
            } else {
                Vector3::zero()
            };
            let normal = match span.normalized() {
                Some(axis) => self.wind.cross(&axis),
                None => Vector3::zero(),
            };
            strip_forces.push(force);
            induced_angles.push(wg.dot(&normal).atan2(q_inf));
        }

        let total: Vector3 = strip_forces.iter().copied().sum();
        VortonDrag {
            drag_area: total.dot(&self.wind),
            strip_forces,
            induced_angles,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_vorton() -> Vorton {
        Vorton {
            position: Vector3::zero(),
            vortex: Vector3::unit_y(),
        }
    }

    #[test]
    fn test_kernel_is_bounded_at_the_vorton() {
        let v = unit_vorton().velocity_at(Vector3::zero(), 0.1);
        assert!(v.is_finite());
        assert_eq!(v, Vector3::zero());
    }

    #[test]
    fn test_kernel_decays_beyond_the_core() {
        let sigma = 0.2;
        let vorton = unit_vorton();
        let mut previous = f64::INFINITY;
        for step in 0..40 {
            let r = sigma * (1.0 + 0.25 * step as f64);
            let v = vorton.velocity_at(Vector3::new(r, 0.0, 0.0), sigma).norm();
            assert!(v < previous, "not decaying at r = {}", r);
            previous = v;
        }
    }

    #[test]
    fn test_kernel_matches_biot_savart_far_away() {
        let vorton = unit_vorton();
        let p = Vector3::new(0.0, 0.0, 20.0);
        let v = vorton.velocity_at(p, 0.05);
        // ω × r / (4π r³)
        assert_relative_eq!(v.x, 20.0 / (FOUR_PI * 8000.0), max_relative = 1e-4);
    }

    #[test]
    fn test_ground_image_reverses_horizontal_vortex() {
        let v = Vorton {
            position: Vector3::new(0.0, 0.0, 0.5),
            vortex: Vector3::new(1.0, 0.0, 0.2),
        };
        let m = v.mirrored(0.0, 1.0);
        assert_relative_eq!(m.position.z, -0.5);
        assert_relative_eq!(m.vortex.x, -1.0);
        assert_relative_eq!(m.vortex.z, 0.2);
    }

    fn horseshoe_wake(rows: usize) -> VortonWake {
        let spacing = 0.5;
        let first = [
            Vorton {
                position: Vector3::new(0.25, -0.5, 0.0),
                vortex: Vector3::new(spacing, 0.0, 0.0),
            },
            Vorton {
                position: Vector3::new(0.25, 0.5, 0.0),
                vortex: Vector3::new(-spacing, 0.0, 0.0),
            },
        ];
        VortonWake {
            rows: (0..rows)
                .map(|r| {
                    let shift = Vector3::new(r as f64 * spacing, 0.0, 0.0);
                    first
                        .iter()
                        .map(|v| Vorton {
                            position: v.position + shift,
                            vortex: v.vortex,
                        })
                        .collect()
                })
                .collect(),
            negating: vec![NegatingVortex {
                start: Vector3::new(0.0, -0.5, 0.0),
                end: Vector3::new(0.0, 0.5, 0.0),
                gamma: -1.0,
            }],
            active_rows: rows,
            spacing,
            core: 0.1,
            wind: Vector3::unit_x(),
            image: None,
        }
    }

    #[test]
    fn test_single_row_wake_has_no_drag() {
        let drag = horseshoe_wake(1).induced_drag(10.0);
        assert_eq!(drag.strip_forces, vec![Vector3::zero()]);
        assert_eq!(drag.induced_angles, vec![0.0]);
        assert_eq!(drag.drag_area, 0.0);

        let drag = horseshoe_wake(2).induced_drag(10.0);
        assert_eq!(drag.strip_forces.len(), 1);
        assert!(drag.total.norm() > 0.0);
        assert!(drag.induced_angles[0] != 0.0);
    }
}
