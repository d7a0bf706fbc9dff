//! Stability derivatives by central differences
//!
//! The flight state is a stability-axis velocity `V0 = -u0·is` at angle of
//! attack `alpha`. Each derivative perturbs one component of the relative
//! wind (translations) or of the rotation rate, evaluates the loads on both
//! sides and projects the difference on the stability axes
//! `is = (-cos α, 0, -sin α)`, `js = (0, 1, 0)`, `ks = (sin α, 0, -cos α)`.
//!
//! A body moving along an axis sees the wind move the opposite way, so the
//! translational derivatives difference the minus and plus wind states; the
//! rotational ones use the rotation rate directly.

use serde::{Deserialize, Serialize};

use crate::core::assembly::FlowField;
use crate::core::types::Vector3;
use crate::error::Result;

/// Translational perturbation (m/s)
pub const VELOCITY_STEP: f64 = 0.001;

/// Rotational perturbation (rad/s)
pub const RATE_STEP: f64 = 0.01;

/// Stability derivatives in stability axes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct StabDerivatives {
    /// Axial force per forward speed
    pub Xu: f64,
    /// Normal force per forward speed
    pub Zu: f64,
    /// Pitching moment per forward speed
    pub Mu: f64,
    /// Side force per lateral speed
    pub Yv: f64,
    /// Rolling moment per lateral speed
    pub Lv: f64,
    /// Yawing moment per lateral speed
    pub Nv: f64,
    /// Axial force per vertical speed
    pub Xw: f64,
    /// Normal force per vertical speed
    pub Zw: f64,
    /// Pitching moment per vertical speed
    pub Mw: f64,
    /// Side force per roll rate
    pub Yp: f64,
    /// Rolling moment per roll rate
    pub Lp: f64,
    /// Yawing moment per roll rate
    pub Np: f64,
    /// Axial force per pitch rate
    pub Xq: f64,
    /// Normal force per pitch rate
    pub Zq: f64,
    /// Pitching moment per pitch rate
    pub Mq: f64,
    /// Side force per yaw rate
    pub Yr: f64,
    /// Rolling moment per yaw rate
    pub Lr: f64,
    /// Yawing moment per yaw rate
    pub Nr: f64,
    /// Force in the trimmed state (N)
    pub reference_force: Vector3,
    /// Moment in the trimmed state (N·m)
    pub reference_moment: Vector3,
}

/// Stability axes `(is, js, ks)` at angle of attack `alpha`
pub fn stability_axes(alpha: f64) -> (Vector3, Vector3, Vector3) {
    (
        Vector3::new(-alpha.cos(), 0.0, -alpha.sin()),
        Vector3::unit_y(),
        Vector3::new(alpha.sin(), 0.0, -alpha.cos()),
    )
}

/// Compute all derivatives from a load model
///
/// `loads` returns the force and moment about the CoG for a flow field; it is
/// called 13 times.
pub fn stability_derivatives<F>(alpha: f64, u0: f64, mut loads: F) -> Result<StabDerivatives>
where
    F: FnMut(&FlowField) -> Result<(Vector3, Vector3)>,
{
    let (is, js, ks) = stability_axes(alpha);
    let v0 = is * -u0;

    let (reference_force, reference_moment) = loads(&FlowField::translation(v0))?;

    let mut translation = |axis: Vector3| -> Result<(Vector3, Vector3)> {
        let (fp, mp) = loads(&FlowField::translation(v0 + axis * VELOCITY_STEP))?;
        let (fm, mm) = loads(&FlowField::translation(v0 - axis * VELOCITY_STEP))?;
        let scale = 1.0 / (2.0 * VELOCITY_STEP);
        Ok(((fm - fp) * scale, (mm - mp) * scale))
    };
    let (du_f, du_m) = translation(is)?;
    let (dv_f, dv_m) = translation(js)?;
    let (dw_f, dw_m) = translation(ks)?;

    let mut rotation = |axis: Vector3| -> Result<(Vector3, Vector3)> {
        let plus = FlowField {
            v_inf: v0,
            omega: axis * RATE_STEP,
        };
        let minus = FlowField {
            v_inf: v0,
            omega: axis * -RATE_STEP,
        };
        let (fp, mp) = loads(&plus)?;
        let (fm, mm) = loads(&minus)?;
        let scale = 1.0 / (2.0 * RATE_STEP);
        Ok(((fp - fm) * scale, (mp - mm) * scale))
    };
    let (dp_f, dp_m) = rotation(is)?;
    let (dq_f, dq_m) = rotation(js)?;
    let (dr_f, dr_m) = rotation(ks)?;

    Ok(StabDerivatives {
        Xu: du_f.dot(&is),
        Zu: du_f.dot(&ks),
        Mu: du_m.dot(&js),
        Yv: dv_f.dot(&js),
        Lv: dv_m.dot(&is),
        Nv: dv_m.dot(&ks),
        Xw: dw_f.dot(&is),
        Zw: dw_f.dot(&ks),
        Mw: dw_m.dot(&js),
        Yp: dp_f.dot(&js),
        Lp: dp_m.dot(&is),
        Np: dp_m.dot(&ks),
        Xq: dq_f.dot(&is),
        Zq: dq_f.dot(&ks),
        Mq: dq_m.dot(&js),
        Yr: dr_f.dot(&js),
        Lr: dr_m.dot(&is),
        Nr: dr_m.dot(&ks),
        reference_force,
        reference_moment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_axes_are_right_handed() {
        let (is, js, ks) = stability_axes(0.2);
        assert_relative_eq!(is.cross(&js).dot(&ks), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_linear_model_is_recovered() {
        // Force grows with the wind along z, moment with the pitch rate
        let alpha = 0.0;
        let d = stability_derivatives(alpha, 10.0, |field| {
            let force = Vector3::new(0.0, 0.0, 3.0 * field.v_inf.z);
            let moment = Vector3::new(0.0, -2.0 * field.omega.y, 0.0);
            Ok((force, moment))
        })
        .unwrap();
        // A body moving along ks (down) sees the wind rise: F·ks = -3 w
        assert_relative_eq!(d.Zw, -3.0, epsilon = 1e-9);
        assert_relative_eq!(d.Mq, -2.0, epsilon = 1e-9);
        assert_relative_eq!(d.Xu, 0.0, epsilon = 1e-9);
        assert_relative_eq!(d.Yv, 0.0, epsilon = 1e-9);
        assert_relative_eq!(d.reference_force.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_errors_propagate() {
        let mut calls = 0;
        let result = stability_derivatives(0.05, 10.0, |_| {
            calls += 1;
            if calls > 3 {
                Err(crate::error::PanelError::Cancelled)
            } else {
                Ok((Vector3::zero(), Vector3::zero()))
            }
        });
        assert!(result.is_err());
    }
}
