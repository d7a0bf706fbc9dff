//! Zero-moment angle search
//!
//! Brackets a sign change of the pitching moment inside ±45°, shrinking the
//! bracket until the signs differ, then refines it by regula falsi.

use std::f64::consts::FRAC_PI_4;

use crate::error::{PanelError, Result};

/// Pitching moment magnitude accepted as zero
pub const MOMENT_TOLERANCE: f64 = 1e-7;

/// Iteration cap of both the bracketing and the refinement
pub const MAX_TRIM_ITERATIONS: usize = 50;

/// Angle of attack (radians) at which `cm` vanishes
///
/// `cm` evaluates the pitching moment at an angle of attack.
pub fn zero_moment_angle<F>(mut cm: F) -> Result<f64>
where
    F: FnMut(f64) -> Result<f64>,
{
    let mut a0 = -FRAC_PI_4;
    let mut a1 = FRAC_PI_4;
    let mut cm0 = cm(a0)?;
    let mut cm1 = cm(a1)?;

    let mut iterations = 0;
    while cm0 * cm1 > 0.0 {
        if iterations >= MAX_TRIM_ITERATIONS {
            return Err(PanelError::TrimNotConverged { iterations });
        }
        a0 *= 0.9;
        a1 *= 0.9;
        cm0 = cm(a0)?;
        cm1 = cm(a1)?;
        iterations += 1;
    }

    // Illinois variant: halve the retained end when the same end is kept twice
    let mut kept_low = None;
    for iteration in 0..MAX_TRIM_ITERATIONS {
        if cm0.abs() < MOMENT_TOLERANCE {
            return Ok(a0);
        }
        if cm1.abs() < MOMENT_TOLERANCE {
            return Ok(a1);
        }
        let a = a1 - cm1 * (a1 - a0) / (cm1 - cm0);
        let cm_a = cm(a)?;
        log::debug!(
            "Trim iteration {}: alpha = {:.5}°, Cm = {:.3e}",
            iteration,
            a.to_degrees(),
            cm_a
        );
        if cm_a.abs() < MOMENT_TOLERANCE {
            return Ok(a);
        }
        if cm_a * cm0 < 0.0 {
            a1 = a;
            cm1 = cm_a;
            if kept_low == Some(true) {
                cm0 *= 0.5;
            }
            kept_low = Some(true);
        } else {
            a0 = a;
            cm0 = cm_a;
            if kept_low == Some(false) {
                cm1 *= 0.5;
            }
            kept_low = Some(false);
        }
    }
    Err(PanelError::TrimNotConverged {
        iterations: MAX_TRIM_ITERATIONS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_moment_curve() {
        let alpha = zero_moment_angle(|a| Ok(0.02 - 0.5 * a)).unwrap();
        assert_relative_eq!(alpha, 0.04, epsilon = 1e-6);
    }

    #[test]
    fn test_nonlinear_moment_curve() {
        let alpha = zero_moment_angle(|a| Ok((a - 0.1).sin() * (1.0 + a * a))).unwrap();
        assert_relative_eq!(alpha, 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_no_sign_change_fails() {
        let result = zero_moment_angle(|a| Ok(1.0 + a * a));
        assert!(matches!(result, Err(PanelError::TrimNotConverged { .. })));
    }
}
