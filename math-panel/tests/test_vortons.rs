//! Vorton kernel and vorton-wake induced drag

use approx::assert_relative_eq;
use panel::core::postprocess::Vorton;
use panel::{AnalysisConfig, FlatPlateSpec, Formulation, PanelAnalysis, Vector3, flat_plate};

#[test]
fn test_vorton_is_bounded_and_decays() {
    let vorton = Vorton {
        position: Vector3::new(1.0, -0.5, 0.2),
        vortex: Vector3::new(0.3, 1.0, -0.1),
    };
    let sigma = 0.2;
    let direction = Vector3::new(0.0, 0.6, 0.8);

    let mut peak: f64 = 0.0;
    for step in 0..=20 {
        let r = sigma * step as f64 / 20.0;
        let v = vorton.velocity_at(vorton.position + direction * r, sigma);
        assert!(v.is_finite());
        peak = peak.max(v.norm());
    }
    assert!(peak < 10.0 / (sigma * sigma));

    let mut previous = f64::INFINITY;
    for step in 0..60 {
        let r = sigma * (1.0 + 0.5 * step as f64);
        let v = vorton.velocity_at(vorton.position + direction * r, sigma).norm();
        assert!(v < previous);
        previous = v;
    }
}

fn solved_plate() -> PanelAnalysis {
    let mesh = flat_plate(&FlatPlateSpec {
        nx: 3,
        ny: 6,
        span: 3.0,
        wake_panels: 6,
        ..Default::default()
    })
    .unwrap();
    let mut config = AnalysisConfig::default().with_formulation(Formulation::Uniform);
    config.reference.span = 3.0;
    config.reference.area = 3.0;
    let mut analysis = PanelAnalysis::new(mesh, config).unwrap();
    analysis.run().unwrap();
    analysis
}

#[test]
fn test_vorton_rows_follow_the_wind() {
    let analysis = solved_plate();
    let alpha = 4.0_f64.to_radians();
    let wake = analysis.vorton_wake(alpha, 0.0, 10.0).unwrap();
    assert_eq!(wake.rows.len(), analysis.config().vorton.rows);
    assert_eq!(wake.rows[0].len(), 2 * 6);
    assert!(wake.active_rows >= 1 && wake.active_rows <= wake.rows.len());

    let shift = wake.rows[1][0].position - wake.rows[0][0].position;
    assert_relative_eq!(shift.norm(), wake.spacing, epsilon = 1e-12);
    assert_relative_eq!(shift.dot(&wake.wind), wake.spacing, epsilon = 1e-12);
}

#[test]
fn test_induced_drag_is_positive_and_grows_with_lift() {
    let analysis = solved_plate();
    let zero = analysis.vorton_drag(0.0, 0.0, 10.0).unwrap();
    assert_relative_eq!(zero.drag_area, 0.0, epsilon = 1e-12);

    let low = analysis.vorton_drag(2.0_f64.to_radians(), 0.0, 10.0).unwrap();
    let high = analysis.vorton_drag(4.0_f64.to_radians(), 0.0, 10.0).unwrap();
    assert_eq!(low.strip_forces.len(), 6);
    assert!(low.drag_area > 0.0, "drag area = {}", low.drag_area);
    assert!(high.drag_area > low.drag_area);
}

#[test]
fn test_drag_area_does_not_depend_on_speed() {
    let analysis = solved_plate();
    let alpha = 3.0_f64.to_radians();
    let slow = analysis.vorton_drag(alpha, 0.0, 5.0).unwrap();
    let fast = analysis.vorton_drag(alpha, 0.0, 20.0).unwrap();
    assert_relative_eq!(slow.drag_area, fast.drag_area, max_relative = 1e-9);
}
