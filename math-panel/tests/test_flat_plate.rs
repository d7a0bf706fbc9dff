//! Flat plate regression: 1 x 1 m plate, 4 x 4 panels, 10 m/s, alpha = 2°

use approx::assert_relative_eq;
use panel::{
    AnalysisConfig, FlatPlateSpec, Formulation, PanelAnalysis, ReferenceGeometry, Vector3,
    flat_plate,
};

const SPEED: f64 = 10.0;

fn alpha() -> f64 {
    2.0_f64.to_radians()
}

fn analysis(formulation: Formulation, cog: Vector3) -> PanelAnalysis {
    pitched_analysis(formulation, cog, 0.0)
}

fn pitched_analysis(formulation: Formulation, cog: Vector3, incidence: f64) -> PanelAnalysis {
    let mesh = flat_plate(&FlatPlateSpec {
        incidence,
        ..Default::default()
    })
    .unwrap();
    let config = AnalysisConfig::default()
        .with_formulation(formulation)
        .with_reference(ReferenceGeometry {
            cog,
            chord: 1.0,
            span: 1.0,
            area: 1.0,
        });
    let mut analysis = PanelAnalysis::new(mesh, config).unwrap();
    analysis.run().unwrap();
    analysis
}

#[test]
fn test_heave_damping_is_restoring() {
    let analysis = analysis(Formulation::Uniform, Vector3::new(0.25, 0.0, 0.0));
    let d = analysis.stability_derivatives(alpha(), SPEED).unwrap();
    assert!(d.Zw < 0.0, "Zw = {}", d.Zw);
    assert!(d.Zw.abs() > 1.0 && d.Zw.abs() < 50.0, "Zw = {}", d.Zw);
    assert!(d.Mq < 0.0, "Mq = {}", d.Mq);
    assert!(d.reference_force.z > 0.0);
}

#[test]
fn test_linear_derivatives_are_damping() {
    let analysis = analysis(Formulation::Linear, Vector3::new(0.25, 0.0, 0.0));
    let d = analysis.stability_derivatives(alpha(), SPEED).unwrap();
    assert!(d.Zw < 0.0, "Zw = {}", d.Zw);
    assert!(d.Zw.abs() > 1.0 && d.Zw.abs() < 50.0, "Zw = {}", d.Zw);
    assert!(d.Mq < 0.0, "Mq = {}", d.Mq);
    assert!(d.reference_force.z > 0.0);
}

#[test]
fn test_lift_grows_with_alpha() {
    let analysis = analysis(Formulation::Uniform, Vector3::new(0.25, 0.0, 0.0));
    let low = analysis.solve_operating_point(alpha(), 0.0, SPEED).unwrap();
    let high = analysis
        .solve_operating_point(2.0 * alpha(), 0.0, SPEED)
        .unwrap();
    assert!(low.coefficients.cl > 0.0);
    assert!(high.coefficients.cl > low.coefficients.cl);
    // Pressure acts along the plate normal and lifts the plate
    assert!(low.pressure_force.z > 0.0);
    assert!(high.pressure_force.z > low.pressure_force.z);
    assert_eq!(low.pressure_force.x, 0.0);
    // Low aspect ratio plate: lift slope well below 2π
    let slope = low.coefficients.cl / alpha();
    assert!(slope > 0.5 && slope < 2.0 * std::f64::consts::PI, "CLα = {}", slope);
}

#[test]
fn test_linear_formulation_lifts() {
    let analysis = analysis(Formulation::Linear, Vector3::new(0.25, 0.0, 0.0));
    let op = analysis.solve_operating_point(alpha(), 0.0, SPEED).unwrap();
    assert!(op.coefficients.cl.is_finite());
    assert!(op.coefficients.cl > 0.0);
    assert_eq!(op.cp.len(), analysis.mesh().n_panels());
    assert_eq!(op.node_velocities.len(), analysis.mesh().n_nodes());
}

#[test]
fn test_zero_moment_about_leading_edge_at_zero_alpha() {
    let analysis = analysis(Formulation::Uniform, Vector3::zero());
    let trim = analysis.zero_moment_angle().unwrap();
    assert_relative_eq!(trim, 0.0, epsilon = 1e-6);
}

#[test]
fn test_pitched_plate_trims_at_zero_loading() {
    // Trailing edge 3° down: the plate is unloaded when the wind comes 3° from above
    let incidence = 3.0_f64.to_radians();
    for formulation in [Formulation::Uniform, Formulation::Linear] {
        let analysis = pitched_analysis(formulation, Vector3::zero(), incidence);
        let trim = analysis.zero_moment_angle().unwrap();
        assert_relative_eq!(trim, -incidence, epsilon = 1e-5);

        let op = analysis.solve_operating_point(trim, 0.0, SPEED).unwrap();
        assert!(op.coefficients.cl.abs() < 1e-4, "CL = {}", op.coefficients.cl);
    }
}
