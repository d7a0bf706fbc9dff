//! Closed symmetric wing: lift sign, symmetry and agreement between formulations

use approx::assert_relative_eq;
use panel::core::postprocess::panel_average;
use panel::{
    AnalysisConfig, BoundaryCondition, ClosedWingSpec, FlatPlateSpec, Formulation, PanelAnalysis,
    ReferenceGeometry, Vector3, closed_wing, flat_plate,
};

const SPEED: f64 = 10.0;

fn alpha() -> f64 {
    4.0_f64.to_radians()
}

fn config(formulation: Formulation, bc: BoundaryCondition) -> AnalysisConfig {
    AnalysisConfig::default()
        .with_formulation(formulation)
        .with_boundary_condition(bc)
        .with_reference(ReferenceGeometry {
            cog: Vector3::new(0.25, 0.0, 0.0),
            chord: 1.0,
            span: 1.0,
            area: 1.0,
        })
}

fn wing(formulation: Formulation, bc: BoundaryCondition) -> PanelAnalysis {
    let mesh = closed_wing(&ClosedWingSpec::default()).unwrap();
    let mut analysis = PanelAnalysis::new(mesh, config(formulation, bc)).unwrap();
    analysis.run().unwrap();
    analysis
}

fn wing_cl(formulation: Formulation, bc: BoundaryCondition) -> f64 {
    wing(formulation, bc)
        .solve_operating_point(alpha(), 0.0, SPEED)
        .unwrap()
        .coefficients
        .cl
}

fn cases() -> [(Formulation, BoundaryCondition); 4] {
    [
        (Formulation::Uniform, BoundaryCondition::Neumann),
        (Formulation::Uniform, BoundaryCondition::Dirichlet),
        (Formulation::Linear, BoundaryCondition::Neumann),
        (Formulation::Linear, BoundaryCondition::Dirichlet),
    ]
}

fn assert_close(a: f64, b: f64, tolerance: f64) {
    assert!(
        (a - b).abs() <= tolerance * a.abs().max(b.abs()),
        "{} and {} differ by more than {}",
        a,
        b,
        tolerance
    );
}

#[test]
fn test_symmetric_wing_has_no_lift_at_zero_alpha() {
    for (formulation, bc) in cases() {
        let op = wing(formulation, bc)
            .solve_operating_point(0.0, 0.0, SPEED)
            .unwrap();
        assert!(
            op.coefficients.cl.abs() < 1e-6,
            "{:?}/{:?}: CL = {}",
            formulation,
            bc,
            op.coefficients.cl
        );
        assert!(op.coefficients.cd.abs() < 1e-6);
    }
}

#[test]
fn test_wing_lifts_like_the_flat_plate() {
    let plate = flat_plate(&FlatPlateSpec {
        nx: 8,
        ny: 6,
        ..Default::default()
    })
    .unwrap();
    let mut plate = PanelAnalysis::new(
        plate,
        config(Formulation::Uniform, BoundaryCondition::Neumann),
    )
    .unwrap();
    plate.run().unwrap();
    let plate_cl = plate
        .solve_operating_point(alpha(), 0.0, SPEED)
        .unwrap()
        .coefficients
        .cl;
    assert!(plate_cl > 0.0);

    for (formulation, bc) in cases() {
        let op = wing(formulation, bc)
            .solve_operating_point(alpha(), 0.0, SPEED)
            .unwrap();
        assert!(op.coefficients.cl > 0.0, "{:?}/{:?}", formulation, bc);
        assert!(op.coefficients.cd > 0.0, "{:?}/{:?}", formulation, bc);
        assert_close(op.coefficients.cl, plate_cl, 0.2);
    }
}

#[test]
fn test_boundary_conditions_agree() {
    for formulation in [Formulation::Uniform, Formulation::Linear] {
        let neumann = wing_cl(formulation, BoundaryCondition::Neumann);
        let dirichlet = wing_cl(formulation, BoundaryCondition::Dirichlet);
        assert_close(neumann, dirichlet, 0.15);
    }
}

#[test]
fn test_formulations_agree() {
    for bc in [BoundaryCondition::Neumann, BoundaryCondition::Dirichlet] {
        let linear = wing_cl(Formulation::Linear, bc);
        let uniform = wing_cl(Formulation::Uniform, bc);
        assert_close(linear, uniform, 0.15);
    }
}

#[test]
fn test_thick_panels_carry_sources_and_mirror_pressure() {
    let spec = ClosedWingSpec::default();
    let analysis = wing(Formulation::Uniform, BoundaryCondition::Dirichlet);
    let source = analysis.source_matrix().unwrap();
    assert!(source.iter().any(|&v| v != 0.0));

    let op = analysis.solve_operating_point(0.0, 0.0, SPEED).unwrap();
    assert!(op.sigma.iter().any(|&s| s != 0.0));
    assert!(op.cp.iter().flatten().all(|v| v.is_finite()));

    // At zero incidence the bottom surface sees the top surface's pressure
    let n_top = 2 * spec.nx * spec.ny;
    for k in 0..n_top {
        assert_relative_eq!(
            panel_average(&op.cp[k]),
            panel_average(&op.cp[k + n_top]),
            epsilon = 1e-6
        );
    }
}

#[test]
fn test_lift_is_odd_in_alpha() {
    let analysis = wing(Formulation::Linear, BoundaryCondition::Dirichlet);
    let up = analysis.solve_operating_point(alpha(), 0.0, SPEED).unwrap();
    let down = analysis.solve_operating_point(-alpha(), 0.0, SPEED).unwrap();
    assert_relative_eq!(
        up.coefficients.cl,
        -down.coefficients.cl,
        max_relative = 1e-6
    );
    assert_relative_eq!(
        up.coefficients.cd,
        down.coefficients.cd,
        max_relative = 1e-6
    );
}
