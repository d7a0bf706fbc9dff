//! Linear system properties: superposition, solve round trip, precision isolation

use approx::assert_relative_eq;
use ndarray::{Array2, Axis};
use panel::{
    AnalysisConfig, FlatPlateSpec, FlowField, Formulation, PanelAnalysis, Precision, Vector3,
    flat_plate,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn plate() -> panel::PanelMesh {
    flat_plate(&FlatPlateSpec {
        nx: 3,
        ny: 4,
        wake_panels: 8,
        ..Default::default()
    })
    .unwrap()
}

fn solved(config: AnalysisConfig) -> PanelAnalysis {
    let mut analysis = PanelAnalysis::new(plate(), config).unwrap();
    analysis.run().unwrap();
    analysis
}

fn max_abs(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, |m, v| m.max(v.abs()))
}

#[test]
fn test_superposition_of_unit_solutions() {
    for formulation in [Formulation::Linear, Formulation::Uniform] {
        let analysis = solved(AnalysisConfig::default().with_formulation(formulation));
        let rhs = analysis.unit_rhs().unwrap().to_owned();
        let mu = analysis.unit_solutions().unwrap().to_owned();

        let (a, b) = (1.7, -0.35);
        let mut combined = Array2::<f64>::zeros((rhs.nrows(), 1));
        combined
            .column_mut(0)
            .assign(&(&rhs.column(0) * a + &rhs.column(5) * b));
        let direct = analysis.solve(&combined).unwrap();
        let expected = &mu.column(0) * a + &mu.column(5) * b;

        let scale = max_abs(expected.iter().copied());
        assert!(scale > 0.0);
        for (x, y) in direct.column(0).iter().zip(expected.iter()) {
            assert!((x - y).abs() <= 1e-9 * scale, "{:?}: {} vs {}", formulation, x, y);
        }
    }
}

#[test]
fn test_combined_rhs_matches_direct_build() {
    let analysis = solved(AnalysisConfig::default());
    let field = FlowField {
        v_inf: Vector3::new(9.8, 0.4, 0.7),
        omega: Vector3::new(0.05, -0.2, 0.01),
    };
    let direct = analysis.build_rhs(&[field]).unwrap();
    let combined = analysis.combine_unit_rhs(field.v_inf, field.omega).unwrap();
    let scale = max_abs(combined.iter().copied());
    for (x, y) in direct.column(0).iter().zip(combined.iter()) {
        assert!((x - y).abs() <= 1e-12 * scale.max(1.0));
    }
}

#[test]
fn test_solve_round_trip() {
    let mut rng = StdRng::seed_from_u64(42);
    for (precision, tolerance) in [(Precision::Double, 1e-9), (Precision::Single, 1e-2)] {
        let config = AnalysisConfig::default().with_precision(precision);
        let mut analysis = PanelAnalysis::new(plate(), config).unwrap();
        analysis.assemble().unwrap();
        let a = analysis.matrix().unwrap().to_f64();
        analysis.factorize().unwrap();

        let n = a.nrows();
        let b = Array2::from_shape_fn((n, 2), |_| rng.gen_range(-1.0..1.0));
        let x = analysis.solve(&b).unwrap();
        let residual = a.dot(&x) - &b;
        let scale = max_abs(b.iter().copied());
        let error = max_abs(residual.iter().copied());
        assert!(
            error <= tolerance * scale,
            "{:?} residual {} exceeds {}",
            precision,
            error,
            tolerance * scale
        );
    }
}

#[test]
fn test_precision_mode_isolation() {
    let double = solved(AnalysisConfig::default());
    let single = solved(AnalysisConfig::default().with_precision(Precision::Single));

    // Switching back and forth before factorization leaves no trace
    let mut switched = PanelAnalysis::new(plate(), AnalysisConfig::default()).unwrap();
    switched.set_precision(Precision::Single).unwrap();
    switched.assemble().unwrap();
    switched.set_precision(Precision::Double).unwrap();
    assert!(switched.matrix().is_none());
    switched.run().unwrap();

    let alpha = 3.0_f64.to_radians();
    let mu_d = double.doublet_strengths(alpha, 0.0).unwrap();
    let mu_s = single.doublet_strengths(alpha, 0.0).unwrap();
    let mu_x = switched.doublet_strengths(alpha, 0.0).unwrap();

    let scale = max_abs(mu_d.iter().copied());
    for ((d, s), x) in mu_d.iter().zip(mu_s.iter()).zip(mu_x.iter()) {
        assert!((d - s).abs() <= 5e-3 * scale);
        assert_eq!(d, x);
    }
}

#[test]
fn test_unit_solutions_have_one_column_per_field() {
    let analysis = solved(AnalysisConfig::default().with_formulation(Formulation::Uniform));
    let mu = analysis.unit_solutions().unwrap();
    assert_eq!(mu.len_of(Axis(1)), 6);
    assert_eq!(mu.nrows(), analysis.n_unknowns());
    // A flat plate in its own plane has no solution for the x translation
    assert_relative_eq!(max_abs(mu.column(0).iter().copied()), 0.0, epsilon = 1e-12);
}
