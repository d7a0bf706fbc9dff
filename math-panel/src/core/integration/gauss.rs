//! Gauss quadrature rules on triangles
//!
//! Symmetric Dunavant-type rules on the reference triangle with vertices
//! (0,0), (1,0), (0,1). A point (xi, eta) maps to `S0 + xi (S1 - S0) + eta (S2 - S0)`
//! on a panel, where the linear basis functions take the values
//! `(1 - xi - eta, xi, eta)`.

// Allow excessive precision for high-precision mathematical constants
#![allow(clippy::excessive_precision)]

use serde::{Deserialize, Serialize};

/// Triangle quadrature rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriangleRule {
    /// Centroid rule (degree 1)
    OnePoint,
    /// 4-point rule (degree 3)
    FourPoint,
    /// 7-point rule (degree 5)
    #[default]
    SevenPoint,
    /// 13-point rule (degree 7)
    ThirteenPoint,
}

impl TriangleRule {
    /// Number of integration points
    pub fn n_points(self) -> usize {
        self.table().len()
    }

    fn table(self) -> &'static [[f64; 3]] {
        match self {
            TriangleRule::OnePoint => &GAUCORWEI_TR1,
            TriangleRule::FourPoint => &GAUCORWEI_TR4,
            TriangleRule::SevenPoint => &GAUCORWEI_TR7,
            TriangleRule::ThirteenPoint => &GAUCORWEI_TR13,
        }
    }
}

/// Triangle quadrature points (xi, eta, weight)
///
/// Returns vector of (xi, eta, weight) tuples for the reference triangle
/// with vertices at (0,0), (1,0), (0,1). Weights are scaled so they sum
/// to 0.5 (the area of the reference triangle); multiply by twice the panel
/// area to integrate over a physical panel.
pub fn triangle_quadrature(rule: TriangleRule) -> Vec<(f64, f64, f64)> {
    // The raw tables have weights that sum to 1.0 (unit simplex convention).
    // We scale by 0.5 to get weights that sum to the reference triangle area.
    const AREA_SCALE: f64 = 0.5;
    rule.table()
        .iter()
        .map(|&[x, y, w]| (x, y, w * AREA_SCALE))
        .collect()
}

/// Values of the three linear basis functions at (xi, eta)
#[inline]
pub fn linear_basis(xi: f64, eta: f64) -> [f64; 3] {
    [1.0 - xi - eta, xi, eta]
}

static GAUCORWEI_TR1: [[f64; 3]; 1] = [[0.333333333333333, 0.333333333333333, 1.0]];

static GAUCORWEI_TR4: [[f64; 3]; 4] = [
    [0.333333333333333, 0.333333333333333, -0.5625],
    [0.6, 0.2, 0.520833333333333],
    [0.2, 0.6, 0.520833333333333],
    [0.2, 0.2, 0.520833333333333],
];

static GAUCORWEI_TR7: [[f64; 3]; 7] = [
    [0.333333333333333, 0.333333333333333, 0.225],
    [0.797426985353087, 0.101286507323456, 0.125939180544827],
    [0.101286507323456, 0.797426985353087, 0.125939180544827],
    [0.101286507323456, 0.101286507323456, 0.125939180544827],
    [0.470142064105115, 0.059715871789770, 0.132394152788506],
    [0.059715871789770, 0.470142064105115, 0.132394152788506],
    [0.470142064105115, 0.470142064105115, 0.132394152788506],
];

static GAUCORWEI_TR13: [[f64; 3]; 13] = [
    [0.333333333333333, 0.333333333333333, -0.149570044467682],
    [0.260345966079040, 0.260345966079040, 0.175615257433208],
    [0.260345966079040, 0.479308067841920, 0.175615257433208],
    [0.479308067841920, 0.260345966079040, 0.175615257433208],
    [0.065130102902216, 0.065130102902216, 0.053347235608838],
    [0.065130102902216, 0.869739794195568, 0.053347235608838],
    [0.869739794195568, 0.065130102902216, 0.053347235608838],
    [0.638444188569810, 0.048690315425316, 0.077113760890257],
    [0.048690315425316, 0.638444188569810, 0.077113760890257],
    [0.638444188569810, 0.312865496004874, 0.077113760890257],
    [0.312865496004874, 0.638444188569810, 0.077113760890257],
    [0.048690315425316, 0.312865496004874, 0.077113760890257],
    [0.312865496004874, 0.048690315425316, 0.077113760890257],
];
