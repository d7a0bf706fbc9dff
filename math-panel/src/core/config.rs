//! Analysis configuration
//!
//! Every solver-wide switch lives in one [`AnalysisConfig`] value handed to the
//! analysis at construction. Configurations load from and save to JSON.

use serde::{Deserialize, Serialize};
use solvers::Precision;
use std::fs;
use std::path::Path;

use crate::core::integration::{KernelParams, TriangleRule};
use crate::core::types::Vector3;
use crate::error::{PanelError, Result};

/// Doublet discretisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Formulation {
    /// Linearly varying doublet, three unknowns per panel, Galerkin products
    #[default]
    Linear,
    /// Constant doublet, one unknown per panel, centroid collocation
    Uniform,
}

impl Formulation {
    /// Unknowns carried by each panel
    pub fn unknowns_per_panel(self) -> usize {
        match self {
            Formulation::Linear => 3,
            Formulation::Uniform => 1,
        }
    }
}

/// Boundary condition enforced on thick (non mid-surface) panels
///
/// Mid-surface panels always use the normal-velocity condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryCondition {
    /// Zero normal velocity
    #[default]
    Neumann,
    /// Zero interior perturbation potential
    Dirichlet,
}

/// Image system below the body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceEffect {
    /// Free air
    #[default]
    None,
    /// Solid ground plane
    Ground,
    /// Free water surface
    FreeSurface,
}

impl SurfaceEffect {
    /// Sign of the mirror panel contributions, `None` without images
    pub fn coefficient(self) -> Option<f64> {
        match self {
            SurfaceEffect::None => None,
            SurfaceEffect::Ground => Some(1.0),
            SurfaceEffect::FreeSurface => Some(-1.0),
        }
    }
}

/// Construction of the in-plane axis of the node frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisStrategy {
    /// Gram-Schmidt against the global axis least aligned with the normal
    #[default]
    Deterministic,
    /// Seeded random trials, 50 at most per node
    Randomized {
        /// Base seed; node `i` uses `seed + i`
        seed: u64,
    },
}

/// Reference geometry for moments and coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceGeometry {
    /// Centre of gravity, origin of moments and rotations
    pub cog: Vector3,
    /// Reference chord (m)
    pub chord: f64,
    /// Reference span (m)
    pub span: f64,
    /// Reference area (m²)
    pub area: f64,
}

impl Default for ReferenceGeometry {
    fn default() -> Self {
        Self {
            cog: Vector3::zero(),
            chord: 1.0,
            span: 1.0,
            area: 1.0,
        }
    }
}

/// Vorton wake parameters, lengths relative to the reference chord
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VortonConfig {
    /// Vorton core size
    #[serde(default = "default_core_size")]
    pub core_size: f64,
    /// Streamwise spacing of the vorton rows
    #[serde(default = "default_l0")]
    pub l0: f64,
    /// Number of vorton rows
    #[serde(default = "default_rows")]
    pub rows: usize,
    /// Distance beyond which rows are inactive
    #[serde(default = "default_discard_distance")]
    pub discard_distance: f64,
}

impl Default for VortonConfig {
    fn default() -> Self {
        Self {
            core_size: default_core_size(),
            l0: default_l0(),
            rows: default_rows(),
            discard_distance: default_discard_distance(),
        }
    }
}

fn default_core_size() -> f64 {
    0.2
}

fn default_l0() -> f64 {
    0.5
}

fn default_rows() -> usize {
    20
}

fn default_discard_distance() -> f64 {
    25.0
}

/// Complete analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Matrix storage precision
    #[serde(default)]
    pub precision: Precision,
    /// Run the parallel stages on several threads
    #[serde(default = "default_multithread")]
    pub multithread: bool,
    /// Thread cap, 0 for the number of logical cores
    #[serde(default)]
    pub max_threads: usize,
    /// Doublet discretisation
    #[serde(default)]
    pub formulation: Formulation,
    /// Condition on thick panels
    #[serde(default)]
    pub boundary_condition: BoundaryCondition,
    /// Ground or free-surface images
    #[serde(default)]
    pub surface_effect: SurfaceEffect,
    /// Height of the body above the image plane (m)
    #[serde(default)]
    pub ground_height: f64,
    /// Reference geometry
    #[serde(default)]
    pub reference: ReferenceGeometry,
    /// Fluid density (kg/m³)
    #[serde(default = "default_density")]
    pub density: f64,
    /// Quadrature rule of the Galerkin products
    #[serde(default)]
    pub quadrature: TriangleRule,
    /// Distance, in panel sizes, beyond which point approximations are used
    #[serde(default = "default_far_field_factor")]
    pub far_field_factor: f64,
    /// Regularisation radius of the kernels (m)
    #[serde(default = "default_core_radius")]
    pub core_radius: f64,
    /// Wake panels visited per column before the chain is declared malformed
    #[serde(default = "default_max_wake_hops")]
    pub max_wake_hops: usize,
    /// Node frame construction
    #[serde(default)]
    pub axis_strategy: AxisStrategy,
    /// Vorton wake parameters
    #[serde(default)]
    pub vorton: VortonConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            precision: Precision::default(),
            multithread: default_multithread(),
            max_threads: 0,
            formulation: Formulation::default(),
            boundary_condition: BoundaryCondition::default(),
            surface_effect: SurfaceEffect::default(),
            ground_height: 0.0,
            reference: ReferenceGeometry::default(),
            density: default_density(),
            quadrature: TriangleRule::default(),
            far_field_factor: default_far_field_factor(),
            core_radius: default_core_radius(),
            max_wake_hops: default_max_wake_hops(),
            axis_strategy: AxisStrategy::default(),
            vorton: VortonConfig::default(),
        }
    }
}

fn default_multithread() -> bool {
    true
}

fn default_density() -> f64 {
    1.225
}

fn default_far_field_factor() -> f64 {
    10.0
}

fn default_core_radius() -> f64 {
    1e-6
}

fn default_max_wake_hops() -> usize {
    1000
}

impl AnalysisConfig {
    /// Set the matrix precision
    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Enable or disable multithreading with a thread cap (0 = all cores)
    pub fn with_threads(mut self, multithread: bool, max_threads: usize) -> Self {
        self.multithread = multithread;
        self.max_threads = max_threads;
        self
    }

    /// Set the doublet discretisation
    pub fn with_formulation(mut self, formulation: Formulation) -> Self {
        self.formulation = formulation;
        self
    }

    /// Set the boundary condition of thick panels
    pub fn with_boundary_condition(mut self, bc: BoundaryCondition) -> Self {
        self.boundary_condition = bc;
        self
    }

    /// Enable ground or free-surface images at the given height
    pub fn with_surface_effect(mut self, effect: SurfaceEffect, height: f64) -> Self {
        self.surface_effect = effect;
        self.ground_height = height;
        self
    }

    /// Set the reference geometry
    pub fn with_reference(mut self, reference: ReferenceGeometry) -> Self {
        self.reference = reference;
        self
    }

    /// Set the fluid density
    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    /// Set the quadrature rule
    pub fn with_quadrature(mut self, rule: TriangleRule) -> Self {
        self.quadrature = rule;
        self
    }

    /// Set the wake hop cap
    pub fn with_max_wake_hops(mut self, hops: usize) -> Self {
        self.max_wake_hops = hops;
        self
    }

    /// Set the node frame construction
    pub fn with_axis_strategy(mut self, strategy: AxisStrategy) -> Self {
        self.axis_strategy = strategy;
        self
    }

    /// Set the vorton parameters
    pub fn with_vorton(mut self, vorton: VortonConfig) -> Self {
        self.vorton = vorton;
        self
    }

    /// Check that all values are usable
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("density", self.density),
            ("far_field_factor", self.far_field_factor),
            ("reference.chord", self.reference.chord),
            ("reference.span", self.reference.span),
            ("reference.area", self.reference.area),
            ("vorton.core_size", self.vorton.core_size),
            ("vorton.l0", self.vorton.l0),
            ("vorton.discard_distance", self.vorton.discard_distance),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(PanelError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if !(self.core_radius.is_finite() && self.core_radius >= 0.0) {
            return Err(PanelError::InvalidConfig(format!(
                "core_radius must be non-negative, got {}",
                self.core_radius
            )));
        }
        if !self.ground_height.is_finite() {
            return Err(PanelError::InvalidConfig(
                "ground_height must be finite".to_string(),
            ));
        }
        if self.surface_effect != SurfaceEffect::None && self.ground_height <= 0.0 {
            return Err(PanelError::InvalidConfig(format!(
                "ground_height must be positive with surface effect, got {}",
                self.ground_height
            )));
        }
        if self.max_wake_hops == 0 {
            return Err(PanelError::InvalidConfig(
                "max_wake_hops must be at least 1".to_string(),
            ));
        }
        if self.vorton.rows == 0 {
            return Err(PanelError::InvalidConfig(
                "vorton.rows must be at least 1".to_string(),
            ));
        }
        if !self.reference.cog.is_finite() {
            return Err(PanelError::InvalidConfig(
                "reference.cog must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of worker threads of the analysis pool
    pub fn worker_count(&self) -> usize {
        if !self.multithread {
            return 1;
        }
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        if self.max_threads == 0 {
            available
        } else {
            self.max_threads.min(available).max(1)
        }
    }

    /// Kernel evaluation parameters
    pub fn kernel_params(&self) -> KernelParams {
        KernelParams {
            core_radius: self.core_radius,
            far_field_factor: self.far_field_factor,
        }
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Save as pretty-printed JSON
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
