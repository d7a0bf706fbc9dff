//! Mesh generators for validation geometries
//!
//! Provides thin lifting surfaces and closed symmetric wings with their wake
//! columns, used by the regression tests, the benchmarks and the command-line
//! driver.

use serde::{Deserialize, Serialize};

use crate::core::mesh::{PanelMesh, PanelSpec, WakePanelSpec};
use crate::core::types::{SurfacePosition, Vector3, WakeSide};
use crate::error::{PanelError, Result};

/// Rectangular flat plate description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatPlateSpec {
    /// Chord along x (m)
    pub chord: f64,
    /// Span along y (m)
    pub span: f64,
    /// Chordwise panel rows
    pub nx: usize,
    /// Spanwise panel columns
    pub ny: usize,
    /// Wake panel pairs per column
    pub wake_panels: usize,
    /// Total wake length downstream of the trailing edge (m)
    pub wake_length: f64,
    /// Rotation about the leading edge (radians), positive with the trailing edge down
    #[serde(default)]
    pub incidence: f64,
}

impl Default for FlatPlateSpec {
    fn default() -> Self {
        Self {
            chord: 1.0,
            span: 1.0,
            nx: 4,
            ny: 4,
            wake_panels: 10,
            wake_length: 30.0,
            incidence: 0.0,
        }
    }
}

/// Generate a flat rectangular plate made of mid-surface panels
///
/// The plate spans `x` in `[0, chord]` and `y` in `[-span/2, span/2]` at
/// `z = 0`, with all normals along +z, then is rotated about the leading edge
/// by `incidence`. Each quad is split into two triangles; the triangle of the
/// last row touching the trailing edge sheds a wake column of `wake_panels`
/// left/right triangle pairs extending downstream along +x.
///
/// # Arguments
/// * `spec` - Plate dimensions and discretisation
///
/// # Returns
/// A validated `PanelMesh` with `2·nx·ny` panels and `2·ny·wake_panels` wake panels
///
/// # Example
/// ```ignore
/// let mesh = flat_plate(&FlatPlateSpec::default())?;
/// ```
pub fn flat_plate(spec: &FlatPlateSpec) -> Result<PanelMesh> {
    if spec.nx == 0 || spec.ny == 0 || spec.wake_panels == 0 {
        return Err(PanelError::InvalidMesh(
            "flat plate needs at least one panel row, column and wake panel".to_string(),
        ));
    }
    if !(spec.chord > 0.0 && spec.span > 0.0 && spec.wake_length > 0.0) {
        return Err(PanelError::InvalidMesh(
            "flat plate dimensions must be positive".to_string(),
        ));
    }

    let (nx, ny, nw) = (spec.nx, spec.ny, spec.wake_panels);
    let dx = spec.chord / nx as f64;
    let dy = spec.span / ny as f64;
    let dw = spec.wake_length / nw as f64;
    let y_at = |j: usize| -0.5 * spec.span + j as f64 * dy;

    let (sin_i, cos_i) = spec.incidence.sin_cos();

    // Nodes, i along the chord and j along the span
    let mut nodes = Vec::with_capacity((nx + 1) * (ny + 1));
    for i in 0..=nx {
        let x = i as f64 * dx;
        for j in 0..=ny {
            nodes.push(Vector3::new(x * cos_i, y_at(j), -x * sin_i));
        }
    }
    let node = |i: usize, j: usize| i * (ny + 1) + j;

    let mut panels = Vec::with_capacity(2 * nx * ny);
    for i in 0..nx {
        for j in 0..ny {
            let a = node(i, j);
            let b = node(i, j + 1);
            let c = node(i + 1, j);
            let d = node(i + 1, j + 1);

            // The first triangle carries the trailing edge on its last two vertices
            let mut first = PanelSpec::new([a, c, d], SurfacePosition::Mid);
            if i == nx - 1 {
                first = first.with_wake(2 * nw * j);
            }
            panels.push(first);
            panels.push(PanelSpec::new([a, d, b], SurfacePosition::Mid));
        }
    }

    let trailing_edge = (spec.chord * cos_i, -spec.chord * sin_i);
    let wake = wake_columns(trailing_edge, &y_at, ny, nw, dw);

    log::debug!(
        "Flat plate {}x{} m: {}x{} quads, {} wake panels per column",
        spec.chord,
        spec.span,
        nx,
        ny,
        2 * nw
    );

    PanelMesh::new(nodes, panels, wake)
}

/// Flat wake columns parallel to the x-y plane, one per spanwise strip
///
/// Column `j` starts on the trailing edge at `(x, z) = trailing_edge` between
/// `y_at(j)` and `y_at(j + 1)` and is made of `nw` left/right pairs, its first
/// panel at index `2·nw·j`.
fn wake_columns(
    trailing_edge: (f64, f64),
    y_at: &dyn Fn(usize) -> f64,
    ny: usize,
    nw: usize,
    dw: f64,
) -> Vec<WakePanelSpec> {
    let (x_te, z_te) = trailing_edge;
    let mut wake = Vec::with_capacity(2 * ny * nw);
    for j in 0..ny {
        let base = 2 * nw * j;
        let left = |k: usize| Vector3::new(x_te + k as f64 * dw, y_at(j), z_te);
        let right = |k: usize| Vector3::new(x_te + k as f64 * dw, y_at(j + 1), z_te);

        for k in 0..nw {
            wake.push(WakePanelSpec {
                vertices: [left(k + 1), right(k), left(k)],
                side: WakeSide::Left,
                next: Some(base + 2 * k + 1),
            });
            wake.push(WakePanelSpec {
                vertices: [right(k + 1), right(k), left(k + 1)],
                side: WakeSide::Right,
                next: if k + 1 < nw {
                    Some(base + 2 * k + 2)
                } else {
                    None
                },
            });
        }
    }
    wake
}

/// Closed rectangular wing with a symmetric four-digit section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedWingSpec {
    /// Chord along x (m)
    pub chord: f64,
    /// Span along y (m)
    pub span: f64,
    /// Maximum thickness over chord
    pub thickness: f64,
    /// Chordwise panel rows on each surface
    pub nx: usize,
    /// Spanwise panel columns
    pub ny: usize,
    /// Wake panel pairs per column
    pub wake_panels: usize,
    /// Total wake length downstream of the trailing edge (m)
    pub wake_length: f64,
}

impl Default for ClosedWingSpec {
    fn default() -> Self {
        Self {
            chord: 1.0,
            span: 1.0,
            thickness: 0.06,
            nx: 8,
            ny: 6,
            wake_panels: 10,
            wake_length: 30.0,
        }
    }
}

/// Half thickness of a symmetric four-digit section with a closed trailing edge
fn half_thickness(xi: f64, thickness: f64) -> f64 {
    5.0 * thickness
        * (0.2969 * xi.sqrt() - 0.1260 * xi - 0.3516 * xi.powi(2) + 0.2843 * xi.powi(3)
            - 0.1036 * xi.powi(4))
}

/// Generate a closed wing made of top, bottom and side panels
///
/// Chordwise stations are cosine spaced; the leading and trailing edge nodes
/// are shared by both surfaces. Top normals point up, bottom normals down and
/// the tip caps outward along ∓y, so the winding of every bottom panel is the
/// mirror of its top panel: bottom panel `k + 2·nx·ny` mirrors top panel `k`.
/// Each bottom trailing panel sheds the wake column of its strip and is
/// paired with the top trailing panel above it.
///
/// # Arguments
/// * `spec` - Wing dimensions and discretisation
///
/// # Returns
/// A validated `PanelMesh` with `4·nx·ny` surface panels, the tip caps and
/// `2·ny·wake_panels` wake panels
pub fn closed_wing(spec: &ClosedWingSpec) -> Result<PanelMesh> {
    if spec.nx < 2 || spec.ny == 0 || spec.wake_panels == 0 {
        return Err(PanelError::InvalidMesh(
            "closed wing needs two chordwise rows, one column and one wake panel".to_string(),
        ));
    }
    if !(spec.chord > 0.0 && spec.span > 0.0 && spec.wake_length > 0.0) {
        return Err(PanelError::InvalidMesh(
            "closed wing dimensions must be positive".to_string(),
        ));
    }
    if !(spec.thickness > 0.0 && spec.thickness < 0.5) {
        return Err(PanelError::InvalidMesh(format!(
            "thickness ratio {} outside (0, 0.5)",
            spec.thickness
        )));
    }

    let (nx, ny, nw) = (spec.nx, spec.ny, spec.wake_panels);
    let dy = spec.span / ny as f64;
    let dw = spec.wake_length / nw as f64;
    let y_at = |j: usize| -0.5 * spec.span + j as f64 * dy;
    let x_at = |i: usize| {
        0.5 * spec.chord * (1.0 - (std::f64::consts::PI * i as f64 / nx as f64).cos())
    };
    let z_at = |i: usize| {
        if i == 0 || i == nx {
            0.0
        } else {
            spec.chord * half_thickness(x_at(i) / spec.chord, spec.thickness)
        }
    };

    // Top grid first, then the bottom interior stations
    let mut nodes = Vec::with_capacity((2 * nx) * (ny + 1) + 2 * nx);
    for i in 0..=nx {
        for j in 0..=ny {
            nodes.push(Vector3::new(x_at(i), y_at(j), z_at(i)));
        }
    }
    for i in 1..nx {
        for j in 0..=ny {
            nodes.push(Vector3::new(x_at(i), y_at(j), -z_at(i)));
        }
    }
    let top = |i: usize, j: usize| i * (ny + 1) + j;
    let bottom = |i: usize, j: usize| {
        if i == 0 || i == nx {
            top(i, j)
        } else {
            (nx + 1) * (ny + 1) + (i - 1) * (ny + 1) + j
        }
    };

    let n_top = 2 * nx * ny;
    let mut panels = Vec::with_capacity(2 * n_top + 8 * nx);
    for i in 0..nx {
        for j in 0..ny {
            let (a, b, c, d) = (top(i, j), top(i, j + 1), top(i + 1, j), top(i + 1, j + 1));
            panels.push(PanelSpec::new([a, c, d], SurfacePosition::Top));
            panels.push(PanelSpec::new([a, d, b], SurfacePosition::Top));
        }
    }
    for i in 0..nx {
        for j in 0..ny {
            let (a, b, c, d) = (
                bottom(i, j),
                bottom(i, j + 1),
                bottom(i + 1, j),
                bottom(i + 1, j + 1),
            );
            // Reversed winding: the trailing edge runs d -> c from left to right
            let mut first = PanelSpec::new([a, d, c], SurfacePosition::Bottom);
            if i == nx - 1 {
                let top_trailing = 2 * ((nx - 1) * ny + j);
                first = first.with_wake(2 * nw * j).with_opposite(top_trailing);
            }
            panels.push(first);
            panels.push(PanelSpec::new([a, b, d], SurfacePosition::Bottom));
        }
    }

    // Tip caps: each section quad is fanned around a centre node on the chord line
    for (j, right_tip) in [(0, false), (ny, true)] {
        for i in 0..nx {
            let m = nodes.len();
            nodes.push(Vector3::new(0.5 * (x_at(i) + x_at(i + 1)), y_at(j), 0.0));
            let ring = [top(i, j), top(i + 1, j), bottom(i + 1, j), bottom(i, j)];
            for n in 0..4 {
                let (p, q) = (ring[n], ring[(n + 1) % 4]);
                if p == q {
                    continue;
                }
                let nodes_of = if right_tip { [p, q, m] } else { [p, m, q] };
                panels.push(PanelSpec::new(nodes_of, SurfacePosition::Side));
            }
        }
    }

    let wake = wake_columns((spec.chord, 0.0), &y_at, ny, nw, dw);

    log::debug!(
        "Closed wing {}x{} m, t/c = {}: {} panels, {} wake panels per column",
        spec.chord,
        spec.span,
        spec.thickness,
        panels.len(),
        2 * nw
    );

    PanelMesh::new(nodes, panels, wake)
}

/// Generate two disjoint coplanar mid-surface panels without wake
///
/// The second panel is a differently shaped triangle whose first vertex sits
/// `separation` metres downstream of the first panel's origin.
pub fn two_panel_mesh(separation: f64) -> Result<PanelMesh> {
    let nodes = vec![
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(1.0, 0.0, 0.0),
        Vector3::new(0.0, 1.0, 0.0),
        Vector3::new(separation, 0.2, 0.0),
        Vector3::new(separation + 0.8, 0.4, 0.0),
        Vector3::new(separation + 0.3, 1.1, 0.0),
    ];
    let panels = vec![
        PanelSpec::new([0, 1, 2], SurfacePosition::Mid),
        PanelSpec::new([3, 4, 5], SurfacePosition::Mid),
    ];
    PanelMesh::new(nodes, panels, Vec::new())
}
