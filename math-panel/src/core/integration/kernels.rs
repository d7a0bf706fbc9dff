//! Singularity kernels of flat triangular panels
//!
//! Closed-form potentials and velocities induced at a field point by source and
//! doublet distributions on a triangle. The unit source potential is `-1/r` and
//! the unit doublet potential is `-(x - y).n / |x - y|^3`; there is no 1/4pi
//! factor anywhere in the solver.
//!
//! A linearly varying doublet sheet is equivalent to vortex filaments along the
//! edges (carrying the edge strength) plus a uniform surface vortex sheet
//! `-n x grad(mu)`. Near-singular expressions are regularised with a core
//! radius, and points further than `far_field_factor` panel sizes away use the
//! point-singularity approximations.

use crate::core::mesh::Triangle;
use crate::core::types::Vector3;
use std::f64::consts::PI;

/// 4 pi
pub const FOUR_PI: f64 = 4.0 * PI;

/// Relative distance under which a point is treated as lying in the panel plane
const PLANE_TOLERANCE: f64 = 1e-10;

/// Relative squared distance under which a point is treated as lying on an edge line
const LINE_TOLERANCE: f64 = 1e-18;

/// Kernel evaluation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelParams {
    /// Regularisation radius of the edge singularities
    pub core_radius: f64,
    /// Distance, in panel sizes, beyond which point approximations are used
    pub far_field_factor: f64,
}

impl Default for KernelParams {
    fn default() -> Self {
        Self {
            core_radius: 1e-6,
            far_field_factor: 10.0,
        }
    }
}

/// Limit taken for field points lying on the panel itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    /// Limit from the normal side
    Exterior,
    /// Limit from the side opposite to the normal
    Interior,
}

/// Potential and velocity of a unit source panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceField {
    /// Potential
    pub potential: f64,
    /// Velocity
    pub velocity: Vector3,
}

/// Intermediate quantities shared by the source and linear doublet kernels
struct PlaneTerms {
    /// Signed height above the panel plane
    z: f64,
    /// Projection of the field point on the plane
    x0: Vector3,
    /// Signed solid angle
    omega: f64,
    /// Sum of h_i I_i over the edges
    sum_h_log: f64,
    /// In-plane part of the source velocity
    v_plane: Vector3,
}

#[inline]
fn is_far(tri: &Triangle, point: Vector3, params: &KernelParams) -> bool {
    (point - tri.centroid).norm() > params.far_field_factor * tri.max_size
}

/// Signed solid angle subtended by the panel, positive on the normal side
pub fn solid_angle(tri: &Triangle, point: Vector3, side: PlaneSide) -> f64 {
    let z = (point - tri.centroid).dot(&tri.normal);
    if z.abs() < PLANE_TOLERANCE * tri.max_size {
        if !tri.contains_projection(point) {
            return 0.0;
        }
        return match side {
            PlaneSide::Exterior => 2.0 * PI,
            PlaneSide::Interior => -2.0 * PI,
        };
    }

    let a = tri.vertices[0] - point;
    let b = tri.vertices[1] - point;
    let c = tri.vertices[2] - point;
    let (la, lb, lc) = (a.norm(), b.norm(), c.norm());

    let numerator = a.dot(&b.cross(&c));
    let denominator = la * lb * lc + a.dot(&b) * lc + a.dot(&c) * lb + b.dot(&c) * la;
    -2.0 * numerator.atan2(denominator)
}

fn plane_terms(tri: &Triangle, point: Vector3, core_radius: f64, side: PlaneSide) -> PlaneTerms {
    let n = tri.normal;
    let z = (point - tri.centroid).dot(&n);
    let x0 = point - n * z;
    let eps2 = core_radius * core_radius;

    let mut sum_h_log = 0.0;
    let mut v_plane = Vector3::zero();
    for i in 0..3 {
        let pa = tri.vertices[i];
        let pb = tri.vertices[(i + 1) % 3];
        let s = pb - pa;
        let len = s.norm();
        if len <= 0.0 {
            continue;
        }
        let nu = s.cross(&n) / len;
        let ra = ((point - pa).norm_squared() + eps2).sqrt();
        let rb = ((point - pb).norm_squared() + eps2).sqrt();
        let denominator = (ra + rb - len).max(1e-15 * len);
        let log_term = ((ra + rb + len) / denominator).ln();

        sum_h_log += (pa - x0).dot(&nu) * log_term;
        v_plane += nu * log_term;
    }

    PlaneTerms {
        z,
        x0,
        omega: solid_angle(tri, point, side),
        sum_h_log,
        v_plane,
    }
}

/// Integrals of `1/q^{3/2}` and `t/q^{3/2}` along an edge, `q = |a - t s|^2 + eps^2`
#[inline]
fn edge_integrals(s: Vector3, a: Vector3, eps2: f64) -> Option<(f64, f64)> {
    let c = s.norm_squared();
    let p = a.dot(&s);
    let g = a.norm_squared() + eps2;
    let q0 = g;
    let q1 = c - 2.0 * p + g;
    let d = 4.0 * (c * g - p * p);
    if d <= 4.0 * LINE_TOLERANCE * c * c || q0 <= 0.0 || q1 <= 0.0 {
        return None;
    }
    let (sq0, sq1) = (q0.sqrt(), q1.sqrt());
    let j0 = 4.0 * ((c - p) / sq1 + p / sq0) / d;
    let j1 = 4.0 * (g / sq0 - (g - p) / sq1) / d;
    Some((j0, j1))
}

/// Potential and velocity of a unit-strength source panel
pub fn source_field(
    tri: &Triangle,
    point: Vector3,
    params: &KernelParams,
    side: PlaneSide,
) -> SourceField {
    if is_far(tri, point, params) {
        let d = point - tri.centroid;
        let r = d.norm();
        return SourceField {
            potential: -tri.area / r,
            velocity: d * (tri.area / (r * r * r)),
        };
    }

    let terms = plane_terms(tri, point, params.core_radius, side);
    SourceField {
        potential: -(terms.sum_h_log - terms.z * terms.omega),
        velocity: terms.v_plane + tri.normal * terms.omega,
    }
}

/// Velocities induced by the three linear basis doublet distributions
pub fn linear_doublet_velocities(
    tri: &Triangle,
    point: Vector3,
    params: &KernelParams,
) -> [Vector3; 3] {
    if is_far(tri, point, params) {
        let v = point_doublet_velocity(tri, point) * (tri.area / 3.0);
        return [v; 3];
    }

    let eps2 = params.core_radius * params.core_radius;
    let mut velocities = [Vector3::zero(); 3];

    // Edge vortex filaments with linearly varying strength
    for i in 0..3 {
        let pa = tri.vertices[i];
        let pb = tri.vertices[(i + 1) % 3];
        let s = pb - pa;
        let a = point - pa;
        if let Some((j0, j1)) = edge_integrals(s, a, eps2) {
            let sxa = s.cross(&a);
            velocities[i] += sxa * (j0 - j1);
            velocities[(i + 1) % 3] += sxa * j1;
        }
    }

    // Uniform surface vortex sheet
    let terms = plane_terms(tri, point, params.core_radius, PlaneSide::Exterior);
    let v_src = terms.v_plane + tri.normal * terms.omega;
    let two_area = 2.0 * tri.area;
    for (n, velocity) in velocities.iter_mut().enumerate() {
        *velocity += (tri.opposite_edge(n) / two_area).cross(&v_src);
    }

    velocities
}

/// Potentials induced by the three linear basis doublet distributions
pub fn linear_doublet_potentials(
    tri: &Triangle,
    point: Vector3,
    params: &KernelParams,
    side: PlaneSide,
) -> [f64; 3] {
    if is_far(tri, point, params) {
        let phi = point_doublet_potential(tri, point) * (tri.area / 3.0);
        return [phi; 3];
    }

    let terms = plane_terms(tri, point, params.core_radius, side);
    let mut potentials = [0.0; 3];
    for (n, phi) in potentials.iter_mut().enumerate() {
        let b = tri.basis_value(n, terms.x0);
        *phi = -b * terms.omega + terms.z * tri.basis_gradient(n).dot(&terms.v_plane);
    }
    potentials
}

/// Velocity induced by a uniform unit doublet panel (vortex ring)
pub fn uniform_doublet_velocity(tri: &Triangle, point: Vector3, params: &KernelParams) -> Vector3 {
    if is_far(tri, point, params) {
        return point_doublet_velocity(tri, point) * tri.area;
    }

    let eps2 = params.core_radius * params.core_radius;
    let mut velocity = Vector3::zero();
    for i in 0..3 {
        let pa = tri.vertices[i];
        let s = tri.vertices[(i + 1) % 3] - pa;
        let a = point - pa;
        if let Some((j0, _)) = edge_integrals(s, a, eps2) {
            velocity += s.cross(&a) * j0;
        }
    }
    velocity
}

/// Potential induced by a uniform unit doublet panel
pub fn uniform_doublet_potential(
    tri: &Triangle,
    point: Vector3,
    params: &KernelParams,
    side: PlaneSide,
) -> f64 {
    if is_far(tri, point, params) {
        return point_doublet_potential(tri, point) * tri.area;
    }
    -solid_angle(tri, point, side)
}

/// Velocity of a straight vortex segment of unit circulation, times 4 pi
pub fn vortex_segment_velocity(start: Vector3, end: Vector3, point: Vector3, core: f64) -> Vector3 {
    let s = end - start;
    let a = point - start;
    match edge_integrals(s, a, core * core) {
        Some((j0, _)) => s.cross(&a) * j0,
        None => Vector3::zero(),
    }
}

#[inline]
fn point_doublet_velocity(tri: &Triangle, point: Vector3) -> Vector3 {
    let d = point - tri.centroid;
    let r2 = d.norm_squared();
    let r = r2.sqrt();
    let r3 = r2 * r;
    let h = d.dot(&tri.normal);
    tri.normal * (-1.0 / r3) + d * (3.0 * h / (r3 * r2))
}

#[inline]
fn point_doublet_potential(tri: &Triangle, point: Vector3) -> f64 {
    let d = point - tri.centroid;
    let r = d.norm();
    -d.dot(&tri.normal) / (r * r * r)
}
