//! Core type definitions for the panel solver
//!
//! Vector algebra and the small enums that classify panels and wake panels.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

// ============================================================================
// Vector algebra
// ============================================================================

/// 3D vector (positions, velocities, forces)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vector3 {
    /// X component (downstream)
    pub x: f64,
    /// Y component (starboard)
    pub y: f64,
    /// Z component (up)
    pub z: f64,
}

impl Vector3 {
    /// Create a new vector
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Unit vector along x
    pub const fn unit_x() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    /// Unit vector along y
    pub const fn unit_y() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    /// Unit vector along z
    pub const fn unit_z() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    /// Dot product
    #[inline]
    pub fn dot(&self, other: &Vector3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    #[inline]
    pub fn cross(&self, other: &Vector3) -> Vector3 {
        Vector3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Squared Euclidean norm
    #[inline]
    pub fn norm_squared(&self) -> f64 {
        self.dot(self)
    }

    /// Euclidean norm
    #[inline]
    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Distance to another point
    #[inline]
    pub fn distance_to(&self, other: &Vector3) -> f64 {
        (*self - *other).norm()
    }

    /// Unit vector in the same direction, `None` for a (near) zero vector
    pub fn normalized(&self) -> Option<Vector3> {
        let len = self.norm();
        if len > 1e-15 { Some(*self / len) } else { None }
    }

    /// Mirror image through the plane `z = -height`
    pub fn mirrored_z(&self, height: f64) -> Vector3 {
        Vector3::new(self.x, self.y, -self.z - 2.0 * height)
    }

    /// Components as an array
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// True when no component is NaN or infinite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vector3 {
    type Output = Vector3;
    #[inline]
    fn add(self, other: Vector3) -> Vector3 {
        Vector3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vector3 {
    type Output = Vector3;
    #[inline]
    fn sub(self, other: Vector3) -> Vector3 {
        Vector3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Vector3;
    #[inline]
    fn mul(self, s: f64) -> Vector3 {
        Vector3::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Mul<Vector3> for f64 {
    type Output = Vector3;
    #[inline]
    fn mul(self, v: Vector3) -> Vector3 {
        v * self
    }
}

impl Div<f64> for Vector3 {
    type Output = Vector3;
    #[inline]
    fn div(self, s: f64) -> Vector3 {
        Vector3::new(self.x / s, self.y / s, self.z / s)
    }
}

impl Neg for Vector3 {
    type Output = Vector3;
    #[inline]
    fn neg(self) -> Vector3 {
        Vector3::new(-self.x, -self.y, -self.z)
    }
}

impl AddAssign for Vector3 {
    #[inline]
    fn add_assign(&mut self, other: Vector3) {
        self.x += other.x;
        self.y += other.y;
        self.z += other.z;
    }
}

impl SubAssign for Vector3 {
    #[inline]
    fn sub_assign(&mut self, other: Vector3) {
        self.x -= other.x;
        self.y -= other.y;
        self.z -= other.z;
    }
}

impl MulAssign<f64> for Vector3 {
    #[inline]
    fn mul_assign(&mut self, s: f64) {
        self.x *= s;
        self.y *= s;
        self.z *= s;
    }
}

impl std::iter::Sum for Vector3 {
    fn sum<I: Iterator<Item = Vector3>>(iter: I) -> Vector3 {
        iter.fold(Vector3::zero(), |acc, v| acc + v)
    }
}

// ============================================================================
// Panel classification
// ============================================================================

/// Position of a panel on the body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfacePosition {
    /// Upper surface of a thick body
    Top,
    /// Lower surface of a thick body
    Bottom,
    /// Thin (mid-surface) lifting sheet
    Mid,
    /// Closing side or tip patch of a thick body
    Side,
}

impl SurfacePosition {
    /// Thin-surface panel
    pub fn is_mid(self) -> bool {
        self == SurfacePosition::Mid
    }
}

/// Side of a wake column a wake panel belongs to
///
/// A wake column is shed from one trailing edge segment and is made of
/// alternating left and right triangles. The side decides which trailing
/// strength each wake vertex carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WakeSide {
    /// Vertices 0 and 2 carry the left strength, vertex 1 the right one
    Left,
    /// Vertices 0 and 1 carry the right strength, vertex 2 the left one
    Right,
}

impl WakeSide {
    /// For each vertex, `true` when it carries the left trailing strength
    pub fn left_vertices(self) -> [bool; 3] {
        match self {
            WakeSide::Left => [true, false, true],
            WakeSide::Right => [false, false, true],
        }
    }
}
