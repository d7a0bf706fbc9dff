//! Triangular panel geometry
//!
//! [`Triangle`] holds the geometric quantities every kernel needs; [`Panel`]
//! and [`WakePanel`] add the topology the assembler follows.

use crate::core::types::{SurfacePosition, Vector3, WakeSide};
use serde::{Deserialize, Serialize};

/// Planar triangle with precomputed geometric data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    /// Vertices S0, S1, S2 (counter-clockwise seen from the normal side)
    pub vertices: [Vector3; 3],
    /// Centroid
    pub centroid: Vector3,
    /// Unit normal `(S1 - S0) x (S2 - S0)` normalised
    pub normal: Vector3,
    /// First in-plane axis, along S0 -> S1
    pub l: Vector3,
    /// Second in-plane axis, `normal x l`
    pub m: Vector3,
    /// Area
    pub area: f64,
    /// Longest edge
    pub max_size: f64,
}

impl Triangle {
    /// Build the geometry from three vertices
    ///
    /// Degenerate triangles get a zero normal and zero area; callers check
    /// [`Triangle::is_degenerate`].
    pub fn new(s0: Vector3, s1: Vector3, s2: Vector3) -> Self {
        let cross = (s1 - s0).cross(&(s2 - s0));
        let area = 0.5 * cross.norm();
        let normal = cross.normalized().unwrap_or_default();
        let l = (s1 - s0).normalized().unwrap_or_default();
        let m = normal.cross(&l);
        let max_size = (s1 - s0)
            .norm()
            .max((s2 - s1).norm())
            .max((s0 - s2).norm());

        Self {
            vertices: [s0, s1, s2],
            centroid: (s0 + s1 + s2) / 3.0,
            normal,
            l,
            m,
            area,
            max_size,
        }
    }

    /// True when the area is negligible compared to the edge lengths
    pub fn is_degenerate(&self) -> bool {
        self.area <= 1e-12 * self.max_size * self.max_size || self.max_size == 0.0
    }

    /// Image through the plane `z = -height`, winding reversed
    ///
    /// Vertex `n` of the image corresponds to vertex `MIRROR_VERTEX_MAP[n]`
    /// of the original panel.
    pub fn mirrored(&self, height: f64) -> Triangle {
        let [s0, s1, s2] = self.vertices;
        Triangle::new(
            s0.mirrored_z(height),
            s2.mirrored_z(height),
            s1.mirrored_z(height),
        )
    }

    /// Physical point at reference coordinates (xi, eta)
    #[inline]
    pub fn point_at(&self, xi: f64, eta: f64) -> Vector3 {
        let [s0, s1, s2] = self.vertices;
        s0 + (s1 - s0) * xi + (s2 - s0) * eta
    }

    /// Edge vector opposite vertex `n`, oriented counter-clockwise
    #[inline]
    pub fn opposite_edge(&self, n: usize) -> Vector3 {
        self.vertices[(n + 2) % 3] - self.vertices[(n + 1) % 3]
    }

    /// Gradient of the linear basis function of vertex `n`
    #[inline]
    pub fn basis_gradient(&self, n: usize) -> Vector3 {
        self.normal.cross(&self.opposite_edge(n)) / (2.0 * self.area)
    }

    /// Value of the linear basis function of vertex `n` at an in-plane point
    pub fn basis_value(&self, n: usize, point: Vector3) -> f64 {
        1.0 + self.basis_gradient(n).dot(&(point - self.vertices[n]))
    }

    /// Projection of a point onto the panel plane
    #[inline]
    pub fn project(&self, point: Vector3) -> Vector3 {
        point - self.normal * (point - self.centroid).dot(&self.normal)
    }

    /// Barycentric inclusion test for an in-plane point
    pub fn contains_projection(&self, point: Vector3) -> bool {
        let tol = -1e-10;
        (0..3).all(|n| {
            let a = self.vertices[(n + 1) % 3];
            let b = self.vertices[(n + 2) % 3];
            let side = (b - a).cross(&(point - a)).dot(&self.normal);
            side >= tol * self.max_size * self.max_size
        })
    }
}

/// Vertex of the original panel matching each vertex of its mirror image
pub const MIRROR_VERTEX_MAP: [usize; 3] = [0, 2, 1];

/// Body panel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Panel {
    /// Index in the mesh
    pub index: usize,
    /// Geometry
    pub geom: Triangle,
    /// Mesh node index of each vertex
    pub nodes: [usize; 3],
    /// Surface classification
    pub position: SurfacePosition,
    /// Sheds a wake column from the trailing edge S1-S2
    pub trailing: bool,
    /// First wake panel of the column shed by this panel
    pub wake: Option<usize>,
    /// Paired top trailing panel, for bottom trailing panels
    pub opposite: Option<usize>,
    /// Panels sharing an edge
    pub neighbours: Vec<usize>,
}

impl Panel {
    /// Thin-surface panel
    pub fn is_mid(&self) -> bool {
        self.position.is_mid()
    }

    /// Vertex indices of the left and right trailing nodes
    ///
    /// Outward normals reverse the vertex order of bottom panels, so their
    /// trailing edge runs S2 -> S1 from left to right.
    pub fn trailing_vertices(&self) -> (usize, usize) {
        match self.position {
            SurfacePosition::Bottom => (2, 1),
            _ => (1, 2),
        }
    }

    /// Trailing vortex vector, from the left to the right trailing vertex
    pub fn trailing_vortex(&self) -> Vector3 {
        let (left, right) = self.trailing_vertices();
        self.geom.vertices[right] - self.geom.vertices[left]
    }
}

/// Wake panel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WakePanel {
    /// Index in the wake panel list
    pub index: usize,
    /// Geometry
    pub geom: Triangle,
    /// Column side
    pub side: WakeSide,
    /// Next panel downstream; `None` ends the column
    pub next: Option<usize>,
}

impl WakePanel {
    /// Downstream end of the column edge carrying the left strength
    pub fn downstream_left(&self) -> Vector3 {
        match self.side {
            WakeSide::Left => self.geom.vertices[0],
            WakeSide::Right => self.geom.vertices[2],
        }
    }

    /// Downstream end of the column edge carrying the right strength
    pub fn downstream_right(&self) -> Vector3 {
        match self.side {
            WakeSide::Left => self.geom.vertices[1],
            WakeSide::Right => self.geom.vertices[0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_triangle() -> Triangle {
        Triangle::new(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn test_triangle_geometry() {
        let t = unit_triangle();
        assert_relative_eq!(t.area, 0.5);
        assert_eq!(t.normal, Vector3::unit_z());
        assert_relative_eq!(t.max_size, 2.0_f64.sqrt());
        assert_relative_eq!(t.centroid.x, 1.0 / 3.0);
        assert_eq!(t.m, Vector3::unit_y());
        assert!(!t.is_degenerate());
    }

    #[test]
    fn test_degenerate_triangle() {
        let t = Triangle::new(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
        );
        assert!(t.is_degenerate());
    }

    #[test]
    fn test_basis_gradients_partition_unity() {
        let t = Triangle::new(
            Vector3::new(0.1, 0.2, 0.0),
            Vector3::new(1.3, -0.1, 0.2),
            Vector3::new(0.4, 0.9, -0.1),
        );
        let sum = t.basis_gradient(0) + t.basis_gradient(1) + t.basis_gradient(2);
        assert_relative_eq!(sum.norm(), 0.0, epsilon = 1e-12);

        // b_n is one at its own vertex and zero at the others
        for n in 0..3 {
            for (k, &v) in t.vertices.iter().enumerate() {
                let expected = if k == n { 1.0 } else { 0.0 };
                assert_relative_eq!(t.basis_value(n, v), expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_mirror_keeps_orientation_consistent() {
        let t = Triangle::new(
            Vector3::new(0.0, 0.0, 0.5),
            Vector3::new(1.0, 0.0, 0.6),
            Vector3::new(0.0, 1.0, 0.5),
        );
        let m = t.mirrored(0.0);
        // The image normal is the reflected normal
        assert_relative_eq!(m.normal.x, t.normal.x, epsilon = 1e-12);
        assert_relative_eq!(m.normal.y, t.normal.y, epsilon = 1e-12);
        assert_relative_eq!(m.normal.z, -t.normal.z, epsilon = 1e-12);
        for (n, &k) in MIRROR_VERTEX_MAP.iter().enumerate() {
            assert_relative_eq!(m.vertices[n].z, -t.vertices[k].z);
        }
    }

    #[test]
    fn test_contains_projection() {
        let t = unit_triangle();
        assert!(t.contains_projection(Vector3::new(0.2, 0.2, 0.0)));
        assert!(!t.contains_projection(Vector3::new(0.8, 0.8, 0.0)));
    }
}
