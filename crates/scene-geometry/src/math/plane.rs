//! Plane representation and ray/plane intersection.

use nalgebra::{Point3, Vector3, Vector4};

use super::EPSILON;

/// A plane in 3D space, represented as `normal · point = offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane3D {
    normal: Vector3<f64>,
    offset: f64,
}

impl Plane3D {
    /// Creates a plane from a point on the plane and a normal vector.
    ///
    /// Returns `None` if the normal has zero length.
    pub fn from_point_and_normal(point: Point3<f64>, normal: Vector3<f64>) -> Option<Self> {
        let norm = normal.norm();
        if norm < EPSILON {
            return None;
        }
        let unit_normal = normal / norm;
        Some(Self {
            normal: unit_normal,
            offset: unit_normal.dot(&point.coords),
        })
    }

    /// Creates a plane from three points.
    /// The normal direction follows the right-hand rule: (b - a) × (c - a).
    ///
    /// Returns `None` if the points are collinear (or nearly so).
    pub fn from_three_points(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Option<Self> {
        Self::from_point_and_normal(a, (b - a).cross(&(c - a)))
    }

    /// Homogeneous coefficients `(n, -offset)`.
    #[inline]
    pub fn to_homogeneous(&self) -> Vector4<f64> {
        Vector4::new(self.normal.x, self.normal.y, self.normal.z, -self.offset)
    }

    /// Intersects the line through two homogeneous points with the plane.
    ///
    /// Either point may lie at infinity. Returns `None` when the line is
    /// parallel to the plane or lies in it.
    pub fn intersect_line(&self, from: &Vector4<f64>, to: &Vector4<f64>) -> Option<Vector4<f64>> {
        let plane = self.to_homogeneous();
        let a = plane.dot(from);
        let b = plane.dot(to);
        let point = from * b - to * a;
        if point.w.abs() < EPSILON {
            return None;
        }
        Some(point / point.w)
    }
}
