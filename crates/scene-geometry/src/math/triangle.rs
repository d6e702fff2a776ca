//! Triangle representation and barycentric coordinates.

use nalgebra::{Point3, Vector3};

use super::{Plane3D, BARYCENTRIC_TOLERANCE, EPSILON};

/// A triangle in 3D space, defined by three vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    vertices: [Point3<f64>; 3],
}

impl Triangle {
    /// Creates a new triangle from three points.
    ///
    /// The winding order determines the normal direction via the right-hand rule:
    /// normal = (b - a) × (c - a)
    pub fn new(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    /// Returns the three vertices of the triangle.
    #[inline]
    pub fn vertices(&self) -> &[Point3<f64>; 3] {
        &self.vertices
    }

    /// Computes the (unnormalized) normal vector of the triangle.
    pub fn normal(&self) -> Vector3<f64> {
        let [a, b, c] = &self.vertices;
        (b - a).cross(&(c - a))
    }

    /// Computes the unit normal vector of the triangle.
    ///
    /// Returns `None` if the triangle is degenerate (zero area).
    pub fn unit_normal(&self) -> Option<Vector3<f64>> {
        let n = self.normal();
        let len = n.norm();
        if len > EPSILON { Some(n / len) } else { None }
    }

    pub fn area(&self) -> f64 {
        self.normal().norm() * 0.5
    }

    /// Returns the plane that this triangle lies on, `None` if degenerate.
    pub fn plane(&self) -> Option<Plane3D> {
        let [a, b, c] = &self.vertices;
        Plane3D::from_three_points(*a, *b, *c)
    }

    /// Computes the centroid (center of mass) of the triangle.
    pub fn centroid(&self) -> Point3<f64> {
        let [a, b, c] = &self.vertices;
        Point3::from((a.coords + b.coords + c.coords) / 3.0)
    }

    /// Barycentric coordinates of a point assumed to lie in the triangle's plane.
    ///
    /// Solves the 2x2 system in the coordinate-pair projection with the
    /// largest determinant. Returns `None` if all three projections are
    /// singular.
    pub fn barycentric(&self, point: &Point3<f64>) -> Option<Vector3<f64>> {
        let [a, b, c] = &self.vertices;
        let e1 = b - a;
        let e2 = c - a;
        let d = point - a;

        let (i, j, det) = [(0, 1), (0, 2), (1, 2)]
            .into_iter()
            .map(|(i, j)| (i, j, e1[i] * e2[j] - e1[j] * e2[i]))
            .max_by(|x, y| x.2.abs().total_cmp(&y.2.abs()))?;

        let scale = e1.norm_squared().max(e2.norm_squared());
        if det.abs() <= EPSILON * scale.max(EPSILON) {
            return None;
        }

        let s = (d[i] * e2[j] - d[j] * e2[i]) / det;
        let t = (e1[i] * d[j] - e1[j] * d[i]) / det;
        Some(Vector3::new(1.0 - s - t, s, t))
    }

    /// Whether barycentric coordinates describe a point inside the triangle.
    pub fn is_inside(barycentric: &Vector3<f64>) -> bool {
        let sum = barycentric.sum();
        barycentric.iter().all(|&w| (0.0..=1.0).contains(&w))
            && (sum - 1.0) * (sum - 1.0) < BARYCENTRIC_TOLERANCE
    }

    /// Strict containment of a coplanar point, tested edge by edge against `normal`.
    pub fn contains_strictly(&self, point: &Point3<f64>, normal: &Vector3<f64>) -> bool {
        let [a, b, c] = &self.vertices;
        [(a, b), (b, c), (c, a)]
            .iter()
            .all(|(p, q)| (*q - *p).cross(&(point - *p)).dot(normal) > EPSILON)
    }
}
