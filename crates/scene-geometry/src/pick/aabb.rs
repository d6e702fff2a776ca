//! Axis-aligned boxes for the pick tree.

use nalgebra::{Point3, Vector3};

use super::TreePolygon;

/// A box stored as center and half extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    center: Point3<f64>,
    extent: Vector3<f64>,
}

impl Aabb {
    pub fn new(center: Point3<f64>, extent: Vector3<f64>) -> Self {
        Self { center, extent }
    }

    /// Bound of every vertex of `polygons`.
    pub fn from_polygons(polygons: &[TreePolygon]) -> Self {
        let mut points = polygons.iter().flat_map(|p| p.vertices().iter());
        let Some(first) = points.next() else {
            return Self::new(Point3::origin(), Vector3::zeros());
        };
        let (min, max) = points.fold((*first, *first), |(min, max), p| (min.inf(p), max.sup(p)));
        Self {
            center: nalgebra::center(&min, &max),
            extent: (max - min) * 0.5,
        }
    }

    #[inline]
    pub fn center(&self) -> Point3<f64> {
        self.center
    }

    #[inline]
    pub fn extent(&self) -> Vector3<f64> {
        self.extent
    }

    /// Axis with the largest extent. Ties go to the lower axis.
    pub fn longest_axis(&self) -> usize {
        let e = self.extent;
        if e.x >= e.y && e.x >= e.z {
            0
        } else if e.y >= e.z {
            1
        } else {
            2
        }
    }

    /// Separating axis test of the ray `origin + t * direction, t >= 0`.
    ///
    /// Tests the three box axes, then the three cross products of the
    /// direction with the box axes.
    pub fn intersects_ray(&self, origin: &Point3<f64>, direction: &Vector3<f64>) -> bool {
        let diff = origin - self.center;
        let e = &self.extent;
        for i in 0..3 {
            if diff[i].abs() > e[i] && diff[i] * direction[i] >= 0.0 {
                return false;
            }
        }
        let w = direction.abs();
        let f = direction.y * diff.z - direction.z * diff.y;
        if f.abs() > e.y * w.z + e.z * w.y {
            return false;
        }
        let f = direction.z * diff.x - direction.x * diff.z;
        if f.abs() > e.x * w.z + e.z * w.x {
            return false;
        }
        let f = direction.x * diff.y - direction.y * diff.x;
        if f.abs() > e.x * w.y + e.y * w.x {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_unit_box() -> Aabb {
        Aabb::new(Point3::origin(), Vector3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn bound_of_polygons() {
        let polygons = vec![
            TreePolygon::new(vec![Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 0.0, 0.0), Point3::new(0.0, 2.0, 0.0)], 0),
            TreePolygon::new(vec![Point3::new(0.0, 0.0, 1.0), Point3::new(1.0, 0.0, 1.0), Point3::new(0.0, 1.0, 1.0)], 1),
        ];
        let aabb = Aabb::from_polygons(&polygons);
        assert_eq!(aabb.center(), Point3::new(2.0, 1.0, 0.5));
        assert_eq!(aabb.extent(), Vector3::new(2.0, 1.0, 0.5));
        assert_eq!(aabb.longest_axis(), 0);
    }

    #[test]
    fn ray_toward_box_hits() {
        let aabb = make_unit_box();
        assert!(aabb.intersects_ray(&Point3::new(0.0, 0.0, 5.0), &Vector3::new(0.0, 0.0, -1.0)));
        assert!(aabb.intersects_ray(&Point3::new(5.0, 5.0, 5.0), &Vector3::new(-1.0, -1.0, -1.0)));
    }

    #[test]
    fn ray_away_from_box_misses() {
        let aabb = make_unit_box();
        assert!(!aabb.intersects_ray(&Point3::new(0.0, 0.0, 5.0), &Vector3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn ray_passing_beside_box_misses() {
        let aabb = make_unit_box();
        assert!(!aabb.intersects_ray(&Point3::new(3.0, 0.0, 5.0), &Vector3::new(0.0, 0.0, -1.0)));
        assert!(!aabb.intersects_ray(&Point3::new(0.0, 3.0, 5.0), &Vector3::new(1.0, 0.0, -1.0)));
    }

    #[test]
    fn origin_inside_box_hits() {
        assert!(make_unit_box().intersects_ray(&Point3::new(0.5, 0.5, 0.5), &Vector3::new(1.0, 0.0, 0.0)));
    }
}
