//! Closed-form ray intersection against faces, segments, points and the
//! built-in primitives. All inputs are in object coordinates.

use nalgebra::{Point3, Vector3, Vector4};

use super::{PickType, TreePolygon};
use crate::math::{ray_direction, to_homogeneous, to_point3, Triangle, EPSILON};

/// An intersection in object coordinates, before it is placed in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectHit {
    pub point: Vector4<f64>,
    pub barycentric: Option<Vector3<f64>>,
    pub pick_type: PickType,
    /// Face, edge or vertex index.
    pub index: usize,
    /// Fan triangle within a face, segment within a polyline.
    pub secondary_index: usize,
}

/// A ray given by two homogeneous points; `to` may be a direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub from: Vector4<f64>,
    pub to: Vector4<f64>,
}

impl Ray {
    pub fn new(from: Vector4<f64>, to: Vector4<f64>) -> Self {
        Self { from, to }
    }

    pub fn origin(&self) -> Point3<f64> {
        to_point3(&self.from)
    }

    pub fn direction(&self) -> Vector3<f64> {
        ray_direction(&self.from, &self.to)
    }

    pub fn at(&self, t: f64) -> Point3<f64> {
        self.origin() + self.direction() * t
    }
}

/// Intersects every fan triangle of `polygon`.
pub fn intersect_polygon(polygon: &TreePolygon, ray: &Ray, hits: &mut Vec<ObjectHit>) {
    for (k, triangle) in polygon.fan() {
        let Some(plane) = triangle.plane() else {
            log::trace!("face {} triangle {k} is degenerate", polygon.face());
            continue;
        };
        let Some(point) = plane.intersect_line(&ray.from, &ray.to) else {
            continue;
        };
        let Some(barycentric) = triangle.barycentric(&to_point3(&point)) else {
            continue;
        };
        if Triangle::is_inside(&barycentric) {
            hits.push(ObjectHit {
                point,
                barycentric: Some(barycentric),
                pick_type: PickType::Face,
                index: polygon.face(),
                secondary_index: k,
            });
        }
    }
}

/// Brute-force face picking.
pub fn intersect_polygons(polygons: &[TreePolygon], ray: &Ray, hits: &mut Vec<ObjectHit>) {
    for polygon in polygons {
        intersect_polygon(polygon, ray, hits);
    }
}

/// Parameters `t` where the ray meets the sphere.
pub fn ray_sphere(ray: &Ray, center: &Point3<f64>, radius: f64) -> Vec<f64> {
    let d = ray.direction();
    let w = ray.origin() - center;
    solve_quadratic(d.norm_squared(), 2.0 * w.dot(&d), w.norm_squared() - radius * radius)
}

/// Parameters `t` where the ray meets the finite cylinder around `a -> b`.
///
/// Works in the plane perpendicular to the axis: `|axis x (w + t d)| = r`.
/// Roots whose axial coordinate leaves the segment are dropped.
pub fn ray_cylinder(ray: &Ray, a: &Point3<f64>, b: &Point3<f64>, radius: f64) -> Vec<f64> {
    let axis = b - a;
    let length = axis.norm();
    if length < EPSILON {
        return Vec::new();
    }
    let axis = axis / length;
    let d = ray.direction();
    let w = ray.origin() - a;
    let dc = axis.cross(&d);
    let wc = axis.cross(&w);
    if dc.norm_squared() < EPSILON * EPSILON {
        return Vec::new();
    }
    solve_quadratic(dc.norm_squared(), 2.0 * wc.dot(&dc), wc.norm_squared() - radius * radius)
        .into_iter()
        .filter(|&t| {
            let along = (ray.at(t) - a).dot(&axis);
            (0.0..=length).contains(&along)
        })
        .collect()
}

fn solve_quadratic(a: f64, b: f64, c: f64) -> Vec<f64> {
    if a.abs() < EPSILON {
        return Vec::new();
    }
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return Vec::new();
    }
    let root = discriminant.sqrt();
    let t0 = (-b - root) / (2.0 * a);
    let t1 = (-b + root) / (2.0 * a);
    if root == 0.0 { vec![t0] } else { vec![t0, t1] }
}

/// Brute-force polyline picking with tubes of the given radius.
pub fn intersect_edges(
    vertices: &[Vec<f64>],
    edges: &[Vec<i32>],
    radius: f64,
    ray: &Ray,
    hits: &mut Vec<ObjectHit>,
) {
    let points: Vec<Point3<f64>> = vertices.iter().map(|r| to_point3(&to_homogeneous(r))).collect();
    let vertex = |i: i32| usize::try_from(i).ok().and_then(|i| points.get(i));
    for (edge, line) in edges.iter().enumerate() {
        for (segment, pair) in line.windows(2).enumerate() {
            let (Some(a), Some(b)) = (vertex(pair[0]), vertex(pair[1])) else {
                log::warn!("edge {edge} references a missing vertex");
                break;
            };
            for t in ray_cylinder(ray, a, b, radius) {
                hits.push(ObjectHit {
                    point: ray.at(t).to_homogeneous(),
                    barycentric: None,
                    pick_type: PickType::Line,
                    index: edge,
                    secondary_index: segment,
                });
            }
        }
    }
}

/// Brute-force vertex picking with spheres of `radius`, scaled per vertex
/// by `relative_radii` when present.
pub fn intersect_points(
    vertices: &[Vec<f64>],
    relative_radii: Option<&[f64]>,
    radius: f64,
    ray: &Ray,
    hits: &mut Vec<ObjectHit>,
) {
    for (index, row) in vertices.iter().enumerate() {
        let center = to_point3(&to_homogeneous(row));
        let r = radius * relative_radii.and_then(|radii| radii.get(index)).copied().unwrap_or(1.0);
        for t in ray_sphere(ray, &center, r) {
            hits.push(ObjectHit {
                point: ray.at(t).to_homogeneous(),
                barycentric: None,
                pick_type: PickType::Point,
                index,
                secondary_index: 0,
            });
        }
    }
}

/// The unit sphere primitive.
pub fn intersect_unit_sphere(ray: &Ray, hits: &mut Vec<ObjectHit>) {
    for t in ray_sphere(ray, &Point3::origin(), 1.0) {
        hits.push(object_hit(ray.at(t)));
    }
}

/// The unit cylinder primitive, radius 1 along z in `[-1, 1]`, without caps.
pub fn intersect_unit_cylinder(ray: &Ray, hits: &mut Vec<ObjectHit>) {
    let a = Point3::new(0.0, 0.0, -1.0);
    let b = Point3::new(0.0, 0.0, 1.0);
    for t in ray_cylinder(ray, &a, &b, 1.0) {
        hits.push(object_hit(ray.at(t)));
    }
}

fn object_hit(point: Point3<f64>) -> ObjectHit {
    ObjectHit {
        point: point.to_homogeneous(),
        barycentric: None,
        pick_type: PickType::Object,
        index: 0,
        secondary_index: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_ray(from: [f64; 3], to: [f64; 3]) -> Ray {
        Ray::new(Point3::from(from).to_homogeneous(), Point3::from(to).to_homogeneous())
    }

    #[test]
    fn square_is_hit_in_second_fan_triangle() {
        let square = TreePolygon::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            3,
        );
        let mut hits = Vec::new();
        intersect_polygon(&square, &make_ray([0.2, 0.7, 1.0], [0.2, 0.7, -1.0]), &mut hits);
        assert_eq!(hits.len(), 1);
        let hit = &hits[0];
        assert_eq!(hit.index, 3);
        assert_eq!(hit.secondary_index, 1);
        assert!((hit.point - Vector4::new(0.2, 0.7, 0.0, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn ray_in_plane_of_face_misses() {
        let triangle = TreePolygon::new(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
            0,
        );
        let mut hits = Vec::new();
        intersect_polygon(&triangle, &make_ray([-1.0, 0.2, 0.0], [2.0, 0.2, 0.0]), &mut hits);
        assert!(hits.is_empty());
    }

    #[test]
    fn sphere_roots_are_entry_and_exit() {
        let ray = make_ray([0.0, 0.0, 5.0], [0.0, 0.0, 4.0]);
        let roots = ray_sphere(&ray, &Point3::origin(), 1.0);
        assert_eq!(roots, vec![4.0, 6.0]);
    }

    #[test]
    fn cylinder_roots_respect_segment_length() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let through = make_ray([0.5, 0.0, 5.0], [0.5, 0.0, 4.0]);
        let roots = ray_cylinder(&through, &a, &b, 0.1);
        assert_eq!(roots.len(), 2);
        assert!((roots[0] - 4.9).abs() < 1e-12);
        let beyond = make_ray([1.5, 0.0, 5.0], [1.5, 0.0, 4.0]);
        assert!(ray_cylinder(&beyond, &a, &b, 0.1).is_empty());
    }

    #[test]
    fn ray_along_axis_misses_cylinder() {
        let ray = make_ray([0.0, 0.0, -5.0], [0.0, 0.0, 5.0]);
        let mut hits = Vec::new();
        intersect_unit_cylinder(&ray, &mut hits);
        assert!(hits.is_empty());
    }

    #[test]
    fn relative_radii_scale_points() {
        let vertices = vec![vec![0.0, 0.0, 0.0], vec![3.0, 0.0, 0.0]];
        let ray = make_ray([0.0, 0.5, 5.0], [0.0, 0.5, 4.0]);
        let mut hits = Vec::new();
        intersect_points(&vertices, None, 0.25, &ray, &mut hits);
        assert!(hits.is_empty());
        intersect_points(&vertices, Some(&[4.0, 1.0][..]), 0.25, &ray, &mut hits);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.index == 0 && h.pick_type == PickType::Point));
    }

    #[test]
    fn edge_hit_names_segment() {
        let vertices = vec![vec![0.0, 0.0, 0.0], vec![1.0, 0.0, 0.0], vec![1.0, 1.0, 0.0]];
        let edges = vec![vec![0, 1, 2]];
        let ray = make_ray([1.0, 0.5, 5.0], [1.0, 0.5, 4.0]);
        let mut hits = Vec::new();
        intersect_edges(&vertices, &edges, 0.1, &ray, &mut hits);
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|h| h.index == 0 && h.secondary_index == 1));
    }
}
