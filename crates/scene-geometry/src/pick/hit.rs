//! Pick results.

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use nalgebra::{Matrix4, Vector3, Vector4};

use super::intersect::{ObjectHit, Ray};
use crate::attribute::{Attribute, Category};
use crate::geometry::Geometry;
use crate::math::{affine_coordinate, dehomogenize, distance_between, to_homogeneous, to_point3, Metric, Triangle};
use crate::scene::ScenePath;

/// What kind of element a hit lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickType {
    /// A built-in primitive such as a sphere or cylinder.
    Object,
    Face,
    Line,
    Point,
}

impl fmt::Display for PickType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PickType::Object => "object",
            PickType::Face => "face",
            PickType::Line => "line",
            PickType::Point => "point",
        })
    }
}

/// One ray intersection, placed in the scene.
///
/// Texture coordinates are derived from the geometry on first request.
#[derive(Debug, Clone)]
pub struct Hit {
    world_point: Vector4<f64>,
    object_point: Vector4<f64>,
    distance: f64,
    affine: f64,
    barycentric: Option<Vector3<f64>>,
    pick_type: PickType,
    index: usize,
    secondary_index: usize,
    path: ScenePath,
    geometry: Option<Rc<Geometry>>,
    texture_coordinates: OnceCell<Option<Vec<f64>>>,
}

impl Hit {
    /// Places an object-space hit with the object-to-world `matrix`.
    pub fn new(
        hit: ObjectHit,
        matrix: &Matrix4<f64>,
        world_ray: &Ray,
        metric: Metric,
        path: ScenePath,
        geometry: Option<Rc<Geometry>>,
    ) -> Self {
        let world_point = dehomogenize(&(matrix * hit.point));
        Self {
            world_point,
            object_point: dehomogenize(&hit.point),
            distance: distance_between(&world_ray.from, &world_point, metric),
            affine: affine_coordinate(&world_ray.from, &world_ray.to, &world_point),
            barycentric: hit.barycentric,
            pick_type: hit.pick_type,
            index: hit.index,
            secondary_index: hit.secondary_index,
            path,
            geometry,
            texture_coordinates: OnceCell::new(),
        }
    }

    #[inline]
    pub fn world_point(&self) -> &Vector4<f64> {
        &self.world_point
    }

    #[inline]
    pub fn object_point(&self) -> &Vector4<f64> {
        &self.object_point
    }

    /// Distance from the ray origin under the active metric.
    #[inline]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Ray parameter; negative values lie behind the origin.
    #[inline]
    pub fn affine(&self) -> f64 {
        self.affine
    }

    #[inline]
    pub fn barycentric(&self) -> Option<&Vector3<f64>> {
        self.barycentric.as_ref()
    }

    #[inline]
    pub fn pick_type(&self) -> PickType {
        self.pick_type
    }

    /// Face, edge or vertex index.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Fan triangle of a face hit, segment of a line hit.
    #[inline]
    pub fn secondary_index(&self) -> usize {
        self.secondary_index
    }

    pub fn path(&self) -> &ScenePath {
        &self.path
    }

    pub fn geometry(&self) -> Option<&Rc<Geometry>> {
        self.geometry.as_ref()
    }

    /// Interpolated vertex texture coordinates at the hit.
    pub fn texture_coordinates(&self) -> Option<&[f64]> {
        self.texture_coordinates
            .get_or_init(|| self.compute_texture_coordinates())
            .as_deref()
    }

    fn compute_texture_coordinates(&self) -> Option<Vec<f64>> {
        let geometry = self.geometry.as_ref()?;
        let reader = geometry.read().ok()?;
        let uv = reader.f64_rows(Category::Vertex, &Attribute::TEXTURE_COORDINATES)?;
        match self.pick_type {
            PickType::Point => uv.get(self.index).cloned(),
            PickType::Face => {
                let face = reader.face(self.index)?;
                let k = self.secondary_index;
                let corners = [*face.first()?, *face.get(k + 1)?, *face.get(k + 2)?];
                let corners: Vec<usize> = corners.iter().map(|&i| usize::try_from(i).ok()).collect::<Option<_>>()?;
                let coordinates = reader.f64_rows(Category::Vertex, &Attribute::COORDINATES)?;
                let points: Vec<_> = corners
                    .iter()
                    .map(|&i| coordinates.get(i).map(|row| to_point3(&to_homogeneous(row))))
                    .collect::<Option<_>>()?;
                let triangle = Triangle::new(points[0], points[1], points[2]);
                let weights = triangle.barycentric(&to_point3(&self.object_point))?;
                let rows: Vec<&Vec<f64>> = corners.iter().map(|&i| uv.get(i)).collect::<Option<_>>()?;
                let len = rows.iter().map(|r| r.len()).min()?;
                Some(
                    (0..len)
                        .map(|c| weights[0] * rows[0][c] + weights[1] * rows[1][c] + weights[2] * rows[2][c])
                        .collect(),
                )
            }
            PickType::Line | PickType::Object => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataList;

    fn make_textured_square() -> Rc<Geometry> {
        let geometry = Geometry::face_set();
        {
            let writer = geometry.write().unwrap();
            writer
                .set_attribute(
                    Category::Vertex,
                    Attribute::COORDINATES,
                    DataList::from(vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 2.0, 0.0], [0.0, 2.0, 0.0]]),
                )
                .unwrap();
            writer
                .set_attribute(
                    Category::Vertex,
                    Attribute::TEXTURE_COORDINATES,
                    DataList::from(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]),
                )
                .unwrap();
            writer
                .set_attribute(Category::Face, Attribute::INDICES, DataList::from(vec![[0, 1, 2, 3]]))
                .unwrap();
        }
        Rc::new(geometry)
    }

    fn make_hit(point: Vector4<f64>, secondary_index: usize, geometry: Rc<Geometry>) -> Hit {
        let ray = Ray::new(Vector4::new(point.x, point.y, 5.0, 1.0), Vector4::new(0.0, 0.0, -1.0, 0.0));
        Hit::new(
            ObjectHit {
                point,
                barycentric: None,
                pick_type: PickType::Face,
                index: 0,
                secondary_index,
            },
            &Matrix4::identity(),
            &ray,
            Metric::Euclidean,
            ScenePath::new(),
            Some(geometry),
        )
    }

    #[test]
    fn texture_coordinates_follow_object_point() {
        let hit = make_hit(Vector4::new(0.5, 1.5, 0.0, 1.0), 1, make_textured_square());
        let uv = hit.texture_coordinates().unwrap();
        assert!((uv[0] - 0.25).abs() < 1e-12 && (uv[1] - 0.75).abs() < 1e-12, "{uv:?}");
    }

    #[test]
    fn distance_and_affine_from_origin() {
        let hit = make_hit(Vector4::new(1.0, 1.0, 0.0, 1.0), 0, make_textured_square());
        assert!((hit.distance() - 5.0).abs() < 1e-12);
        assert!((hit.affine() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn no_texture_coordinates_without_geometry() {
        let ray = Ray::new(Vector4::new(0.0, 0.0, 5.0, 1.0), Vector4::new(0.0, 0.0, 0.0, 1.0));
        let hit = Hit::new(
            ObjectHit {
                point: Vector4::new(0.0, 0.0, 1.0, 1.0),
                barycentric: None,
                pick_type: PickType::Object,
                index: 0,
                secondary_index: 0,
            },
            &Matrix4::identity(),
            &ray,
            Metric::Euclidean,
            ScenePath::new(),
            None,
        );
        assert!(hit.texture_coordinates().is_none());
        assert!((hit.affine() - 0.8).abs() < 1e-12);
    }
}
