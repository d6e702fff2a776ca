//! Faces prepared for ray intersection.

use nalgebra::{Point3, Vector3};

use crate::math::{to_homogeneous, to_point3, Triangle};

/// A face of an indexed face set in dehomogenised object coordinates.
///
/// Vertices are in face order; the face is treated as a triangle fan
/// around its first vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct TreePolygon {
    vertices: Vec<Point3<f64>>,
    centroid: Point3<f64>,
    face: usize,
}

impl TreePolygon {
    pub fn new(vertices: Vec<Point3<f64>>, face: usize) -> Self {
        debug_assert!(!vertices.is_empty(), "TreePolygon needs at least one vertex");
        let sum: Vector3<f64> = vertices.iter().map(|p| p.coords).sum();
        let centroid = Point3::from(sum / vertices.len().max(1) as f64);
        Self {
            vertices,
            centroid,
            face,
        }
    }

    /// Builds one polygon per face with at least three valid indices.
    ///
    /// Faces referencing missing vertices are skipped.
    pub fn from_faces(vertices: &[Vec<f64>], faces: &[Vec<i32>]) -> Vec<TreePolygon> {
        let points: Vec<Point3<f64>> = vertices.iter().map(|row| to_point3(&to_homogeneous(row))).collect();
        let mut polygons = Vec::with_capacity(faces.len());
        for (face, indices) in faces.iter().enumerate() {
            let corners: Option<Vec<Point3<f64>>> = indices
                .iter()
                .map(|&i| usize::try_from(i).ok().and_then(|i| points.get(i)).copied())
                .collect();
            match corners {
                Some(corners) if corners.len() >= 3 => polygons.push(TreePolygon::new(corners, face)),
                Some(_) => log::debug!("face {face} has fewer than 3 vertices, not pickable"),
                None => log::warn!("face {face} references a missing vertex, not pickable"),
            }
        }
        polygons
    }

    #[inline]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    #[inline]
    pub fn centroid(&self) -> Point3<f64> {
        self.centroid
    }

    /// Index of the face this polygon was built from.
    #[inline]
    pub fn face(&self) -> usize {
        self.face
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Fan triangles `(0, k + 1, k + 2)` with their index `k`.
    pub fn fan(&self) -> impl Iterator<Item = (usize, Triangle)> + '_ {
        let v = &self.vertices;
        (0..v.len().saturating_sub(2)).map(move |k| (k, Triangle::new(v[0], v[k + 1], v[k + 2])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_square() -> TreePolygon {
        TreePolygon::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(2.0, 2.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
            ],
            7,
        )
    }

    #[test]
    fn centroid_is_vertex_average() {
        assert_eq!(make_square().centroid(), Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn fan_covers_polygon() {
        let square = make_square();
        let triangles: Vec<_> = square.fan().collect();
        assert_eq!(triangles.len(), 2);
        let area: f64 = triangles.iter().map(|(_, t)| t.area()).sum();
        assert!((area - 4.0).abs() < 1e-12);
        assert_eq!(triangles[1].1.vertices()[2], Point3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn from_faces_skips_bad_faces() {
        let vertices = vec![vec![0.0, 0.0, 0.0], vec![1.0, 0.0, 0.0], vec![0.0, 2.0, 0.0, 2.0]];
        let faces = vec![vec![0, 1, 2], vec![0, 1, 9], vec![0, 1]];
        let polygons = TreePolygon::from_faces(&vertices, &faces);
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].face(), 0);
        assert_eq!(polygons[0].vertices()[2], Point3::new(0.0, 1.0, 0.0));
    }
}
