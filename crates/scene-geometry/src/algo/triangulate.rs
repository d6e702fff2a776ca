//! Splitting polygons into triangles.

use std::rc::Rc;

use nalgebra::{Point3, Vector3};

use super::{build_face_set, FaceSetData, Rebuild};
use crate::attribute::Category;
use crate::error::{GeometryError, Result};
use crate::geometry::Geometry;
use crate::math::{to_homogeneous, to_point3, Triangle, DEGENERACY_TOLERANCE};

/// Connects the first vertex with every following pair.
///
/// Only correct for convex planar faces.
pub fn fan(face: &[i32]) -> Vec<[i32; 3]> {
    match face.split_first() {
        Some((&first, rest)) => rest.windows(2).map(|pair| [first, pair[0], pair[1]]).collect(),
        None => Vec::new(),
    }
}

/// Orientation of a polygon: the sum of its fan triangles' cross products.
fn polygon_normal(ring: &[Point3<f64>]) -> Vector3<f64> {
    let Some((p0, rest)) = ring.split_first() else {
        return Vector3::zeros();
    };
    rest.windows(2).map(|pair| (pair[0] - p0).cross(&(pair[1] - p0))).sum()
}

/// Ear-cutting triangulation of one face, `points` indexed by vertex.
///
/// An ear is accepted when it turns the same way as the whole polygon and
/// no other remaining vertex lies strictly inside it. Near-zero-area ears
/// are dropped. If no ear can be found the rest of the face is fanned.
///
/// An index outside `points` is reported as element 0, the face itself.
pub fn ear_cut(face: &[i32], points: &[Point3<f64>]) -> Result<Vec<[i32; 3]>> {
    if let Some(&index) = face
        .iter()
        .find(|&&i| usize::try_from(i).map_or(true, |i| i >= points.len()))
    {
        return Err(GeometryError::IndexOutOfRange {
            category: Category::Face,
            element: 0,
            index,
            vertex_count: points.len(),
        });
    }
    let point = |i: i32| points[i as usize];
    let ring: Vec<Point3<f64>> = face.iter().map(|&i| point(i)).collect();
    let normal = polygon_normal(&ring);
    if normal.norm() < DEGENERACY_TOLERANCE {
        log::warn!("face {face:?} has no orientation, using a fan");
        return Ok(fan(face));
    }

    let mut remaining = face.to_vec();
    let mut triangles = Vec::with_capacity(face.len().saturating_sub(2));
    while remaining.len() > 3 {
        let n = remaining.len();
        let mut cut = None;
        for i in 0..n {
            let (prev, cur, next) = (remaining[(i + n - 1) % n], remaining[i], remaining[(i + 1) % n]);
            let ear = Triangle::new(point(prev), point(cur), point(next));
            let cross = ear.normal();
            if cross.norm() < DEGENERACY_TOLERANCE {
                log::debug!("dropping degenerate ear {prev} {cur} {next}");
                cut = Some((i, None));
                break;
            }
            if cross.dot(&normal) <= 0.0 {
                continue;
            }
            let blocked = remaining
                .iter()
                .filter(|&&v| v != prev && v != cur && v != next)
                .any(|&v| ear.contains_strictly(&point(v), &normal));
            if !blocked {
                cut = Some((i, Some([prev, cur, next])));
                break;
            }
        }
        match cut {
            Some((i, triangle)) => {
                triangles.extend(triangle);
                remaining.remove(i);
            }
            None => {
                log::warn!("no ear found in face {face:?}, fanning the remaining {n} vertices");
                triangles.extend(fan(&remaining));
                return Ok(triangles);
            }
        }
    }
    if let &[a, b, c] = remaining.as_slice() {
        if Triangle::new(point(a), point(b), point(c)).normal().norm() < DEGENERACY_TOLERANCE {
            log::debug!("dropping degenerate final triangle {a} {b} {c}");
        } else {
            triangles.push([a, b, c]);
        }
    }
    Ok(triangles)
}

fn split_faces(
    geometry: &Geometry,
    split: impl Fn(&[i32], &[Point3<f64>]) -> Result<Vec<[i32; 3]>>,
) -> Result<Rc<Geometry>> {
    let data = FaceSetData::read(geometry)?;
    let points: Vec<Point3<f64>> = data
        .coordinates()?
        .iter()
        .map(|row| to_point3(&to_homogeneous(row)))
        .collect();
    let mut faces = Vec::new();
    let mut parents = Vec::new();
    for (parent, face) in data.faces.iter().enumerate() {
        for triangle in split(face.as_slice(), points.as_slice())? {
            faces.push(triangle.to_vec());
            parents.push(parent);
        }
    }
    let face_attributes = data.face_attributes_for(&parents)?;
    build_face_set(
        data.vertex_count,
        data.vertex_attributes.clone(),
        faces,
        face_attributes,
        Rebuild {
            edges: data.edges.is_some(),
            face_normals: data.has_face_normals(),
            vertex_normals: false,
        },
        data.metric,
    )
}

/// Fan-triangulates every face.
pub fn fan_triangulate(geometry: &Geometry) -> Result<Rc<Geometry>> {
    split_faces(geometry, |face, _| Ok(fan(face)))
}

/// Ear-cuts every face; handles non-convex planar faces.
pub fn triangulate(geometry: &Geometry) -> Result<Rc<Geometry>> {
    split_faces(geometry, ear_cut)
}
