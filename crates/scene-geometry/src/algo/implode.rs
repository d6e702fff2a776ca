//! Shrinking faces towards their centroids, or insetting them.

use std::collections::BTreeMap;
use std::rc::Rc;

use nalgebra::Point3;

use super::{build_face_set, FaceSetData, Rebuild};
use crate::attribute::Attribute;
use crate::data::DataList;
use crate::error::Result;
use crate::geometry::Geometry;
use crate::math::{to_homogeneous, to_point3};

fn centroid(points: &[Point3<f64>]) -> Point3<f64> {
    let sum = points.iter().fold(nalgebra::Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / points.len().max(1) as f64)
}

/// Explodes a face set into separate faces.
///
/// A factor in `[0, 1]` scales every face about its centroid; the faces no
/// longer share vertices. A negative factor keeps the original vertices,
/// insets every face by `|factor|` towards its centroid and replaces it by
/// quads joining each edge to its inset copy, leaving a hole.
///
/// Face attributes follow their face; vertex attributes are copied to the
/// vertices made from them. Edges and normals are rebuilt when the input
/// had them.
pub fn implode(geometry: &Geometry, factor: f64) -> Result<Rc<Geometry>> {
    let data = FaceSetData::read(geometry)?;
    let points: Vec<Point3<f64>> = data
        .coordinates()?
        .iter()
        .map(|row| to_point3(&to_homogeneous(row)))
        .collect();

    let mut sources: Vec<usize> = Vec::new();
    let mut coordinates: Vec<Vec<f64>> = Vec::new();
    let mut faces: Vec<Vec<i32>> = Vec::new();
    let mut parents: Vec<usize> = Vec::new();

    if factor >= 0.0 {
        for (parent, face) in data.faces.iter().enumerate() {
            let corners: Vec<Point3<f64>> = face.iter().map(|&i| points[i as usize]).collect();
            let center = centroid(&corners);
            let start = sources.len() as i32;
            for (&index, corner) in face.iter().zip(&corners) {
                let moved = center + (corner - center) * factor;
                sources.push(index as usize);
                coordinates.push(vec![moved.x, moved.y, moved.z]);
            }
            faces.push((start..start + face.len() as i32).collect());
            parents.push(parent);
        }
    } else {
        let inset = factor.abs();
        sources.extend(0..data.vertex_count);
        coordinates.extend(points.iter().map(|p| vec![p.x, p.y, p.z]));
        for (parent, face) in data.faces.iter().enumerate() {
            let corners: Vec<Point3<f64>> = face.iter().map(|&i| points[i as usize]).collect();
            let center = centroid(&corners);
            let start = sources.len() as i32;
            for (&index, corner) in face.iter().zip(&corners) {
                let moved = corner + (center - corner) * inset;
                sources.push(index as usize);
                coordinates.push(vec![moved.x, moved.y, moved.z]);
            }
            let n = face.len();
            for i in 0..n {
                let j = (i + 1) % n;
                faces.push(vec![face[i], face[j], start + j as i32, start + i as i32]);
                parents.push(parent);
            }
        }
    }

    let mut vertex_attributes: BTreeMap<Attribute, DataList> = data
        .vertex_attributes
        .iter()
        .filter(|(key, _)| **key != Attribute::COORDINATES && **key != Attribute::NORMALS)
        .filter_map(|(key, list)| {
            list.select_rows(&sources)
                .transpose()
                .map(|list| list.map(|list| (key.clone(), list)))
        })
        .collect::<Result<_>>()?;
    vertex_attributes.insert(Attribute::COORDINATES, DataList::from(coordinates));

    log::debug!(
        "imploded {} faces by {factor} into {} faces over {} vertices",
        data.faces.len(),
        faces.len(),
        sources.len()
    );
    build_face_set(
        sources.len(),
        vertex_attributes,
        faces,
        data.face_attributes_for(&parents)?,
        Rebuild {
            edges: data.edges.is_some(),
            face_normals: true,
            vertex_normals: data.vertex_attributes.contains_key(&Attribute::NORMALS),
        },
        data.metric,
    )
}
