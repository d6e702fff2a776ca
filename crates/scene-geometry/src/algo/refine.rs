//! Binary refinement of triangle meshes.
//!
//! Every triangle is split at its edge midpoints into three corner
//! triangles and one inner triangle. Midpoints are shared between the two
//! triangles of an edge.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use super::edges::count_edges;
use super::{build_face_set, lerp_rows, normalize_row, FaceSetData, Rebuild};
use crate::attribute::{Attribute, Category};
use crate::data::DataList;
use crate::error::{GeometryError, Result};
use crate::geometry::Geometry;

/// Result of [`binary_refine`].
#[derive(Debug, Clone)]
pub enum RefineOutcome {
    Refined(Rc<Geometry>),
    /// More midpoints were needed than the mesh has edges, so the mesh is
    /// not the manifold triangle mesh its edges describe.
    CapacityExceeded { capacity: usize },
}

impl RefineOutcome {
    pub fn geometry(&self) -> Option<&Rc<Geometry>> {
        match self {
            RefineOutcome::Refined(geometry) => Some(geometry),
            RefineOutcome::CapacityExceeded { .. } => None,
        }
    }
}

/// Triangles and vertex rows after one subdivision step.
#[derive(Debug, Clone)]
pub(crate) struct Subdivision {
    pub vertex_count: usize,
    pub attributes: BTreeMap<Attribute, Vec<Vec<f64>>>,
    pub faces: Vec<[i32; 3]>,
    /// Input face of each output face.
    pub parents: Vec<usize>,
}

/// Splits each triangle into four.
///
/// Returns `None` once more than `capacity` vertices would be needed.
pub(crate) fn subdivide(
    vertex_count: usize,
    mut attributes: BTreeMap<Attribute, Vec<Vec<f64>>>,
    faces: &[[i32; 3]],
    capacity: usize,
) -> Option<Subdivision> {
    let mut midpoints: HashMap<(i32, i32), i32> = HashMap::new();
    let mut next = vertex_count;
    let mut refined = Vec::with_capacity(faces.len() * 4);
    let mut parents = Vec::with_capacity(faces.len() * 4);

    let mut midpoint = |a: i32, b: i32, attributes: &mut BTreeMap<Attribute, Vec<Vec<f64>>>| -> Option<i32> {
        let key = (a.min(b), a.max(b));
        if let Some(&index) = midpoints.get(&key) {
            return Some(index);
        }
        if next >= capacity {
            return None;
        }
        for (name, rows) in attributes.iter_mut() {
            let mut row = lerp_rows(&rows[a as usize], &rows[b as usize], 0.5);
            if *name == Attribute::NORMALS {
                normalize_row(&mut row);
            }
            rows.push(row);
        }
        let index = next as i32;
        next += 1;
        midpoints.insert(key, index);
        Some(index)
    };

    for (parent, &[a, b, c]) in faces.iter().enumerate() {
        let ab = midpoint(a, b, &mut attributes)?;
        let bc = midpoint(b, c, &mut attributes)?;
        let ca = midpoint(c, a, &mut attributes)?;
        refined.extend([[a, ab, ca], [b, bc, ab], [c, ca, bc], [ab, bc, ca]]);
        parents.extend([parent; 4]);
    }

    Some(Subdivision {
        vertex_count: next,
        attributes,
        faces: refined,
        parents,
    })
}

/// Refines a triangle mesh whose edges, if present, are single segments.
///
/// Floating point vertex attributes are interpolated at the midpoints and
/// face attributes are inherited by the four child faces.
pub fn binary_refine(geometry: &Geometry) -> Result<RefineOutcome> {
    let data = FaceSetData::read(geometry)?;
    let mut triangles = Vec::with_capacity(data.faces.len());
    for (face, row) in data.faces.iter().enumerate() {
        match row.as_slice() {
            &[a, b, c] => triangles.push([a, b, c]),
            _ => {
                return Err(GeometryError::NonTriangularFace {
                    face,
                    arity: row.len(),
                });
            }
        }
    }
    let edge_count = match &data.edges {
        Some(edges) => {
            if let Some((edge, row)) = edges.iter().enumerate().find(|(_, row)| row.len() != 2) {
                return Err(GeometryError::NonSegmentEdge { edge, len: row.len() });
            }
            edges.len()
        }
        None => count_edges(&data.faces),
    };

    let capacity = data.vertex_count + edge_count;
    let Some(subdivision) = subdivide(data.vertex_count, data.numeric_vertex_attributes(), &triangles, capacity)
    else {
        log::warn!(
            "binary refinement of {} needs more than {capacity} vertices; input is not a manifold triangle mesh",
            geometry.name()
        );
        return Ok(RefineOutcome::CapacityExceeded { capacity });
    };

    log::debug!(
        "refined {} triangles into {} ({} vertices)",
        triangles.len(),
        subdivision.faces.len(),
        subdivision.vertex_count
    );
    let face_attributes = data.face_attributes_for(&subdivision.parents)?;
    let vertex_attributes = subdivision
        .attributes
        .into_iter()
        .map(|(key, rows)| (key, DataList::from(rows)))
        .collect();
    let faces = subdivision.faces.into_iter().map(Vec::from).collect();
    let refined = build_face_set(
        subdivision.vertex_count,
        vertex_attributes,
        faces,
        face_attributes,
        Rebuild {
            edges: data.edges.is_some(),
            face_normals: data.has_face_normals(),
            vertex_normals: false,
        },
        data.metric,
    )?;
    Ok(RefineOutcome::Refined(refined))
}
