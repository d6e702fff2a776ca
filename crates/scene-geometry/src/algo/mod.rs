//! Construction and subdivision algorithms over face sets.
//!
//! Every algorithm reads its input under a reader guard and builds a new
//! geometry through [`IndexedFaceSetFactory`]; inputs are never modified.

pub mod bezier;
pub mod edges;
pub mod implode;
pub mod normals;
pub mod primitives;
pub mod refine;
pub mod sphere;
pub mod triangulate;

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::attribute::{Attribute, Category};
use crate::data::DataList;
use crate::error::{GeometryError, Result};
use crate::factory::{FaceAttributes, GeometryFactory, IndexedFaceSetFactory, VertexAttributes};
use crate::geometry::Geometry;
use crate::math::Metric;

pub use bezier::BezierPatchMesh;
pub use edges::edges_from_faces;
pub use implode::implode;
pub use refine::{binary_refine, RefineOutcome};
pub use sphere::{icosahedral_sphere, SphereCache, TextureChannels, MAX_SPHERE_LEVEL};
pub use triangulate::{fan_triangulate, triangulate};

/// The parts of a face set the algorithms work from.
#[derive(Debug, Clone)]
pub(crate) struct FaceSetData {
    pub vertex_count: usize,
    pub vertex_attributes: BTreeMap<Attribute, DataList>,
    pub faces: Vec<Vec<i32>>,
    /// Face attributes other than the indices.
    pub face_attributes: BTreeMap<Attribute, DataList>,
    pub edges: Option<Vec<Vec<i32>>>,
    pub metric: Metric,
}

impl FaceSetData {
    pub fn read(geometry: &Geometry) -> Result<Self> {
        let reader = geometry.read()?;
        let faces = reader
            .i32_rows(Category::Face, &Attribute::INDICES)
            .ok_or(GeometryError::MissingAttribute {
                category: Category::Face,
                attribute: Attribute::INDICES,
            })?;
        let vertex_count = reader.vertex_count();
        for (element, face) in faces.iter().enumerate() {
            if let Some(&index) = face.iter().find(|&&i| usize::try_from(i).map_or(true, |i| i >= vertex_count)) {
                return Err(GeometryError::IndexOutOfRange {
                    category: Category::Face,
                    element,
                    index,
                    vertex_count,
                });
            }
        }
        let mut face_attributes = reader.attributes(Category::Face);
        face_attributes.remove(&Attribute::INDICES);
        Ok(Self {
            vertex_count,
            vertex_attributes: reader.attributes(Category::Vertex),
            faces,
            face_attributes,
            edges: reader.i32_rows(Category::Edge, &Attribute::INDICES),
            metric: reader.metric(),
        })
    }

    pub fn coordinates(&self) -> Result<Vec<Vec<f64>>> {
        self.vertex_attributes
            .get(&Attribute::COORDINATES)
            .and_then(DataList::as_f64_rows)
            .ok_or(GeometryError::MissingAttribute {
                category: Category::Vertex,
                attribute: Attribute::COORDINATES,
            })
    }

    /// Regular floating point vertex attributes as rows.
    pub fn numeric_vertex_attributes(&self) -> BTreeMap<Attribute, Vec<Vec<f64>>> {
        self.vertex_attributes
            .iter()
            .filter(|(_, list)| !list.is_variable())
            .filter_map(|(key, list)| list.as_f64_rows().map(|rows| (key.clone(), rows)))
            .collect()
    }

    /// Face attributes repeated so that output face `k` carries the values of
    /// input face `parents[k]`. Normals are dropped since they no longer fit.
    pub fn face_attributes_for(&self, parents: &[usize]) -> Result<BTreeMap<Attribute, DataList>> {
        self.face_attributes
            .iter()
            .filter(|(key, _)| **key != Attribute::NORMALS)
            .filter_map(|(key, list)| {
                list.select_rows(parents)
                    .transpose()
                    .map(|list| list.map(|list| (key.clone(), list)))
            })
            .collect()
    }

    pub fn has_face_normals(&self) -> bool {
        self.face_attributes.contains_key(&Attribute::NORMALS)
    }
}

/// What to derive when building an algorithm's output.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Rebuild {
    pub edges: bool,
    pub face_normals: bool,
    pub vertex_normals: bool,
}

/// Commits vertex data, faces and face data into a new face set.
pub(crate) fn build_face_set(
    vertex_count: usize,
    vertex_attributes: BTreeMap<Attribute, DataList>,
    faces: Vec<Vec<i32>>,
    face_attributes: BTreeMap<Attribute, DataList>,
    rebuild: Rebuild,
    metric: Metric,
) -> Result<Rc<Geometry>> {
    let mut factory = IndexedFaceSetFactory::new();
    factory.set_metric(metric);
    factory.set_vertex_count(vertex_count)?;
    for (key, list) in vertex_attributes {
        factory.set_vertex_attribute(key, list)?;
    }
    factory.set_face_count(faces.len())?;
    factory.set_face_indices(faces)?;
    for (key, list) in face_attributes {
        factory.set_face_attribute(key, list)?;
    }
    factory.set_generate_edges_from_faces(rebuild.edges);
    factory.set_generate_face_normals(rebuild.face_normals);
    factory.set_generate_vertex_normals(rebuild.vertex_normals);
    factory.update()?;
    Ok(factory.geometry())
}

/// Row-wise linear interpolation `a + t (b - a)` over the shorter row.
pub(crate) fn lerp_rows(a: &[f64], b: &[f64], t: f64) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x + t * (y - x)).collect()
}

/// Scales a 3-vector row to unit length, leaving near-zero rows alone.
pub(crate) fn normalize_row(row: &mut [f64]) {
    let len = row.iter().take(3).map(|c| c * c).sum::<f64>().sqrt();
    if len > crate::math::EPSILON {
        row.iter_mut().take(3).for_each(|c| *c /= len);
    }
}
