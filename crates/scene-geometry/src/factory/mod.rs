//! Staged geometry builders.
//!
//! A factory owns one [`Geometry`]. Setters stage attribute values and are
//! checked against the element count as they come in; `update` commits them
//! together with whatever the generation flags derive.
//!
//! The capability levels nest: every factory takes vertex data, line and
//! face set factories take edge data, face set factories take face data.

mod quad_mesh;
mod staging;

use std::rc::Rc;

use crate::attribute::{Attribute, Category};
use crate::data::DataList;
use crate::error::Result;
use crate::geometry::Geometry;
use crate::math::Metric;

pub use quad_mesh::{QuadMeshFactory, QuadShape};
pub use staging::{FactoryCore, GenerationFlags};

/// Access to the staging core of a factory.
pub trait GeometryFactory {
    fn core(&self) -> &FactoryCore;

    fn core_mut(&mut self) -> &mut FactoryCore;

    /// The geometry this factory writes to.
    fn geometry(&self) -> Rc<Geometry> {
        self.core().geometry()
    }

    /// Commits every staged change.
    fn update(&mut self) -> Result<()> {
        self.core_mut().update()
    }

    fn set_metric(&mut self, metric: Metric) {
        self.core_mut().set_metric(metric);
    }

    fn generation_flags(&self) -> GenerationFlags {
        *self.core().flags()
    }
}

pub trait VertexAttributes: GeometryFactory {
    fn set_vertex_count(&mut self, count: usize) -> Result<()> {
        self.core_mut().set_count(Category::Vertex, count)
    }

    fn vertex_count(&self) -> Result<usize> {
        self.core().count(Category::Vertex)
    }

    fn set_vertex_attribute(&mut self, key: Attribute, data: impl Into<DataList>) -> Result<()> {
        self.core_mut().stage(Category::Vertex, key, data.into())
    }

    fn unset_vertex_attribute(&mut self, key: &Attribute) {
        self.core_mut().unset(Category::Vertex, key);
    }

    /// Rows of 3 (w = 1) or 4 homogeneous components.
    fn set_vertex_coordinates(&mut self, data: impl Into<DataList>) -> Result<()> {
        self.set_vertex_attribute(Attribute::COORDINATES, data)
    }

    fn set_vertex_normals(&mut self, data: impl Into<DataList>) -> Result<()> {
        self.set_vertex_attribute(Attribute::NORMALS, data)
    }

    fn set_vertex_texture_coordinates(&mut self, data: impl Into<DataList>) -> Result<()> {
        self.set_vertex_attribute(Attribute::TEXTURE_COORDINATES, data)
    }

    /// Colour rows of 3 or 4 channels, stored as RGBA.
    fn set_vertex_colors(&mut self, rows: &[Vec<f64>]) -> Result<()> {
        let colors = DataList::colors_from_rows(rows)?;
        self.set_vertex_attribute(Attribute::COLORS, colors)
    }

    fn set_vertex_labels(&mut self, labels: Vec<String>) -> Result<()> {
        self.set_vertex_attribute(Attribute::LABELS, labels)
    }

    /// Per-vertex factors on the point radius.
    fn set_vertex_relative_radii(&mut self, radii: Vec<f64>) -> Result<()> {
        let rows: Vec<Vec<f64>> = radii.into_iter().map(|r| vec![r]).collect();
        self.set_vertex_attribute(Attribute::RELATIVE_RADII, rows)
    }

    fn set_generate_vertex_labels(&mut self, generate: bool) {
        self.core_mut().flags_mut().vertex_labels = generate;
    }
}

pub trait EdgeAttributes: GeometryFactory {
    fn set_edge_count(&mut self, count: usize) -> Result<()> {
        self.core_mut().set_count(Category::Edge, count)
    }

    fn edge_count(&self) -> Result<usize> {
        self.core().count(Category::Edge)
    }

    fn set_edge_attribute(&mut self, key: Attribute, data: impl Into<DataList>) -> Result<()> {
        self.core_mut().stage(Category::Edge, key, data.into())
    }

    fn unset_edge_attribute(&mut self, key: &Attribute) {
        self.core_mut().unset(Category::Edge, key);
    }

    /// Polylines as vertex index rows.
    fn set_edge_indices(&mut self, data: impl Into<DataList>) -> Result<()> {
        self.set_edge_attribute(Attribute::INDICES, data)
    }

    fn set_edge_colors(&mut self, rows: &[Vec<f64>]) -> Result<()> {
        let colors = DataList::colors_from_rows(rows)?;
        self.set_edge_attribute(Attribute::COLORS, colors)
    }

    fn set_edge_labels(&mut self, labels: Vec<String>) -> Result<()> {
        self.set_edge_attribute(Attribute::LABELS, labels)
    }

    fn set_generate_edge_labels(&mut self, generate: bool) {
        self.core_mut().flags_mut().edge_labels = generate;
    }
}

pub trait FaceAttributes: GeometryFactory {
    fn set_face_count(&mut self, count: usize) -> Result<()> {
        self.core_mut().set_count(Category::Face, count)
    }

    fn face_count(&self) -> Result<usize> {
        self.core().count(Category::Face)
    }

    fn set_face_attribute(&mut self, key: Attribute, data: impl Into<DataList>) -> Result<()> {
        self.core_mut().stage(Category::Face, key, data.into())
    }

    fn unset_face_attribute(&mut self, key: &Attribute) {
        self.core_mut().unset(Category::Face, key);
    }

    /// Vertex index loops, one row per face.
    fn set_face_indices(&mut self, data: impl Into<DataList>) -> Result<()> {
        self.set_face_attribute(Attribute::INDICES, data)
    }

    fn set_face_normals(&mut self, data: impl Into<DataList>) -> Result<()> {
        self.set_face_attribute(Attribute::NORMALS, data)
    }

    fn set_face_colors(&mut self, rows: &[Vec<f64>]) -> Result<()> {
        let colors = DataList::colors_from_rows(rows)?;
        self.set_face_attribute(Attribute::COLORS, colors)
    }

    fn set_face_labels(&mut self, labels: Vec<String>) -> Result<()> {
        self.set_face_attribute(Attribute::LABELS, labels)
    }

    fn set_generate_edges_from_faces(&mut self, generate: bool) {
        self.core_mut().flags_mut().edges_from_faces = generate;
    }

    fn set_generate_face_normals(&mut self, generate: bool) {
        self.core_mut().flags_mut().face_normals = generate;
    }

    /// Vertex normals average the face normals around each vertex.
    fn set_generate_vertex_normals(&mut self, generate: bool) {
        self.core_mut().flags_mut().vertex_normals = generate;
    }

    fn set_generate_face_labels(&mut self, generate: bool) {
        self.core_mut().flags_mut().face_labels = generate;
    }

    /// Attaches an AABB tree over the faces for accelerated picking.
    fn set_generate_aabb_tree(&mut self, generate: bool) {
        self.core_mut().flags_mut().aabb_tree = generate;
    }

    fn set_max_polys_per_leaf(&mut self, max: usize) {
        self.core_mut().set_max_polys_per_leaf(max);
    }
}

macro_rules! factory {
    ($(#[$doc:meta])* $name:ident, $ctor:path, [$($capability:ident),*]) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name {
            core: FactoryCore,
        }

        impl $name {
            pub fn new() -> Self {
                Self {
                    core: FactoryCore::new($ctor()),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl GeometryFactory for $name {
            fn core(&self) -> &FactoryCore {
                &self.core
            }

            fn core_mut(&mut self) -> &mut FactoryCore {
                &mut self.core
            }
        }

        $(impl $capability for $name {})*
    };
}

factory!(
    /// Builds a point set.
    PointSetFactory,
    Geometry::point_set,
    [VertexAttributes]
);

factory!(
    /// Builds a set of polylines.
    IndexedLineSetFactory,
    Geometry::line_set,
    [VertexAttributes, EdgeAttributes]
);

factory!(
    /// Builds a polygonal face set.
    IndexedFaceSetFactory,
    Geometry::face_set,
    [VertexAttributes, EdgeAttributes, FaceAttributes]
);

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::error::GeometryError;
    use crate::geometry::{keys, GeometryAttribute};

    fn make_cube_factory() -> IndexedFaceSetFactory {
        let mut factory = IndexedFaceSetFactory::new();
        factory
            .set_vertex_coordinates(vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
                [1.0, 0.0, 1.0],
                [1.0, 1.0, 1.0],
                [0.0, 1.0, 1.0],
            ])
            .unwrap();
        factory
            .set_face_indices(vec![
                [0, 3, 2, 1],
                [4, 5, 6, 7],
                [0, 1, 5, 4],
                [1, 2, 6, 5],
                [2, 3, 7, 6],
                [3, 0, 4, 7],
            ])
            .unwrap();
        factory
    }

    #[test]
    fn point_set_commits_coordinates() {
        let mut factory = PointSetFactory::new();
        factory.set_vertex_count(2).unwrap();
        factory.set_vertex_coordinates(vec![[0.0, 0.0, 0.0], [1.0, 2.0, 3.0]]).unwrap();
        factory.update().unwrap();
        let geometry = factory.geometry();
        let reader = geometry.read().unwrap();
        assert_eq!(reader.vertex_count(), 2);
        assert_eq!(
            reader.f64_rows(Category::Vertex, &Attribute::COORDINATES).unwrap()[1],
            vec![1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn setter_rejects_wrong_count() {
        let mut factory = PointSetFactory::new();
        factory.set_vertex_count(3).unwrap();
        let err = factory.set_vertex_coordinates(vec![[0.0, 0.0, 0.0]]).unwrap_err();
        assert!(matches!(err, GeometryError::CountMismatch { expected: 3, actual: 1, .. }), "{err}");
    }

    #[test]
    fn line_set_factory_has_no_faces() {
        let mut factory = IndexedLineSetFactory::new();
        let err = factory.core_mut().stage(Category::Face, Attribute::INDICES, DataList::from(vec![[0, 1, 2]]));
        assert!(matches!(err, Err(GeometryError::UnsupportedCategory { .. })));
    }

    #[test]
    fn count_change_after_staging_is_inconsistent() {
        let mut factory = PointSetFactory::new();
        factory.set_vertex_coordinates(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]).unwrap();
        factory.set_vertex_attribute(Attribute::named("weights"), vec![[1.0], [2.0]]).unwrap();
        factory.set_vertex_count(3).unwrap();
        let err = factory.update().unwrap_err();
        match err {
            GeometryError::InconsistentPending { category, counts } => {
                assert_eq!(category, Category::Vertex);
                assert_eq!(counts.len(), 2);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn cube_edges_come_from_faces() {
        let mut factory = make_cube_factory();
        factory.set_generate_edges_from_faces(true);
        factory.update().unwrap();
        let geometry = factory.geometry();
        let reader = geometry.read().unwrap();
        assert_eq!(reader.edge_count(), 12);
        assert!(reader.is_quadrilateral());
    }

    #[test]
    fn generated_normals_point_outwards() {
        let mut factory = make_cube_factory();
        factory.set_generate_face_normals(true);
        factory.set_generate_vertex_normals(true);
        factory.update().unwrap();
        let geometry = factory.geometry();
        let reader = geometry.read().unwrap();
        let faces = reader.f64_rows(Category::Face, &Attribute::NORMALS).unwrap();
        assert_eq!(faces[0], vec![0.0, 0.0, -1.0]);
        assert_eq!(faces[1], vec![0.0, 0.0, 1.0]);
        let vertices = reader.f64_rows(Category::Vertex, &Attribute::NORMALS).unwrap();
        let s = 1.0 / 3f64.sqrt();
        assert!(vertices[6].iter().all(|c| (c - s).abs() < 1e-12), "{:?}", vertices[6]);
    }

    #[test]
    fn supplied_normals_are_not_overwritten() {
        let mut factory = make_cube_factory();
        factory.set_generate_face_normals(true);
        factory.set_face_normals(vec![[1.0, 0.0, 0.0]; 6]).unwrap();
        factory.update().unwrap();
        let geometry = factory.geometry();
        let normals = geometry.read().unwrap().f64_rows(Category::Face, &Attribute::NORMALS).unwrap();
        assert!(normals.iter().all(|n| n == &vec![1.0, 0.0, 0.0]));
    }

    #[test]
    fn update_fires_one_event() {
        let mut factory = make_cube_factory();
        factory.set_generate_edges_from_faces(true);
        factory.set_generate_face_normals(true);
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        factory.geometry().add_listener(move |event| sink.borrow_mut().push(event.clone()));
        factory.update().unwrap();
        let events = events.borrow();
        assert_eq!(events.len(), 1);
        assert!(events[0].changed_attributes(Category::Face).contains(&Attribute::NORMALS));
        assert!(events[0].changed_attributes(Category::Edge).contains(&Attribute::INDICES));
    }

    #[test]
    fn failed_update_leaves_geometry_untouched() {
        let mut factory = IndexedFaceSetFactory::new();
        factory
            .set_vertex_coordinates(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
            .unwrap();
        factory.set_face_indices(vec![[0, 1, 2]]).unwrap();
        factory.set_generate_edges_from_faces(true);
        factory.set_edge_colors(&vec![vec![1.0, 0.0, 0.0]; 5]).unwrap();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        factory.geometry().add_listener(move |event| sink.borrow_mut().push(event.clone()));

        let err = factory.update().unwrap_err();
        assert!(
            matches!(err, GeometryError::CountMismatch { category: Category::Edge, expected: 3, actual: 5, .. }),
            "{err}"
        );
        assert!(events.borrow().is_empty());
        let geometry = factory.geometry();
        let reader = geometry.read().unwrap();
        assert_eq!((reader.vertex_count(), reader.edge_count(), reader.face_count()), (0, 0, 0));
    }

    #[test]
    fn unrelated_update_keeps_derived_data() {
        let mut factory = make_cube_factory();
        factory.set_generate_face_normals(true);
        factory.update().unwrap();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        factory.geometry().add_listener(move |event| sink.borrow_mut().push(event.clone()));
        factory.set_face_colors(&vec![vec![1.0, 0.0, 0.0]; 6]).unwrap();
        factory.update().unwrap();
        let events = events.borrow();
        assert_eq!(events.len(), 1);
        assert!(!events[0].changed_attributes(Category::Face).contains(&Attribute::NORMALS));
        assert!(events[0].changed_attributes(Category::Face).contains(&Attribute::COLORS));
    }

    #[test]
    fn labels_follow_counts() {
        let mut factory = make_cube_factory();
        factory.set_generate_vertex_labels(true);
        factory.set_generate_face_labels(true);
        factory.update().unwrap();
        let geometry = factory.geometry();
        let reader = geometry.read().unwrap();
        let labels = reader.attribute(Category::Face, &Attribute::LABELS).unwrap().as_string_rows().unwrap();
        assert_eq!(labels[5], vec!["5".to_string()]);
        assert!(reader.has_attribute(Category::Vertex, &Attribute::LABELS));
    }

    #[test]
    fn aabb_tree_is_attached_and_removed() {
        let mut factory = make_cube_factory();
        factory.set_generate_aabb_tree(true);
        factory.update().unwrap();
        let geometry = factory.geometry();
        {
            let reader = geometry.read().unwrap();
            let attribute = reader.geometry_attribute(keys::AABB_TREE).unwrap();
            assert!(matches!(&*attribute, GeometryAttribute::AabbTree(tree) if tree.polygons().len() == 6));
        }
        factory.set_generate_aabb_tree(false);
        factory.update().unwrap();
        assert!(geometry.read().unwrap().geometry_attribute(keys::AABB_TREE).is_none());
    }

    #[test]
    fn metric_is_committed() {
        let mut factory = make_cube_factory();
        factory.set_metric(Metric::Hyperbolic);
        factory.update().unwrap();
        assert_eq!(factory.geometry().read().unwrap().metric(), Metric::Hyperbolic);
    }

    #[test]
    fn new_vertex_count_requires_new_coordinates() {
        let mut factory = make_cube_factory();
        factory.update().unwrap();
        let err = factory.set_vertex_coordinates(vec![[0.0, 0.0, 0.0]; 4]).unwrap_err();
        assert!(matches!(err, GeometryError::CountMismatch { expected: 8, .. }));
        factory.set_vertex_count(4).unwrap();
        factory.set_vertex_coordinates(vec![[0.0, 0.0, 0.0]; 4]).unwrap();
        factory.set_face_indices(vec![[0, 1, 2, 3]]).unwrap_err();
        factory.set_face_count(1).unwrap();
        factory.set_face_indices(vec![[0, 1, 2, 3]]).unwrap();
        factory.update().unwrap();
        let geometry = factory.geometry();
        let reader = geometry.read().unwrap();
        assert_eq!((reader.vertex_count(), reader.face_count()), (4, 1));
    }
}
