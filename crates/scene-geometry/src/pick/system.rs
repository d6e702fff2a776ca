//! Ray picking over a scene graph.

use std::collections::HashMap;
use std::rc::Rc;

use nalgebra::{Matrix4, Vector4};

use super::intersect::{
    intersect_edges, intersect_points, intersect_polygons, intersect_unit_cylinder, intersect_unit_sphere,
    ObjectHit, Ray,
};
use super::tree::DEFAULT_MAX_POLYS_PER_LEAF;
use super::{AabbTree, Hit, PickInfo, TreePolygon};
use crate::attribute::{Attribute, Category};
use crate::geometry::{keys as geometry_keys, Geometry, GeometryAttribute, GeometryId, GeometryKind, GeometryReader};
use crate::scene::{Primitive, SceneComponent, ScenePath, SceneVisitor};

/// Tuning of the pick system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickConfig {
    /// Tree nodes with fewer polygons than this are leaves.
    pub max_polys_per_leaf: usize,
    /// Build per-query trees for face sets without a precomputed tree.
    /// When off, such face sets are tested face by face.
    pub use_aabb_tree: bool,
}

impl Default for PickConfig {
    fn default() -> Self {
        Self {
            max_polys_per_leaf: DEFAULT_MAX_POLYS_PER_LEAF,
            use_aabb_tree: true,
        }
    }
}

/// Computes ranked hits of a ray against a scene.
///
/// Trees built during a query are memoised per geometry for that query
/// only. A tree attached to a geometry as the `AABBTree` attribute is
/// reused across queries.
#[derive(Debug, Default)]
pub struct AabbPickSystem {
    config: PickConfig,
    trees: HashMap<GeometryId, Option<Rc<AabbTree>>>,
}

impl AabbPickSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PickConfig) -> Self {
        Self {
            config,
            trees: HashMap::new(),
        }
    }

    pub fn config(&self) -> &PickConfig {
        &self.config
    }

    /// Hits of the ray `from -> to` in front of `from`, nearest first.
    ///
    /// Both points are homogeneous; `to` may be a direction (`w == 0`).
    pub fn compute_pick(&mut self, root: &SceneComponent, from: &Vector4<f64>, to: &Vector4<f64>) -> Vec<Hit> {
        self.trees.clear();
        let mut traversal = PickTraversal {
            config: self.config,
            trees: &mut self.trees,
            ray: Ray::new(*from, *to),
            path: ScenePath::new(),
            infos: vec![PickInfo::default()],
            hits: Vec::new(),
        };
        root.accept(&mut traversal);

        let mut hits = traversal.hits;
        let total = hits.len();
        hits.retain(|hit| hit.affine() >= 0.0);
        hits.sort_by(|a, b| a.affine().total_cmp(&b.affine()));
        log::debug!("pick found {} hits, {} behind the ray origin", hits.len(), total - hits.len());
        hits
    }
}

/// Traversal-local pick state.
struct PickTraversal<'a> {
    config: PickConfig,
    trees: &'a mut HashMap<GeometryId, Option<Rc<AabbTree>>>,
    ray: Ray,
    path: ScenePath,
    infos: Vec<PickInfo>,
    hits: Vec<Hit>,
}

impl PickTraversal<'_> {
    fn info(&self) -> PickInfo {
        self.infos.last().cloned().unwrap_or_default()
    }

    /// The current object-to-world matrix and the ray in object coordinates.
    fn object_ray(&self) -> Option<(Matrix4<f64>, Ray)> {
        let matrix = self.path.matrix();
        let Some(inverse) = self.path.inverse_matrix() else {
            log::warn!("singular transformation at {:?}, subtree not pickable", self.path.last());
            return None;
        };
        Some((matrix, Ray::new(inverse * self.ray.from, inverse * self.ray.to)))
    }

    fn place(&mut self, hits: Vec<ObjectHit>, matrix: &Matrix4<f64>, geometry: Option<&Rc<Geometry>>) {
        let metric = self.info().metric;
        for hit in hits {
            self.hits.push(Hit::new(
                hit,
                matrix,
                &self.ray,
                metric,
                self.path.clone(),
                geometry.cloned(),
            ));
        }
    }

    /// The tree to use for `geometry`, `None` for brute force.
    fn tree_for(
        &mut self,
        geometry: &Geometry,
        reader: &GeometryReader<'_>,
        vertices: &[Vec<f64>],
        faces: &[Vec<i32>],
    ) -> Option<Rc<AabbTree>> {
        if let Some(attribute) = reader.geometry_attribute(geometry_keys::AABB_TREE)
            && let GeometryAttribute::AabbTree(tree) = &*attribute
        {
            return Some(Rc::clone(tree));
        }
        if !self.config.use_aabb_tree {
            return None;
        }
        let max = self.config.max_polys_per_leaf;
        self.trees
            .entry(geometry.id())
            .or_insert_with(|| {
                let tree = AabbTree::from_faces(vertices, faces, max);
                (!tree.is_null()).then(|| Rc::new(tree))
            })
            .clone()
    }

    fn pick_geometry(&mut self, geometry: &Rc<Geometry>) {
        let Some((matrix, ray)) = self.object_ray() else {
            return;
        };
        let info = self.info();
        let Ok(reader) = geometry.read() else {
            log::warn!("geometry {} is being written, skipped by pick", geometry.id());
            return;
        };
        let Some(vertices) = reader.f64_rows(Category::Vertex, &Attribute::COORDINATES) else {
            return;
        };

        let mut object_hits = Vec::new();
        if info.picks_faces()
            && geometry.kind() == GeometryKind::FaceSet
            && let Some(faces) = reader.i32_rows(Category::Face, &Attribute::INDICES)
        {
            match self.tree_for(geometry, &reader, &vertices, &faces) {
                Some(tree) => tree.intersect(&ray, &mut object_hits),
                None => intersect_polygons(&TreePolygon::from_faces(&vertices, &faces), &ray, &mut object_hits),
            }
        }
        if info.picks_lines()
            && geometry.kind() != GeometryKind::PointSet
            && let Some(edges) = reader.i32_rows(Category::Edge, &Attribute::INDICES)
        {
            let radius = info.object_radius(info.tube_radius, &matrix);
            intersect_edges(&vertices, &edges, radius, &ray, &mut object_hits);
        }
        if info.picks_points() {
            let radii: Option<Vec<f64>> = reader
                .f64_rows(Category::Vertex, &Attribute::RELATIVE_RADII)
                .map(|rows| rows.iter().map(|r| r.first().copied().unwrap_or(1.0)).collect());
            let radius = info.object_radius(info.point_radius, &matrix);
            intersect_points(&vertices, radii.as_deref(), radius, &ray, &mut object_hits);
        }
        drop(reader);
        self.place(object_hits, &matrix, Some(geometry));
    }

    fn pick_primitive(&mut self, intersect: fn(&Ray, &mut Vec<ObjectHit>)) {
        if !self.info().picks_faces() {
            return;
        }
        let Some((matrix, ray)) = self.object_ray() else {
            return;
        };
        let mut object_hits = Vec::new();
        intersect(&ray, &mut object_hits);
        self.place(object_hits, &matrix, None);
    }
}

impl SceneVisitor for PickTraversal<'_> {
    fn visit_component(&mut self, component: &SceneComponent) {
        if !component.is_visible() || !component.is_pickable() {
            return;
        }
        self.path.push(component.name(), component.transformation());
        let info = match component.appearance() {
            Some(appearance) => self.info().inherit(appearance),
            None => self.info(),
        };
        self.infos.push(info);
        component.children_accept(self);
        self.infos.pop();
        self.path.pop();
    }

    fn visit_point_set(&mut self, geometry: &Rc<Geometry>) {
        self.pick_geometry(geometry);
    }

    fn visit_sphere(&mut self, _sphere: &Primitive) {
        self.pick_primitive(intersect_unit_sphere);
    }

    fn visit_cylinder(&mut self, _cylinder: &Primitive) {
        self.pick_primitive(intersect_unit_cylinder);
    }

    fn visit_clipping_plane(&mut self) {}
}
