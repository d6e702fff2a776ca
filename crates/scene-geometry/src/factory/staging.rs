//! Staging and commit logic shared by every factory.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use super::quad_mesh::QuadShape;
use crate::algo::edges::edges_from_faces;
use crate::algo::normals::{face_normals, grid_vertex_normals, vertex_normals};
use crate::attribute::{Attribute, Category};
use crate::data::DataList;
use crate::error::{GeometryError, Result};
use crate::geometry::{common_count, keys, Geometry, GeometryAttribute, GeometryKind};
use crate::math::Metric;
use crate::pick::{AabbTree, DEFAULT_MAX_POLYS_PER_LEAF};

/// Which derived attributes `update` produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationFlags {
    pub edges_from_faces: bool,
    pub face_normals: bool,
    pub vertex_normals: bool,
    /// Only quad meshes know a parametrisation to derive these from.
    pub texture_coordinates: bool,
    pub vertex_labels: bool,
    pub edge_labels: bool,
    pub face_labels: bool,
    pub aabb_tree: bool,
}

impl GenerationFlags {
    fn labels(&self, category: Category) -> bool {
        match category {
            Category::Vertex => self.vertex_labels,
            Category::Edge => self.edge_labels,
            Category::Face => self.face_labels,
        }
    }
}

/// The geometry as it will look once the staged changes are applied.
struct Snapshot {
    counts: [usize; 3],
    attributes: [BTreeMap<Attribute, DataList>; 3],
    metric: Metric,
    has_aabb_tree: bool,
}

impl Snapshot {
    fn read(geometry: &Geometry) -> Result<Self> {
        let reader = geometry.read()?;
        Ok(Self {
            counts: Category::ALL.map(|c| reader.count(c)),
            attributes: Category::ALL.map(|c| reader.attributes(c)),
            metric: reader.metric(),
            has_aabb_tree: reader.geometry_attribute(keys::AABB_TREE).is_some(),
        })
    }

    fn get(&self, category: Category, key: &Attribute) -> Option<&DataList> {
        self.attributes[category.slot()].get(key)
    }

    fn has(&self, category: Category, key: &Attribute) -> bool {
        self.get(category, key).is_some()
    }

    fn f64_rows(&self, category: Category, key: &Attribute) -> Option<Vec<Vec<f64>>> {
        self.get(category, key).and_then(DataList::as_f64_rows)
    }

    fn i32_rows(&self, category: Category, key: &Attribute) -> Option<Vec<Vec<i32>>> {
        self.get(category, key).and_then(DataList::as_i32_rows)
    }

    fn set_count(&mut self, category: Category, count: usize) {
        let slot = category.slot();
        if self.counts[slot] != count {
            self.counts[slot] = count;
            self.attributes[slot].clear();
        }
    }
}

/// What changed relative to the committed geometry.
#[derive(Default)]
struct Changes {
    counts: [bool; 3],
    attributes: BTreeSet<(Category, Attribute)>,
    metric: bool,
}

impl Changes {
    fn touched(&self, category: Category, key: &Attribute) -> bool {
        self.counts[category.slot()] || self.attributes.contains(&(category, key.clone()))
    }

    fn mark(&mut self, category: Category, key: Attribute) {
        self.attributes.insert((category, key));
    }
}

/// Derived data computed from a snapshot, written after the user data.
#[derive(Default)]
struct Derived {
    edges: Option<Vec<Vec<i32>>>,
    clear_edges: bool,
    set: Vec<(Category, Attribute, DataList)>,
    remove: Vec<(Category, Attribute)>,
    geometry_attributes: Vec<(&'static str, Option<GeometryAttribute>)>,
}

/// Pending attribute writes for one geometry plus the flags controlling
/// what is derived from them.
///
/// Setters only stage values; [`FactoryCore::update`] validates the staged
/// state, derives dependent attributes and applies everything in a single
/// writer section, so listeners see one event per update.
#[derive(Debug)]
pub struct FactoryCore {
    geometry: Rc<Geometry>,
    counts: [Option<usize>; 3],
    pending: [BTreeMap<Attribute, DataList>; 3],
    removed: [BTreeSet<Attribute>; 3],
    /// Attributes the caller provided; never overwritten by generators.
    supplied: [BTreeSet<Attribute>; 3],
    generated: [BTreeSet<Attribute>; 3],
    aabb_tree_generated: bool,
    metric: Option<Metric>,
    flags: GenerationFlags,
    max_polys_per_leaf: usize,
    quad: Option<QuadShape>,
    quad_dirty: bool,
}

impl FactoryCore {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry: Rc::new(geometry),
            counts: [None; 3],
            pending: Default::default(),
            removed: Default::default(),
            supplied: Default::default(),
            generated: Default::default(),
            aabb_tree_generated: false,
            metric: None,
            flags: GenerationFlags::default(),
            max_polys_per_leaf: DEFAULT_MAX_POLYS_PER_LEAF,
            quad: None,
            quad_dirty: false,
        }
    }

    pub fn geometry(&self) -> Rc<Geometry> {
        Rc::clone(&self.geometry)
    }

    pub fn kind(&self) -> GeometryKind {
        self.geometry.kind()
    }

    pub fn flags(&self) -> &GenerationFlags {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> &mut GenerationFlags {
        &mut self.flags
    }

    pub fn set_max_polys_per_leaf(&mut self, max: usize) {
        self.max_polys_per_leaf = max.max(1);
    }

    pub fn set_metric(&mut self, metric: Metric) {
        self.metric = Some(metric);
    }

    /// The count that staged data of `category` must match, if one is known.
    fn expected_count(&self, category: Category) -> Result<Option<usize>> {
        if let Some(count) = self.counts[category.slot()] {
            return Ok(Some(count));
        }
        let current = self.geometry.read()?.count(category);
        Ok((current > 0).then_some(current))
    }

    fn check_category(&self, category: Category) -> Result<()> {
        let kind = self.kind();
        if kind.supports(category) {
            Ok(())
        } else {
            Err(GeometryError::UnsupportedCategory { kind, category })
        }
    }

    pub fn set_count(&mut self, category: Category, count: usize) -> Result<()> {
        self.check_category(category)?;
        if category != Category::Vertex && self.quad.is_some() {
            return Err(GeometryError::DerivedTopology { category });
        }
        self.counts[category.slot()] = Some(count);
        Ok(())
    }

    pub fn count(&self, category: Category) -> Result<usize> {
        match self.counts[category.slot()] {
            Some(count) => Ok(count),
            None => Ok(self.geometry.read()?.count(category)),
        }
    }

    /// Stages `data` for `key`, checking it against the known count.
    ///
    /// Without a count the first staged attribute of a category sets it.
    pub fn stage(&mut self, category: Category, key: Attribute, data: DataList) -> Result<()> {
        self.check_category(category)?;
        if category != Category::Vertex && key == Attribute::INDICES && self.quad.is_some() {
            return Err(GeometryError::DerivedTopology { category });
        }
        self.stage_unchecked(category, key, data)
    }

    pub(crate) fn stage_unchecked(&mut self, category: Category, key: Attribute, data: DataList) -> Result<()> {
        let slot = category.slot();
        match self.expected_count(category)? {
            Some(expected) if expected != data.len() => {
                return Err(GeometryError::CountMismatch {
                    category,
                    attribute: key,
                    expected,
                    actual: data.len(),
                });
            }
            Some(_) => {}
            None => self.counts[slot] = Some(data.len()),
        }
        self.removed[slot].remove(&key);
        self.generated[slot].remove(&key);
        self.supplied[slot].insert(key.clone());
        self.pending[slot].insert(key, data);
        Ok(())
    }

    /// Stages the removal of `key`. Generators may produce it again.
    pub fn unset(&mut self, category: Category, key: &Attribute) {
        let slot = category.slot();
        self.pending[slot].remove(key);
        self.supplied[slot].remove(key);
        self.removed[slot].insert(key.clone());
    }

    /// Stages indices derived by the factory itself, resizing the category.
    pub(crate) fn stage_topology(&mut self, category: Category, data: DataList) -> Result<()> {
        self.counts[category.slot()] = Some(data.len());
        self.stage_unchecked(category, Attribute::INDICES, data)
    }

    pub(crate) fn set_quad_shape(&mut self, shape: QuadShape) {
        if self.quad != Some(shape) {
            self.quad = Some(shape);
            self.quad_dirty = true;
        }
    }

    pub(crate) fn quad_shape(&self) -> Option<QuadShape> {
        self.quad
    }

    pub(crate) fn quad_dirty(&self) -> bool {
        self.quad_dirty
    }

    fn validate(&self) -> Result<()> {
        for category in Category::ALL {
            let slot = category.slot();
            let pending = &self.pending[slot];
            if let Some(count) = self.counts[slot]
                && pending.values().any(|list| list.len() != count)
            {
                return Err(GeometryError::InconsistentPending {
                    category,
                    counts: pending.iter().map(|(key, list)| (key.clone(), list.len())).collect(),
                });
            }
            common_count(category, pending)?;
        }
        Ok(())
    }

    /// Applies every staged change and regenerates derived attributes
    /// whose inputs changed.
    pub fn update(&mut self) -> Result<()> {
        self.validate()?;

        let mut snapshot = Snapshot::read(&self.geometry)?;
        let bookkeeping = (self.supplied.clone(), self.generated.clone(), self.aabb_tree_generated);
        let mut changes = Changes::default();
        for category in Category::ALL {
            let slot = category.slot();
            if let Some(count) = self.counts[slot]
                && count != snapshot.counts[slot]
            {
                snapshot.set_count(category, count);
                changes.counts[slot] = true;
                let pending = &self.pending[slot];
                self.supplied[slot].retain(|key| pending.contains_key(key));
                self.generated[slot].clear();
            }
            for key in &self.removed[slot] {
                if snapshot.attributes[slot].remove(key).is_some() {
                    changes.mark(category, key.clone());
                }
            }
            for (key, list) in &self.pending[slot] {
                snapshot.attributes[slot].insert(key.clone(), list.clone());
                changes.mark(category, key.clone());
            }
        }
        if let Some(metric) = self.metric
            && metric != snapshot.metric
        {
            snapshot.metric = metric;
            changes.metric = true;
        }

        let derived = self.derive(&mut snapshot, &changes);
        if let Err(err) = self.check_final_counts(&snapshot, &derived) {
            (self.supplied, self.generated, self.aabb_tree_generated) = bookkeeping;
            return Err(err);
        }
        self.apply(derived)?;

        self.counts = [None; 3];
        self.metric = None;
        self.quad_dirty = false;
        for slot in 0..3 {
            self.pending[slot].clear();
            self.removed[slot].clear();
        }
        Ok(())
    }

    /// Whether a generator should run, queuing the removal of its output
    /// when it has been switched off.
    fn wants(
        &mut self,
        category: Category,
        key: &Attribute,
        enabled: bool,
        dirty: bool,
        snapshot: &Snapshot,
        derived: &mut Derived,
    ) -> bool {
        let slot = category.slot();
        if self.supplied[slot].contains(key) {
            return false;
        }
        if !enabled {
            if self.generated[slot].remove(key) && snapshot.has(category, key) {
                derived.remove.push((category, key.clone()));
            }
            return false;
        }
        dirty || !snapshot.has(category, key)
    }

    fn derive(&mut self, snapshot: &mut Snapshot, changes: &Changes) -> Derived {
        let mut derived = Derived::default();
        let is_face_set = self.kind() == GeometryKind::FaceSet;
        let metric = snapshot.metric;
        let coordinates = snapshot.f64_rows(Category::Vertex, &Attribute::COORDINATES);
        let faces = snapshot.i32_rows(Category::Face, &Attribute::INDICES);
        let faces_dirty = changes.touched(Category::Face, &Attribute::INDICES) || self.quad_dirty;
        let shape_dirty = changes.touched(Category::Vertex, &Attribute::COORDINATES) || faces_dirty || changes.metric;

        if is_face_set {
            let enabled = self.flags.edges_from_faces && faces.is_some();
            if self.wants(Category::Edge, &Attribute::INDICES, enabled, faces_dirty, snapshot, &mut derived) {
                let edges: Vec<Vec<i32>> = match (self.quad, &faces) {
                    (Some(shape), _) => shape.edge_indices(),
                    (None, Some(faces)) => edges_from_faces(faces).into_iter().map(Vec::from).collect(),
                    (None, None) => Vec::new(),
                };
                snapshot.set_count(Category::Edge, edges.len());
                snapshot.attributes[Category::Edge.slot()]
                    .insert(Attribute::INDICES, DataList::from(edges.clone()));
                self.generated[Category::Edge.slot()].insert(Attribute::INDICES);
                derived.edges = Some(edges);
            } else if derived.remove.iter().any(|(c, k)| *c == Category::Edge && *k == Attribute::INDICES) {
                derived.remove.retain(|(c, k)| !(*c == Category::Edge && *k == Attribute::INDICES));
                snapshot.set_count(Category::Edge, 0);
                derived.clear_edges = true;
            }
        }

        let mut face_normals_changed = changes.touched(Category::Face, &Attribute::NORMALS);
        if is_face_set {
            let enabled = self.flags.face_normals && coordinates.is_some() && faces.is_some();
            if self.wants(Category::Face, &Attribute::NORMALS, enabled, shape_dirty, snapshot, &mut derived)
                && let (Some(vertices), Some(faces)) = (&coordinates, &faces)
            {
                let normals = DataList::from(face_normals(vertices, faces, metric));
                snapshot.attributes[Category::Face.slot()].insert(Attribute::NORMALS, normals.clone());
                self.generated[Category::Face.slot()].insert(Attribute::NORMALS);
                derived.set.push((Category::Face, Attribute::NORMALS, normals));
                face_normals_changed = true;
            }

            let enabled = self.flags.vertex_normals && coordinates.is_some() && faces.is_some();
            let dirty = shape_dirty || face_normals_changed;
            if self.wants(Category::Vertex, &Attribute::NORMALS, enabled, dirty, snapshot, &mut derived)
                && let (Some(vertices), Some(faces)) = (&coordinates, &faces)
            {
                let rows = match self.quad {
                    Some(shape) => grid_vertex_normals(
                        vertices,
                        shape.u_lines,
                        shape.v_lines,
                        shape.closed_u,
                        shape.closed_v,
                        metric,
                    ),
                    None => {
                        let per_face = snapshot
                            .f64_rows(Category::Face, &Attribute::NORMALS)
                            .filter(|normals| normals.len() == faces.len())
                            .unwrap_or_else(|| face_normals(vertices, faces, metric));
                        vertex_normals(vertices.len(), faces, &per_face, metric)
                    }
                };
                let normals = DataList::from(rows);
                self.generated[Category::Vertex.slot()].insert(Attribute::NORMALS);
                derived.set.push((Category::Vertex, Attribute::NORMALS, normals));
            }
        }

        let enabled = self.flags.texture_coordinates && self.quad.is_some();
        let dirty = self.quad_dirty || changes.counts[Category::Vertex.slot()];
        if self.wants(Category::Vertex, &Attribute::TEXTURE_COORDINATES, enabled, dirty, snapshot, &mut derived)
            && let Some(shape) = self.quad
        {
            let uv = DataList::from(shape.texture_coordinates());
            self.generated[Category::Vertex.slot()].insert(Attribute::TEXTURE_COORDINATES);
            derived.set.push((Category::Vertex, Attribute::TEXTURE_COORDINATES, uv));
        }

        for category in Category::ALL {
            if !self.kind().supports(category) {
                continue;
            }
            let count = snapshot.counts[category.slot()];
            let enabled = self.flags.labels(category) && count > 0;
            let dirty = changes.counts[category.slot()] || (category == Category::Edge && derived.edges.is_some());
            if self.wants(category, &Attribute::LABELS, enabled, dirty, snapshot, &mut derived) {
                let labels: Vec<String> = (0..count).map(|i| i.to_string()).collect();
                self.generated[category.slot()].insert(Attribute::LABELS);
                derived.set.push((category, Attribute::LABELS, DataList::from(labels)));
            }
        }

        if is_face_set {
            let enabled = self.flags.aabb_tree && coordinates.is_some() && faces.is_some();
            if !enabled {
                if self.aabb_tree_generated && snapshot.has_aabb_tree {
                    derived.geometry_attributes.push((keys::AABB_TREE, None));
                }
                self.aabb_tree_generated = false;
            } else if (shape_dirty || !snapshot.has_aabb_tree)
                && let (Some(vertices), Some(faces)) = (&coordinates, &faces)
            {
                let tree = AabbTree::from_faces(vertices, faces, self.max_polys_per_leaf);
                self.aabb_tree_generated = true;
                derived
                    .geometry_attributes
                    .push((keys::AABB_TREE, Some(GeometryAttribute::AabbTree(Rc::new(tree)))));
            }
        }

        if self.quad_dirty
            && let Some(shape) = self.quad
        {
            derived.geometry_attributes.push((
                keys::QUAD_MESH_SHAPE,
                Some(GeometryAttribute::QuadMeshShape {
                    u_lines: shape.u_lines,
                    v_lines: shape.v_lines,
                }),
            ));
        }
        derived
    }

    /// Rejects attributes whose length disagrees with the counts the update
    /// leaves behind. Runs before the writer opens, so a failed update
    /// writes nothing.
    fn check_final_counts(&self, snapshot: &Snapshot, derived: &Derived) -> Result<()> {
        let staged = Category::ALL
            .into_iter()
            .flat_map(|category| self.pending[category.slot()].iter().map(move |(key, list)| (category, key, list)));
        let generated = derived.set.iter().map(|(category, key, list)| (*category, key, list));
        for (category, key, list) in staged.chain(generated) {
            let expected = snapshot.counts[category.slot()];
            if list.len() != expected {
                return Err(GeometryError::CountMismatch {
                    category,
                    attribute: key.clone(),
                    expected,
                    actual: list.len(),
                });
            }
        }
        Ok(())
    }

    fn apply(&mut self, derived: Derived) -> Result<()> {
        let writer = self.geometry.write()?;
        let edges_replaced = derived.edges.is_some() || derived.clear_edges;
        for category in Category::ALL {
            let slot = category.slot();
            if category == Category::Edge && edges_replaced {
                continue;
            }
            if let Some(count) = self.counts[slot] {
                writer.set_count(category, count)?;
            }
            for key in &self.removed[slot] {
                writer.remove_attribute(category, key);
            }
        }
        if let Some(edges) = derived.edges {
            writer.set_count(Category::Edge, edges.len())?;
            writer.set_attribute(Category::Edge, Attribute::INDICES, DataList::from(edges))?;
        } else if derived.clear_edges {
            writer.set_count(Category::Edge, 0)?;
        }
        if edges_replaced {
            for key in &self.removed[Category::Edge.slot()] {
                writer.remove_attribute(Category::Edge, key);
            }
        }
        for category in Category::ALL {
            let pending = std::mem::take(&mut self.pending[category.slot()]);
            if !pending.is_empty() {
                writer.set_attributes(category, pending)?;
            }
        }
        if let Some(metric) = self.metric {
            writer.set_geometry_attribute(keys::METRIC, GeometryAttribute::Metric(metric));
        }
        for (category, key) in derived.remove {
            writer.remove_attribute(category, &key);
        }
        for (category, key, data) in derived.set {
            writer.set_attribute(category, key, data)?;
        }
        for (key, value) in derived.geometry_attributes {
            match value {
                Some(value) => writer.set_geometry_attribute(key, value),
                None => {
                    writer.remove_geometry_attribute(key);
                }
            }
        }
        Ok(())
    }
}
