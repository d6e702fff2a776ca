//! Reader/writer sections and batched change notification.
//!
//! The lock does not provide parallelism. It detects illegal reentrancy:
//! a writer cannot start while a reader is active and vice versa. Nested
//! readers and nested writers are allowed. Changes recorded during a
//! writer section are delivered to listeners once, when the outermost
//! writer guard is dropped.

use std::cell::{Cell, Ref, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use super::{Geometry, GeometryAttribute, GeometryId, GeometryState};
use crate::attribute::{Attribute, Category};
use crate::data::DataList;
use crate::error::{GeometryError, Result};
use crate::math::Metric;

#[derive(Debug, Default)]
pub(crate) struct LockState {
    readers: Cell<usize>,
    writers: Cell<usize>,
}

/// Everything that changed during one writer section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryEvent {
    source: Option<GeometryId>,
    counts: BTreeSet<Category>,
    attributes: [BTreeSet<Attribute>; 3],
    geometry_attributes: BTreeSet<String>,
}

impl GeometryEvent {
    pub fn source(&self) -> Option<GeometryId> {
        self.source
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
            && self.attributes.iter().all(BTreeSet::is_empty)
            && self.geometry_attributes.is_empty()
    }

    /// Categories whose count changed.
    pub fn changed_counts(&self) -> &BTreeSet<Category> {
        &self.counts
    }

    /// Attribute keys written or removed in a category.
    pub fn changed_attributes(&self, category: Category) -> &BTreeSet<Attribute> {
        &self.attributes[category.slot()]
    }

    pub fn changed_geometry_attributes(&self) -> &BTreeSet<String> {
        &self.geometry_attributes
    }
}

/// An active reader section. Writes are rejected while it lives.
pub struct GeometryReader<'a> {
    geometry: &'a Geometry,
}

impl std::fmt::Debug for GeometryReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeometryReader").field("geometry", &self.geometry.id()).finish()
    }
}

impl<'a> GeometryReader<'a> {
    pub(crate) fn acquire(geometry: &'a Geometry) -> Result<Self> {
        if geometry.lock.writers.get() > 0 {
            return Err(GeometryError::WriteInProgress(geometry.id()));
        }
        geometry.lock.readers.set(geometry.lock.readers.get() + 1);
        Ok(Self { geometry })
    }

    fn state(&self) -> Ref<'_, GeometryState> {
        self.geometry.state.borrow()
    }

    pub fn count(&self, category: Category) -> usize {
        self.state().stores[category.slot()].count()
    }

    pub fn vertex_count(&self) -> usize {
        self.count(Category::Vertex)
    }

    pub fn edge_count(&self) -> usize {
        self.count(Category::Edge)
    }

    pub fn face_count(&self) -> usize {
        self.count(Category::Face)
    }

    pub fn attribute(&self, category: Category, key: &Attribute) -> Option<Ref<'_, DataList>> {
        Ref::filter_map(self.state(), |s| s.stores[category.slot()].get(key)).ok()
    }

    pub fn has_attribute(&self, category: Category, key: &Attribute) -> bool {
        self.state().stores[category.slot()].get(key).is_some()
    }

    /// Keys of all attributes in a category.
    pub fn attribute_keys(&self, category: Category) -> Vec<Attribute> {
        self.state().stores[category.slot()]
            .attributes()
            .keys()
            .cloned()
            .collect()
    }

    /// A copy of all attributes in a category.
    pub fn attributes(&self, category: Category) -> BTreeMap<Attribute, DataList> {
        self.state().stores[category.slot()].attributes().clone()
    }

    pub fn geometry_attribute(&self, key: &str) -> Option<Ref<'_, GeometryAttribute>> {
        Ref::filter_map(self.state(), |s| s.attributes.get(key)).ok()
    }

    pub fn metric(&self) -> Metric {
        match self.state().attributes.get(super::keys::METRIC) {
            Some(GeometryAttribute::Metric(metric)) => *metric,
            _ => Metric::default(),
        }
    }

    /// Numeric rows of an attribute.
    pub fn f64_rows(&self, category: Category, key: &Attribute) -> Option<Vec<Vec<f64>>> {
        self.attribute(category, key)?.as_f64_rows()
    }

    /// Integer rows of an attribute.
    pub fn i32_rows(&self, category: Category, key: &Attribute) -> Option<Vec<Vec<i32>>> {
        self.attribute(category, key)?.as_i32_rows()
    }

    /// Vertex indices of face `index`.
    pub fn face(&self, index: usize) -> Option<Vec<i32>> {
        self.attribute(Category::Face, &Attribute::INDICES)?
            .item(index)?
            .values
            .to_i32_vec()
    }

    /// Vertex indices of polyline `index`.
    pub fn edge(&self, index: usize) -> Option<Vec<i32>> {
        self.attribute(Category::Edge, &Attribute::INDICES)?
            .item(index)?
            .values
            .to_i32_vec()
    }

    /// True when every face has exactly `arity` vertices.
    pub fn faces_have_arity(&self, arity: usize) -> bool {
        match self.attribute(Category::Face, &Attribute::INDICES) {
            Some(faces) => {
                let stats = faces.length_stats();
                faces.is_empty() || (stats.min == arity && stats.max == arity)
            }
            None => false,
        }
    }

    pub fn is_triangulated(&self) -> bool {
        self.faces_have_arity(3)
    }

    pub fn is_quadrilateral(&self) -> bool {
        self.faces_have_arity(4)
    }
}

impl Drop for GeometryReader<'_> {
    fn drop(&mut self) {
        let readers = &self.geometry.lock.readers;
        readers.set(readers.get() - 1);
    }
}

/// An active writer section. Reads and foreign writers are rejected while
/// it lives; its changes are reported when the outermost writer ends.
pub struct GeometryWriter<'a> {
    geometry: &'a Geometry,
}

impl std::fmt::Debug for GeometryWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeometryWriter").field("geometry", &self.geometry.id()).finish()
    }
}

impl<'a> GeometryWriter<'a> {
    pub(crate) fn acquire(geometry: &'a Geometry) -> Result<Self> {
        if geometry.lock.readers.get() > 0 {
            return Err(GeometryError::ReadInProgress(geometry.id()));
        }
        geometry.lock.writers.set(geometry.lock.writers.get() + 1);
        Ok(Self { geometry })
    }

    fn check_category(&self, category: Category) -> Result<()> {
        let kind = self.geometry.kind();
        if kind.supports(category) {
            Ok(())
        } else {
            Err(GeometryError::UnsupportedCategory { kind, category })
        }
    }

    fn record(&self, f: impl FnOnce(&mut GeometryEvent)) {
        f(&mut self.geometry.pending.borrow_mut());
    }

    fn record_removed(&self, category: Category, removed: Vec<Attribute>) {
        if !removed.is_empty() {
            self.record(|e| e.attributes[category.slot()].extend(removed));
        }
    }

    /// Sets the element count of a category, clearing its attributes if the count changes.
    pub fn set_count(&self, category: Category, count: usize) -> Result<()> {
        self.check_category(category)?;
        let before = self.geometry.state.borrow().stores[category.slot()].count();
        let removed = self.geometry.state.borrow_mut().stores[category.slot()].set_count(count);
        if before != count {
            self.record(|e| {
                e.counts.insert(category);
            });
        }
        self.record_removed(category, removed);
        Ok(())
    }

    pub fn set_attribute(&self, category: Category, key: Attribute, data: DataList) -> Result<()> {
        self.check_category(category)?;
        let before = self.geometry.state.borrow().stores[category.slot()].count();
        self.geometry.state.borrow_mut().stores[category.slot()].set(category, key.clone(), data)?;
        self.record(|e| {
            if before == 0 {
                e.counts.insert(category);
            }
            e.attributes[category.slot()].insert(key);
        });
        Ok(())
    }

    /// Sets several attributes of one category atomically.
    pub fn set_attributes(&self, category: Category, data: BTreeMap<Attribute, DataList>) -> Result<()> {
        self.check_category(category)?;
        let keys: Vec<Attribute> = data.keys().cloned().collect();
        self.geometry.state.borrow_mut().stores[category.slot()].set_all(category, data)?;
        self.record(|e| e.attributes[category.slot()].extend(keys));
        Ok(())
    }

    /// Takes the count from the attributes themselves and stores them.
    pub fn set_count_and_attributes(
        &self,
        category: Category,
        data: BTreeMap<Attribute, DataList>,
    ) -> Result<()> {
        self.check_category(category)?;
        let keys: Vec<Attribute> = data.keys().cloned().collect();
        let removed = self.geometry.state.borrow_mut().stores[category.slot()]
            .set_count_and_all(category, data)?;
        self.record(|e| {
            e.counts.insert(category);
            e.attributes[category.slot()].extend(keys);
        });
        self.record_removed(category, removed);
        Ok(())
    }

    pub fn remove_attribute(&self, category: Category, key: &Attribute) -> Option<DataList> {
        let removed = self.geometry.state.borrow_mut().stores[category.slot()].remove(key);
        if removed.is_some() {
            self.record(|e| {
                e.attributes[category.slot()].insert(key.clone());
            });
        }
        removed
    }

    pub fn set_geometry_attribute(&self, key: impl Into<String>, value: GeometryAttribute) {
        let key = key.into();
        self.geometry.state.borrow_mut().attributes.insert(key.clone(), value);
        self.record(|e| {
            e.geometry_attributes.insert(key);
        });
    }

    pub fn remove_geometry_attribute(&self, key: &str) -> Option<GeometryAttribute> {
        let removed = self.geometry.state.borrow_mut().attributes.remove(key);
        if removed.is_some() {
            self.record(|e| {
                e.geometry_attributes.insert(key.to_string());
            });
        }
        removed
    }
}

impl Drop for GeometryWriter<'_> {
    fn drop(&mut self) {
        let writers = &self.geometry.lock.writers;
        writers.set(writers.get() - 1);
        if writers.get() == 0 {
            let mut event = std::mem::take(&mut *self.geometry.pending.borrow_mut());
            if !event.is_empty() {
                event.source = Some(self.geometry.id());
                self.geometry.notify(&event);
            }
        }
    }
}
