//! Per-category attribute storage with count validation.

use std::collections::BTreeMap;

use crate::attribute::{Attribute, Category};
use crate::data::DataList;
use crate::error::{GeometryError, Result};

/// The element count of one category plus its named attributes.
///
/// Invariant: every stored list has exactly `count` elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeStore {
    count: usize,
    attributes: BTreeMap<Attribute, DataList>,
}

impl AttributeStore {
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn get(&self, key: &Attribute) -> Option<&DataList> {
        self.attributes.get(key)
    }

    #[inline]
    pub fn attributes(&self) -> &BTreeMap<Attribute, DataList> {
        &self.attributes
    }

    /// Changes the count. A different count drops every attribute.
    ///
    /// Returns the keys that were removed.
    pub fn set_count(&mut self, count: usize) -> Vec<Attribute> {
        if count == self.count {
            return Vec::new();
        }
        self.count = count;
        std::mem::take(&mut self.attributes).into_keys().collect()
    }

    /// Checks `data` against the current count without storing it.
    pub fn validate(&self, category: Category, key: &Attribute, data: &DataList) -> Result<()> {
        if self.count != 0 && data.len() != self.count {
            return Err(GeometryError::CountMismatch {
                category,
                attribute: key.clone(),
                expected: self.count,
                actual: data.len(),
            });
        }
        Ok(())
    }

    /// Stores one attribute. An empty store adopts the attribute's count.
    pub fn set(&mut self, category: Category, key: Attribute, data: DataList) -> Result<()> {
        self.validate(category, &key, &data)?;
        if self.count == 0 {
            self.count = data.len();
        }
        self.attributes.insert(key, data);
        Ok(())
    }

    /// Stores several attributes, all or none.
    pub fn set_all(&mut self, category: Category, data: BTreeMap<Attribute, DataList>) -> Result<()> {
        let count = if self.count == 0 {
            common_count(category, &data)?.unwrap_or(0)
        } else {
            self.count
        };
        for (key, list) in &data {
            if list.len() != count {
                return Err(GeometryError::CountMismatch {
                    category,
                    attribute: key.clone(),
                    expected: count,
                    actual: list.len(),
                });
            }
        }
        self.count = count;
        self.attributes.extend(data);
        Ok(())
    }

    /// Resizes to the attributes' common count and stores them.
    ///
    /// Returns the keys removed by the resize.
    pub fn set_count_and_all(
        &mut self,
        category: Category,
        data: BTreeMap<Attribute, DataList>,
    ) -> Result<Vec<Attribute>> {
        let Some(count) = common_count(category, &data)? else {
            return Ok(Vec::new());
        };
        let removed = self.set_count(count);
        self.attributes.extend(data);
        Ok(removed)
    }

    pub fn remove(&mut self, key: &Attribute) -> Option<DataList> {
        self.attributes.remove(key)
    }
}

/// The element count shared by every list, `None` for an empty map.
pub(crate) fn common_count(
    category: Category,
    data: &BTreeMap<Attribute, DataList>,
) -> Result<Option<usize>> {
    let Some(first) = data.values().next().map(DataList::len) else {
        return Ok(None);
    };
    if data.values().all(|list| list.len() == first) {
        Ok(Some(first))
    } else {
        Err(GeometryError::InconsistentPending {
            category,
            counts: data.iter().map(|(key, list)| (key.clone(), list.len())).collect(),
        })
    }
}
