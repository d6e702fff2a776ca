//! Fixed-shape data list.

use super::storage::{Scalar, Storage};
use super::DataItem;
use crate::error::{GeometryError, Result};

/// A flat typed buffer with a shape `[n, d1, d2, ...]`.
///
/// Element `i` is the sub-array starting at `i * (d1 * d2 * ...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RegularDataList {
    storage: Storage,
    shape: Vec<usize>,
}

impl RegularDataList {
    /// Creates a list with an explicit shape.
    ///
    /// Fails if the product of `shape` differs from the storage length.
    pub fn new(storage: Storage, shape: Vec<usize>) -> Result<Self> {
        let expected = if shape.is_empty() {
            0
        } else {
            shape.iter().product()
        };
        if shape.is_empty() || expected != storage.len() {
            return Err(GeometryError::ShapeMismatch {
                shape,
                expected,
                actual: storage.len(),
            });
        }
        Ok(Self { storage, shape })
    }

    /// Creates an `[len / fiber, fiber]` list from a flat buffer.
    pub fn from_flat(storage: Storage, fiber: usize) -> Result<Self> {
        let len = storage.len();
        if fiber == 0 || len % fiber != 0 {
            return Err(GeometryError::FiberMismatch { len, fiber });
        }
        Ok(Self {
            storage,
            shape: vec![len / fiber, fiber],
        })
    }

    /// Creates a list from equally sized rows. The caller guarantees equal lengths.
    pub(crate) fn from_equal_rows<T: Scalar>(rows: Vec<Vec<T>>) -> Self {
        let n = rows.len();
        let fiber = rows.first().map_or(0, Vec::len);
        let flat: Vec<T> = rows.into_iter().flatten().collect();
        Self {
            storage: T::into_storage(flat),
            shape: vec![n, fiber],
        }
    }

    /// Shape already known to match the storage length.
    pub(crate) fn from_parts(storage: Storage, shape: Vec<usize>) -> Self {
        debug_assert_eq!(shape.iter().product::<usize>(), storage.len());
        Self { storage, shape }
    }

    #[inline]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of elements (first dimension).
    #[inline]
    pub fn len(&self) -> usize {
        self.shape[0]
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of scalars in one element.
    #[inline]
    pub fn fiber_len(&self) -> usize {
        self.shape[1..].iter().product()
    }

    /// Total number of scalars.
    #[inline]
    pub fn size(&self) -> usize {
        self.storage.len()
    }

    pub fn item(&self, index: usize) -> Option<DataItem<'_>> {
        if index >= self.len() {
            return None;
        }
        let fiber = self.fiber_len();
        let start = index * fiber;
        Some(DataItem {
            values: self.storage.slice(start..start + fiber),
            dims: &self.shape[1..],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StorageSlice;

    #[test]
    fn flat_length_must_divide_fiber() {
        let err = RegularDataList::from_flat(Storage::Double(vec![0.0; 7]), 3).unwrap_err();
        assert_eq!(err, GeometryError::FiberMismatch { len: 7, fiber: 3 });
        assert!(RegularDataList::from_flat(Storage::Double(vec![]), 0).is_err());
    }

    #[test]
    fn declared_shape_must_match_data() {
        assert!(RegularDataList::new(Storage::Int(vec![1, 2, 3, 4]), vec![2, 3]).is_err());
        let list = RegularDataList::new(Storage::Int(vec![1, 2, 3, 4, 5, 6]), vec![1, 2, 3]).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.fiber_len(), 6);
    }

    #[test]
    fn item_returns_row_with_sub_shape() {
        let list = RegularDataList::new(Storage::Int((0..12).collect()), vec![2, 2, 3]).unwrap();
        let item = list.item(1).unwrap();
        assert_eq!(item.dims, &[2, 3]);
        assert_eq!(item.values, StorageSlice::Int(&[6, 7, 8, 9, 10, 11]));
        assert!(list.item(2).is_none());
    }

    #[test]
    fn single_fiber_item_is_still_a_row() {
        let list = RegularDataList::from_flat(Storage::Double(vec![1.5, 2.5]), 1).unwrap();
        let item = list.item(1).unwrap();
        assert_eq!(item.values, StorageSlice::Double(&[2.5]));
        assert_eq!(item.dims, &[1]);
    }
}
