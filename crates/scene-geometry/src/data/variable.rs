//! Jagged data list.

use super::storage::{Scalar, Storage};
use super::DataItem;
use crate::error::{GeometryError, Result};

/// Row-length statistics of a variable data list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthStats {
    pub min: usize,
    pub max: usize,
    pub avg: f64,
}

/// Independently sized rows packed into one flat buffer.
///
/// Used for faces of mixed arity and polylines of mixed vertex count.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDataList {
    storage: Storage,
    /// `offsets[i]..offsets[i + 1]` is row `i`.
    offsets: Vec<usize>,
}

impl VariableDataList {
    /// Creates a list from a flat buffer and per-row lengths.
    pub fn new(storage: Storage, row_lengths: &[usize]) -> Result<Self> {
        let mut offsets = Vec::with_capacity(row_lengths.len() + 1);
        offsets.push(0);
        let mut total = 0;
        for len in row_lengths {
            total += len;
            offsets.push(total);
        }
        if total != storage.len() {
            return Err(GeometryError::ShapeMismatch {
                shape: row_lengths.to_vec(),
                expected: total,
                actual: storage.len(),
            });
        }
        Ok(Self { storage, offsets })
    }

    pub fn from_rows<T: Scalar>(rows: Vec<Vec<T>>) -> Self {
        let mut offsets = Vec::with_capacity(rows.len() + 1);
        offsets.push(0);
        let mut flat = Vec::with_capacity(rows.iter().map(Vec::len).sum());
        for row in rows {
            flat.extend(row);
            offsets.push(flat.len());
        }
        Self {
            storage: T::into_storage(flat),
            offsets,
        }
    }

    #[inline]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.storage.len()
    }

    pub fn row_len(&self, index: usize) -> Option<usize> {
        (index < self.len()).then(|| self.offsets[index + 1] - self.offsets[index])
    }

    pub fn item(&self, index: usize) -> Option<DataItem<'_>> {
        if index >= self.len() {
            return None;
        }
        Some(DataItem {
            values: self.storage.slice(self.offsets[index]..self.offsets[index + 1]),
            dims: &[],
        })
    }

    /// Minimum, maximum and average row length. All zero for an empty list.
    pub fn length_stats(&self) -> LengthStats {
        let n = self.len();
        if n == 0 {
            return LengthStats {
                min: 0,
                max: 0,
                avg: 0.0,
            };
        }
        let lengths = self.offsets.windows(2).map(|w| w[1] - w[0]);
        let (min, max) = lengths.fold((usize::MAX, 0), |(lo, hi), len| (lo.min(len), hi.max(len)));
        LengthStats {
            min,
            max,
            avg: self.size() as f64 / n as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StorageSlice;

    #[test]
    fn rows_keep_their_lengths() {
        let list = VariableDataList::from_rows(vec![vec![0, 1, 2], vec![2, 3, 4, 5], vec![]]);
        assert_eq!(list.len(), 3);
        assert_eq!(list.size(), 7);
        assert_eq!(list.row_len(0), Some(3));
        assert_eq!(list.row_len(1), Some(4));
        assert_eq!(list.row_len(2), Some(0));
        assert_eq!(list.item(1).unwrap().values, StorageSlice::Int(&[2, 3, 4, 5]));
    }

    #[test]
    fn row_lengths_must_cover_storage() {
        assert!(VariableDataList::new(Storage::Int(vec![0, 1, 2]), &[1, 1]).is_err());
        assert!(VariableDataList::new(Storage::Int(vec![0, 1, 2]), &[1, 2]).is_ok());
    }

    #[test]
    fn length_stats_reports_min_max_avg() {
        let list = VariableDataList::from_rows(vec![vec![0, 1, 2], vec![0, 1, 2, 3, 4]]);
        let stats = list.length_stats();
        assert_eq!(stats.min, 3);
        assert_eq!(stats.max, 5);
        assert!((stats.avg - 4.0).abs() < 1e-12);
    }
}
