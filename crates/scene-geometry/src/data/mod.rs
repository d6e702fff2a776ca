//! Typed attribute containers.
//!
//! A [`DataList`] stores per-element attribute data either as a
//! fixed-shape flat buffer ([`RegularDataList`], every element has the
//! same fiber length) or as jagged rows ([`VariableDataList`], e.g. faces
//! of mixed arity). Geometry entities store one data list per attribute.
//!
//! ```ignore
//! let coords = DataList::from(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
//! let faces = DataList::from(vec![vec![0, 1, 2], vec![0, 2, 3, 4]]); // jagged
//! assert!(faces.is_variable());
//! ```

mod color;
mod regular;
mod storage;
mod variable;

pub use color::Color;
pub use regular::RegularDataList;
pub use storage::{ObjectRef, Scalar, Storage, StorageSlice};
pub use variable::{LengthStats, VariableDataList};

use crate::error::{GeometryError, Result};

/// One element of a data list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataItem<'a> {
    pub values: StorageSlice<'a>,
    /// Shape of the element for regular lists, empty for jagged rows.
    pub dims: &'a [usize],
}

/// Attribute data of either storage layout.
#[derive(Debug, Clone, PartialEq)]
pub enum DataList {
    Regular(RegularDataList),
    Variable(VariableDataList),
}

impl DataList {
    /// Builds a regular list when all rows share one length, otherwise a variable one.
    pub fn from_rows<T: Scalar>(rows: Vec<Vec<T>>) -> Self {
        let first = rows.first().map(Vec::len);
        if rows.iter().all(|r| Some(r.len()) == first) {
            DataList::Regular(RegularDataList::from_equal_rows(rows))
        } else {
            DataList::Variable(VariableDataList::from_rows(rows))
        }
    }

    /// Builds a regular list from a flat buffer.
    pub fn from_flat<T: Scalar>(values: Vec<T>, fiber: usize) -> Result<Self> {
        RegularDataList::from_flat(T::into_storage(values), fiber).map(DataList::Regular)
    }

    /// Builds a regular list with an explicit shape.
    pub fn with_shape<T: Scalar>(values: Vec<T>, shape: Vec<usize>) -> Result<Self> {
        RegularDataList::new(T::into_storage(values), shape).map(DataList::Regular)
    }

    /// Number of elements (rows).
    pub fn len(&self) -> usize {
        match self {
            DataList::Regular(l) => l.len(),
            DataList::Variable(l) => l.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of scalars.
    pub fn size(&self) -> usize {
        self.storage().len()
    }

    pub fn storage(&self) -> &Storage {
        match self {
            DataList::Regular(l) => l.storage(),
            DataList::Variable(l) => l.storage(),
        }
    }

    #[inline]
    pub fn is_variable(&self) -> bool {
        matches!(self, DataList::Variable(_))
    }

    /// Common element length of a regular list.
    pub fn fiber_len(&self) -> Option<usize> {
        match self {
            DataList::Regular(l) => Some(l.fiber_len()),
            DataList::Variable(_) => None,
        }
    }

    pub fn row_len(&self, index: usize) -> Option<usize> {
        match self {
            DataList::Regular(l) => (index < l.len()).then(|| l.fiber_len()),
            DataList::Variable(l) => l.row_len(index),
        }
    }

    /// The `index`-th element as a row, never a bare scalar.
    pub fn item(&self, index: usize) -> Option<DataItem<'_>> {
        match self {
            DataList::Regular(l) => l.item(index),
            DataList::Variable(l) => l.item(index),
        }
    }

    pub fn length_stats(&self) -> LengthStats {
        match self {
            DataList::Regular(l) => LengthStats {
                min: l.fiber_len(),
                max: l.fiber_len(),
                avg: l.fiber_len() as f64,
            },
            DataList::Variable(l) => l.length_stats(),
        }
    }

    /// Every row widened to `f64`. `None` for non-numeric data.
    pub fn as_f64_rows(&self) -> Option<Vec<Vec<f64>>> {
        (0..self.len())
            .map(|i| self.item(i).and_then(|item| item.values.to_f64_vec()))
            .collect()
    }

    /// Every row converted to `i32`. `None` for non-numeric data.
    pub fn as_i32_rows(&self) -> Option<Vec<Vec<i32>>> {
        (0..self.len())
            .map(|i| self.item(i).and_then(|item| item.values.to_i32_vec()))
            .collect()
    }

    pub fn as_string_rows(&self) -> Option<Vec<Vec<String>>> {
        (0..self.len())
            .map(|i| self.item(i).and_then(|item| item.values.to_string_vec()))
            .collect()
    }

    /// All scalars in storage order widened to `f64`.
    pub fn as_f64_flat(&self) -> Option<Vec<f64>> {
        self.storage().as_slice().to_f64_vec()
    }

    /// Rebuilds the list keeping only the rows named by `rows`, in that order.
    ///
    /// Object lists cannot be rebuilt and give `None`.
    pub fn select_rows(&self, rows: &[usize]) -> Result<Option<DataList>> {
        let selected = match self.storage() {
            Storage::Int(_) => self.as_i32_rows().map(|all| pick_rows(&all, rows).map(|r| self.rebuild(r))),
            Storage::Float(_) | Storage::Double(_) => self
                .as_f64_rows()
                .map(|all| pick_rows(&all, rows).map(|r| self.rebuild(r))),
            Storage::Text(_) => self.as_string_rows().map(|all| pick_rows(&all, rows).map(|r| self.rebuild(r))),
            Storage::Object(_) => None,
        };
        selected.transpose()
    }

    fn rebuild<T: Scalar>(&self, rows: Vec<Vec<T>>) -> DataList {
        match self {
            DataList::Regular(l) => {
                let mut shape = l.shape().to_vec();
                shape[0] = rows.len();
                let flat: Vec<T> = rows.into_iter().flatten().collect();
                DataList::Regular(RegularDataList::from_parts(T::into_storage(flat), shape))
            }
            DataList::Variable(_) => DataList::Variable(VariableDataList::from_rows(rows)),
        }
    }
}

fn pick_rows<T: Clone>(all: &[Vec<T>], rows: &[usize]) -> Result<Vec<Vec<T>>> {
    rows.iter()
        .map(|&row| {
            all.get(row)
                .cloned()
                .ok_or(GeometryError::RowOutOfRange { row, len: all.len() })
        })
        .collect()
}

impl From<RegularDataList> for DataList {
    fn from(list: RegularDataList) -> Self {
        DataList::Regular(list)
    }
}

impl From<VariableDataList> for DataList {
    fn from(list: VariableDataList) -> Self {
        DataList::Variable(list)
    }
}

impl<const N: usize> From<Vec<[f64; N]>> for DataList {
    fn from(rows: Vec<[f64; N]>) -> Self {
        let n = rows.len();
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        DataList::Regular(RegularDataList::from_parts(Storage::Double(flat), vec![n, N]))
    }
}

impl<const N: usize> From<Vec<[i32; N]>> for DataList {
    fn from(rows: Vec<[i32; N]>) -> Self {
        let n = rows.len();
        let flat: Vec<i32> = rows.into_iter().flatten().collect();
        DataList::Regular(RegularDataList::from_parts(Storage::Int(flat), vec![n, N]))
    }
}

impl From<Vec<Vec<f64>>> for DataList {
    fn from(rows: Vec<Vec<f64>>) -> Self {
        DataList::from_rows(rows)
    }
}

impl From<Vec<Vec<i32>>> for DataList {
    fn from(rows: Vec<Vec<i32>>) -> Self {
        DataList::from_rows(rows)
    }
}

impl From<Vec<String>> for DataList {
    fn from(labels: Vec<String>) -> Self {
        DataList::from_rows(labels.into_iter().map(|l| vec![l]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_rows_round_trip() {
        let rows = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0], vec![7.0, 8.0, 9.0]];
        let list = DataList::from(rows.clone());
        assert!(!list.is_variable());
        assert_eq!(list.len(), 3);
        assert_eq!(list.size(), 9);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(list.item(i).unwrap().values, StorageSlice::Double(row));
        }
    }

    #[test]
    fn mixed_rows_become_variable() {
        let list = DataList::from(vec![vec![0, 1, 2], vec![0, 2, 3, 4]]);
        assert!(list.is_variable());
        assert_eq!(list.row_len(0), Some(3));
        assert_eq!(list.row_len(1), Some(4));
        assert_eq!(list.fiber_len(), None);
        assert_eq!(list.as_i32_rows().unwrap(), vec![vec![0, 1, 2], vec![0, 2, 3, 4]]);
    }

    #[test]
    fn fixed_arrays_build_regular_lists() {
        let list = DataList::from(vec![[0, 1], [1, 2], [2, 0]]);
        assert_eq!(list.fiber_len(), Some(2));
        assert_eq!(list.length_stats().max, 2);
    }

    #[test]
    fn select_rows_reorders() {
        let list = DataList::from(vec![[1.0], [2.0], [3.0]]);
        let picked = list.select_rows(&[2, 0, 0]).unwrap().unwrap();
        assert_eq!(picked.as_f64_flat().unwrap(), vec![3.0, 1.0, 1.0]);
    }

    #[test]
    fn select_rows_rejects_missing_row() {
        let list = DataList::from(vec![vec![0, 1, 2], vec![2, 3]]);
        let err = list.select_rows(&[1, 2]).unwrap_err();
        assert_eq!(err, GeometryError::RowOutOfRange { row: 2, len: 2 });
    }

    #[test]
    fn select_no_rows_keeps_fiber() {
        let list = DataList::from(vec![[1.0, 2.0, 3.0]]);
        let picked = list.select_rows(&[]).unwrap().unwrap();
        assert_eq!(picked.len(), 0);
        assert_eq!(picked.fiber_len(), Some(3));
    }

    #[test]
    fn text_is_not_numeric() {
        let list = DataList::from(vec!["a".to_string(), "b".to_string()]);
        assert!(list.as_f64_rows().is_none());
        assert_eq!(list.as_string_rows().unwrap()[1], vec!["b".to_string()]);
    }
}
