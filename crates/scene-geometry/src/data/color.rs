//! Colour normalisation into four-channel data lists.

use super::{DataList, RegularDataList, Storage};
use crate::error::{GeometryError, Result};

/// An 8-bit RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_unit(self) -> [f64; 4] {
        [self.r, self.g, self.b, self.a].map(|c| f64::from(c) / 255.0)
    }
}

impl DataList {
    /// Colour rows of 3 or 4 channels, normalised to RGBA in `[0, 1]`.
    pub fn colors_from_rows(rows: &[Vec<f64>]) -> Result<DataList> {
        let mut flat = Vec::with_capacity(rows.len() * 4);
        for (row, color) in rows.iter().enumerate() {
            push_rgba(&mut flat, color, row)?;
        }
        Ok(rgba_list(flat))
    }

    /// A flat colour buffer with `channels` (3 or 4) values per colour.
    pub fn colors_from_flat(values: &[f64], channels: usize) -> Result<DataList> {
        if channels != 3 && channels != 4 {
            return Err(GeometryError::ColorChannels {
                row: 0,
                len: channels,
            });
        }
        if values.len() % channels != 0 {
            return Err(GeometryError::FiberMismatch {
                len: values.len(),
                fiber: channels,
            });
        }
        let mut flat = Vec::with_capacity(values.len() / channels * 4);
        for (row, color) in values.chunks_exact(channels).enumerate() {
            push_rgba(&mut flat, color, row)?;
        }
        Ok(rgba_list(flat))
    }

    pub fn colors_from_objects(colors: &[Color]) -> DataList {
        rgba_list(colors.iter().flat_map(|c| c.to_unit()).collect())
    }
}

fn push_rgba(flat: &mut Vec<f64>, color: &[f64], row: usize) -> Result<()> {
    match color.len() {
        3 | 4 => {
            flat.extend(color.iter().map(|c| c.clamp(0.0, 1.0)));
            if color.len() == 3 {
                flat.push(1.0);
            }
            Ok(())
        }
        len => Err(GeometryError::ColorChannels { row, len }),
    }
}

fn rgba_list(flat: Vec<f64>) -> DataList {
    let n = flat.len() / 4;
    DataList::Regular(RegularDataList::from_parts(Storage::Double(flat), vec![n, 4]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_rows_gain_opaque_alpha() {
        let list = DataList::colors_from_rows(&[vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0, 0.5]]).unwrap();
        assert_eq!(list.fiber_len(), Some(4));
        assert_eq!(
            list.as_f64_rows().unwrap(),
            vec![vec![1.0, 0.0, 0.0, 1.0], vec![0.0, 1.0, 0.0, 0.5]]
        );
    }

    #[test]
    fn two_channel_rows_are_rejected() {
        let err = DataList::colors_from_rows(&[vec![1.0, 0.0, 0.0], vec![0.5, 0.5]]).unwrap_err();
        assert_eq!(err, GeometryError::ColorChannels { row: 1, len: 2 });
    }

    #[test]
    fn color_objects_are_scaled_to_unit_range() {
        let list = DataList::colors_from_objects(&[Color::rgb(255, 0, 51)]);
        let row = &list.as_f64_rows().unwrap()[0];
        assert!((row[2] - 0.2).abs() < 1e-12);
        assert_eq!(row[3], 1.0);
    }

    #[test]
    fn flat_colors_are_clamped() {
        let list = DataList::colors_from_flat(&[2.0, -1.0, 0.5], 3).unwrap();
        assert_eq!(list.as_f64_flat().unwrap(), vec![1.0, 0.0, 0.5, 1.0]);
    }
}
