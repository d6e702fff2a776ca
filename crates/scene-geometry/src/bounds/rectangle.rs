//! Axis-aligned boxes.

use nalgebra::{Matrix4, Point2, Point3};

use crate::math::transform_point;

/// An axis-aligned box in 3D. An empty box has `min > max` on every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle3D {
    min: Point3<f64>,
    max: Point3<f64>,
}

impl Default for Rectangle3D {
    fn default() -> Self {
        Self::empty()
    }
}

impl Rectangle3D {
    /// The empty box, the identity of [`Rectangle3D::union`].
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// The box `[-1, 1]^3`.
    pub fn unit_cube() -> Self {
        Self::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0))
    }

    /// Creates a box from two corners. A NaN bound yields the empty box.
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        if min.iter().chain(max.iter()).any(|v| v.is_nan()) {
            return Self::empty();
        }
        Self { min, max }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Self {
        points.into_iter().fold(Self::empty(), |mut acc, p| {
            acc.add_point(p);
            acc
        })
    }

    #[inline]
    pub fn min(&self) -> Point3<f64> {
        self.min
    }

    #[inline]
    pub fn max(&self) -> Point3<f64> {
        self.max
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    pub fn center(&self) -> Point3<f64> {
        Point3::from((self.min.coords + self.max.coords) * 0.5)
    }

    pub fn add_point(&mut self, p: &Point3<f64>) {
        if p.iter().any(|v| v.is_nan()) {
            return;
        }
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    pub fn union(&self, other: &Rectangle3D) -> Rectangle3D {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// The eight corners, `None` for an empty box.
    pub fn corners(&self) -> Option<[Point3<f64>; 8]> {
        if self.is_empty() {
            return None;
        }
        let (lo, hi) = (self.min, self.max);
        Some(std::array::from_fn(|i| {
            Point3::new(
                if i & 1 == 0 { lo.x } else { hi.x },
                if i & 2 == 0 { lo.y } else { hi.y },
                if i & 4 == 0 { lo.z } else { hi.z },
            )
        }))
    }

    /// Bound of this box's corners after a projective transform.
    pub fn transform(&self, matrix: &Matrix4<f64>) -> Rectangle3D {
        match self.corners() {
            Some(corners) => {
                let moved: Vec<Point3<f64>> = corners.iter().map(|c| transform_point(matrix, c)).collect();
                Self::from_points(&moved)
            }
            None => *self,
        }
    }
}

/// An axis-aligned rectangle in the plane, the domain of a height field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle2D {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

impl Rectangle2D {
    pub fn new(min: Point2<f64>, max: Point2<f64>) -> Self {
        Self { min, max }
    }
}
