//! Rectangular meshes of tensor-product Bezier patches.

use std::rc::Rc;

use nalgebra::{DMatrix, Vector4};

use crate::error::{GeometryError, Result};
use crate::factory::{FaceAttributes, GeometryFactory, QuadMeshFactory};
use crate::geometry::Geometry;
use crate::math::{binomial, to_homogeneous};

/// De Casteljau subdivision at `t = 1/2` for one degree, as two matrices
/// mapping a segment's control points to those of its left and right half.
#[derive(Debug, Clone, PartialEq)]
struct SplitMatrices {
    left: DMatrix<f64>,
    right: DMatrix<f64>,
}

impl SplitMatrices {
    fn new(degree: usize) -> Self {
        let n = degree as u64;
        let left = DMatrix::from_fn(degree + 1, degree + 1, |i, j| {
            if j <= i {
                binomial(i as u64, j as u64) as f64 / 2f64.powi(i as i32)
            } else {
                0.0
            }
        });
        let right = DMatrix::from_fn(degree + 1, degree + 1, |i, j| {
            if j >= i {
                binomial(n - i as u64, (j - i) as u64) as f64 / 2f64.powi((degree - i) as i32)
            } else {
                0.0
            }
        });
        Self { left, right }
    }

    /// Splits every segment of a polyline of `k * degree + 1` control points.
    fn split_line(&self, line: &[Vector4<f64>], degree: usize) -> Vec<Vector4<f64>> {
        let segments = (line.len() - 1) / degree;
        let mut out = Vec::with_capacity(2 * segments * degree + 1);
        out.push(line[0]);
        for s in 0..segments {
            let segment = &line[s * degree..=(s + 1) * degree];
            for matrix in [&self.left, &self.right] {
                for i in 1..=degree {
                    out.push((0..=degree).map(|j| segment[j] * matrix[(i, j)]).sum());
                }
            }
        }
        out
    }
}

/// A grid of Bezier patches sharing boundary control points.
///
/// Control points are homogeneous and stored as `rows[v][u]`; the net has
/// `k * u_degree + 1` columns and `l * v_degree + 1` rows for `k x l`
/// patches.
#[derive(Debug, Clone, PartialEq)]
pub struct BezierPatchMesh {
    u_degree: usize,
    v_degree: usize,
    points: Vec<Vec<Vector4<f64>>>,
    u_split: SplitMatrices,
    v_split: SplitMatrices,
}

impl BezierPatchMesh {
    pub fn new(u_degree: usize, v_degree: usize, points: Vec<Vec<Vector4<f64>>>) -> Result<Self> {
        let rows = points.len();
        let columns = points.first().map_or(0, Vec::len);
        let fits = |count: usize, degree: usize| degree > 0 && count > degree && (count - 1) % degree == 0;
        if !fits(columns, u_degree) || !fits(rows, v_degree) || points.iter().any(|row| row.len() != columns) {
            return Err(GeometryError::ControlNet {
                rows,
                columns,
                u_degree,
                v_degree,
            });
        }
        Ok(Self {
            u_degree,
            v_degree,
            points,
            u_split: SplitMatrices::new(u_degree),
            v_split: SplitMatrices::new(v_degree),
        })
    }

    /// Builds the net from coordinate rows of 3 or 4 components.
    pub fn from_rows(u_degree: usize, v_degree: usize, rows: &[Vec<Vec<f64>>]) -> Result<Self> {
        let points = rows
            .iter()
            .map(|row| row.iter().map(|p| to_homogeneous(p)).collect())
            .collect();
        Self::new(u_degree, v_degree, points)
    }

    #[inline]
    pub fn u_degree(&self) -> usize {
        self.u_degree
    }

    #[inline]
    pub fn v_degree(&self) -> usize {
        self.v_degree
    }

    pub fn control_points(&self) -> &[Vec<Vector4<f64>>] {
        &self.points
    }

    pub fn u_segments(&self) -> usize {
        (self.points[0].len() - 1) / self.u_degree
    }

    pub fn v_segments(&self) -> usize {
        (self.points.len() - 1) / self.v_degree
    }

    /// Doubles the patch count along u.
    pub fn refine_u(&mut self) {
        for row in &mut self.points {
            *row = self.u_split.split_line(row, self.u_degree);
        }
    }

    /// Doubles the patch count along v.
    pub fn refine_v(&mut self) {
        let columns = self.points[0].len();
        let split: Vec<Vec<Vector4<f64>>> = (0..columns)
            .map(|u| {
                let column: Vec<Vector4<f64>> = self.points.iter().map(|row| row[u]).collect();
                self.v_split.split_line(&column, self.v_degree)
            })
            .collect();
        let rows = split[0].len();
        self.points = (0..rows).map(|v| split.iter().map(|column| column[v]).collect()).collect();
    }

    /// Refines along u, then along v.
    pub fn refine(&mut self) {
        self.refine_u();
        self.refine_v();
    }

    /// The surface point at `(u, v)` in `[0, 1]^2` over the whole mesh.
    pub fn evaluate(&self, u: f64, v: f64) -> Vector4<f64> {
        let (pu, tu) = locate(u, self.u_segments());
        let (pv, tv) = locate(v, self.v_segments());
        let bu = bernstein(self.u_degree, tu);
        let bv = bernstein(self.v_degree, tv);
        let mut point = Vector4::zeros();
        for (i, wv) in bv.iter().enumerate() {
            let row = &self.points[pv * self.v_degree + i];
            for (j, wu) in bu.iter().enumerate() {
                point += row[pu * self.u_degree + j] * (wu * wv);
            }
        }
        point
    }

    /// The control net as an open quad mesh with vertex normals.
    pub fn to_quad_mesh(&self) -> Result<Rc<Geometry>> {
        let columns = self.points[0].len();
        let mut factory = QuadMeshFactory::new(columns, self.points.len(), false, false)?;
        let grid: Vec<Vec<Vec<f64>>> = self
            .points
            .iter()
            .map(|row| row.iter().map(|p| vec![p.x, p.y, p.z, p.w]).collect())
            .collect();
        factory.set_grid_coordinates(&grid)?;
        factory.set_generate_vertex_normals(true);
        factory.set_generate_texture_coordinates(true);
        factory.update()?;
        Ok(factory.geometry())
    }
}

/// Patch index and local parameter of a global parameter.
fn locate(t: f64, segments: usize) -> (usize, f64) {
    let scaled = t.clamp(0.0, 1.0) * segments as f64;
    let patch = (scaled.floor() as usize).min(segments - 1);
    (patch, scaled - patch as f64)
}

fn bernstein(degree: usize, t: f64) -> Vec<f64> {
    (0..=degree)
        .map(|i| {
            binomial(degree as u64, i as u64) as f64 * t.powi(i as i32) * (1.0 - t).powi((degree - i) as i32)
        })
        .collect()
}
