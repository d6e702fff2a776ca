//! Quad meshes: face sets whose faces come from a regular grid.

use super::{EdgeAttributes, FaceAttributes, FactoryCore, GeometryFactory, VertexAttributes};
use crate::attribute::Category;
use crate::data::DataList;
use crate::error::{GeometryError, Result};
use crate::geometry::Geometry;

/// Grid dimensions of a quad mesh.
///
/// Vertex `(u, v)` lives at index `v * u_lines + u`. A mesh closed in a
/// direction has an extra row of faces joining the last line to the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuadShape {
    pub u_lines: usize,
    pub v_lines: usize,
    pub closed_u: bool,
    pub closed_v: bool,
}

impl QuadShape {
    pub fn new(u_lines: usize, v_lines: usize, closed_u: bool, closed_v: bool) -> Result<Self> {
        if u_lines < 2 || v_lines < 2 {
            return Err(GeometryError::QuadMeshShape { u_lines, v_lines });
        }
        Ok(Self {
            u_lines,
            v_lines,
            closed_u,
            closed_v,
        })
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.u_lines * self.v_lines
    }

    #[inline]
    pub fn index(&self, u: usize, v: usize) -> i32 {
        ((v % self.v_lines) * self.u_lines + u % self.u_lines) as i32
    }

    fn cells(&self) -> (usize, usize) {
        let u = if self.closed_u { self.u_lines } else { self.u_lines - 1 };
        let v = if self.closed_v { self.v_lines } else { self.v_lines - 1 };
        (u, v)
    }

    pub fn face_count(&self) -> usize {
        let (u, v) = self.cells();
        u * v
    }

    /// One quad per cell, `(u, v), (u+1, v), (u+1, v+1), (u, v+1)`.
    pub fn face_indices(&self) -> Vec<Vec<i32>> {
        let (cells_u, cells_v) = self.cells();
        let mut faces = Vec::with_capacity(cells_u * cells_v);
        for v in 0..cells_v {
            for u in 0..cells_u {
                faces.push(vec![
                    self.index(u, v),
                    self.index(u + 1, v),
                    self.index(u + 1, v + 1),
                    self.index(u, v + 1),
                ]);
            }
        }
        faces
    }

    /// The grid lines as polylines: first every line of constant `v`,
    /// then every line of constant `u`.
    pub fn edge_indices(&self) -> Vec<Vec<i32>> {
        let mut edges = Vec::with_capacity(self.u_lines + self.v_lines);
        for v in 0..self.v_lines {
            let end = if self.closed_u { self.u_lines + 1 } else { self.u_lines };
            edges.push((0..end).map(|u| self.index(u, v)).collect());
        }
        for u in 0..self.u_lines {
            let end = if self.closed_v { self.v_lines + 1 } else { self.v_lines };
            edges.push((0..end).map(|v| self.index(u, v)).collect());
        }
        edges
    }

    /// `(u / (u_lines - 1), v / (v_lines - 1))` per vertex.
    pub fn texture_coordinates(&self) -> Vec<[f64; 2]> {
        let du = (self.u_lines - 1) as f64;
        let dv = (self.v_lines - 1) as f64;
        let mut uv = Vec::with_capacity(self.vertex_count());
        for v in 0..self.v_lines {
            for u in 0..self.u_lines {
                uv.push([u as f64 / du, v as f64 / dv]);
            }
        }
        uv
    }
}

/// Builds a face set over a `u_lines` x `v_lines` vertex grid.
///
/// Face and edge indices follow from the grid and cannot be set. Vertex
/// normals are averaged over the grid cells and smoothed across closed
/// seams.
#[derive(Debug)]
pub struct QuadMeshFactory {
    core: FactoryCore,
}

impl QuadMeshFactory {
    pub fn new(u_lines: usize, v_lines: usize, closed_u: bool, closed_v: bool) -> Result<Self> {
        let mut factory = Self {
            core: FactoryCore::new(Geometry::face_set()),
        };
        factory.apply_shape(QuadShape::new(u_lines, v_lines, closed_u, closed_v)?)?;
        Ok(factory)
    }

    pub fn shape(&self) -> QuadShape {
        self.core
            .quad_shape()
            .unwrap_or(QuadShape {
                u_lines: 2,
                v_lines: 2,
                closed_u: false,
                closed_v: false,
            })
    }

    /// Resizes the grid. Staged vertex data must be set again.
    pub fn set_line_counts(&mut self, u_lines: usize, v_lines: usize) -> Result<()> {
        let shape = self.shape();
        self.apply_shape(QuadShape::new(u_lines, v_lines, shape.closed_u, shape.closed_v)?)
    }

    pub fn set_closed_in_u_direction(&mut self, closed: bool) -> Result<()> {
        let shape = QuadShape {
            closed_u: closed,
            ..self.shape()
        };
        self.apply_shape(shape)
    }

    pub fn set_closed_in_v_direction(&mut self, closed: bool) -> Result<()> {
        let shape = QuadShape {
            closed_v: closed,
            ..self.shape()
        };
        self.apply_shape(shape)
    }

    /// Coordinates given as `v_lines` rows of `u_lines` points each.
    pub fn set_grid_coordinates(&mut self, grid: &[Vec<Vec<f64>>]) -> Result<()> {
        let shape = self.shape();
        if grid.len() != shape.v_lines || grid.iter().any(|row| row.len() != shape.u_lines) {
            let columns = grid.first().map_or(0, Vec::len);
            return Err(GeometryError::QuadMeshShape {
                u_lines: columns,
                v_lines: grid.len(),
            });
        }
        let rows: Vec<Vec<f64>> = grid.iter().flatten().cloned().collect();
        self.set_vertex_coordinates(rows)
    }

    pub fn set_generate_texture_coordinates(&mut self, generate: bool) {
        self.core.flags_mut().texture_coordinates = generate;
    }

    fn apply_shape(&mut self, shape: QuadShape) -> Result<()> {
        if self.core.quad_shape().map(|s| s.vertex_count()) != Some(shape.vertex_count()) {
            self.core.set_count(Category::Vertex, shape.vertex_count())?;
        }
        self.core.set_quad_shape(shape);
        Ok(())
    }
}

impl GeometryFactory for QuadMeshFactory {
    fn core(&self) -> &FactoryCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut FactoryCore {
        &mut self.core
    }

    fn update(&mut self) -> Result<()> {
        if self.core.quad_dirty() {
            let faces = DataList::from(self.shape().face_indices());
            self.core.stage_topology(Category::Face, faces)?;
        }
        self.core.update()
    }
}

impl VertexAttributes for QuadMeshFactory {}

impl EdgeAttributes for QuadMeshFactory {}

impl FaceAttributes for QuadMeshFactory {}

#[cfg(test)]
mod tests {
    use std::f64::consts::TAU;

    use super::*;
    use crate::attribute::Attribute;
    use crate::geometry::{keys, GeometryAttribute};

    /// A cylinder of radius 1 around z, closed in u.
    fn make_cylinder(u_lines: usize, v_lines: usize) -> QuadMeshFactory {
        let mut factory = QuadMeshFactory::new(u_lines, v_lines, true, false).unwrap();
        let grid: Vec<Vec<Vec<f64>>> = (0..v_lines)
            .map(|v| {
                (0..u_lines)
                    .map(|u| {
                        let angle = TAU * u as f64 / u_lines as f64;
                        vec![angle.cos(), angle.sin(), v as f64]
                    })
                    .collect()
            })
            .collect();
        factory.set_grid_coordinates(&grid).unwrap();
        factory
    }

    #[test]
    fn too_few_lines_is_rejected() {
        assert!(matches!(
            QuadMeshFactory::new(1, 4, false, false),
            Err(GeometryError::QuadMeshShape { u_lines: 1, v_lines: 4 })
        ));
    }

    #[test]
    fn open_grid_faces() {
        let shape = QuadShape::new(3, 2, false, false).unwrap();
        assert_eq!(shape.face_indices(), vec![vec![0, 1, 4, 3], vec![1, 2, 5, 4]]);
    }

    #[test]
    fn closed_grid_wraps_without_new_vertices() {
        let shape = QuadShape::new(3, 2, true, false).unwrap();
        let faces = shape.face_indices();
        assert_eq!(faces.len(), 3);
        assert_eq!(faces[2], vec![2, 0, 3, 5]);
        assert!(faces.iter().flatten().all(|&i| (0..6).contains(&i)));
    }

    #[test]
    fn grid_lines_become_edges() {
        let shape = QuadShape::new(3, 2, true, false).unwrap();
        let edges = shape.edge_indices();
        assert_eq!(edges.len(), 5);
        assert_eq!(edges[0], vec![0, 1, 2, 0]);
        assert_eq!(edges[2], vec![0, 3]);
    }

    #[test]
    fn topology_cannot_be_set() {
        let mut factory = make_cylinder(6, 3);
        let err = factory.set_face_indices(vec![[0, 1, 2, 3]]).unwrap_err();
        assert_eq!(err, GeometryError::DerivedTopology { category: Category::Face });
        let err = factory.set_edge_indices(vec![[0, 1]]).unwrap_err();
        assert_eq!(err, GeometryError::DerivedTopology { category: Category::Edge });
        assert!(factory.set_face_count(3).is_err());
    }

    #[test]
    fn cylinder_commits_faces_and_shape() {
        let mut factory = make_cylinder(6, 3);
        factory.set_generate_edges_from_faces(true);
        factory.update().unwrap();
        let geometry = factory.geometry();
        let reader = geometry.read().unwrap();
        assert_eq!(reader.vertex_count(), 18);
        assert_eq!(reader.face_count(), 12);
        assert_eq!(reader.edge_count(), 9);
        assert!(reader.is_quadrilateral());
        let shape = reader.geometry_attribute(keys::QUAD_MESH_SHAPE).unwrap();
        assert_eq!(*shape, GeometryAttribute::QuadMeshShape { u_lines: 6, v_lines: 3 });
    }

    #[test]
    fn seam_normals_match_and_are_unit() {
        let mut factory = make_cylinder(8, 3);
        factory.set_generate_vertex_normals(true);
        factory.update().unwrap();
        let geometry = factory.geometry();
        let normals = geometry.read().unwrap().f64_rows(Category::Vertex, &Attribute::NORMALS).unwrap();
        for v in 0..3 {
            let first = &normals[v * 8];
            let last = &normals[v * 8 + 7];
            assert!(first.iter().zip(last).all(|(a, b)| (a - b).abs() < 1e-12), "{first:?} {last:?}");
            let len: f64 = first.iter().map(|c| c * c).sum::<f64>().sqrt();
            assert!((len - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn texture_coordinates_span_unit_square() {
        let mut factory = make_cylinder(5, 3);
        factory.set_generate_texture_coordinates(true);
        factory.update().unwrap();
        let geometry = factory.geometry();
        let uv = geometry
            .read()
            .unwrap()
            .f64_rows(Category::Vertex, &Attribute::TEXTURE_COORDINATES)
            .unwrap();
        assert_eq!(uv[0], vec![0.0, 0.0]);
        assert_eq!(uv[4], vec![1.0, 0.0]);
        assert_eq!(uv[14], vec![1.0, 1.0]);
    }

    #[test]
    fn reshaping_replaces_faces() {
        let mut factory = make_cylinder(6, 3);
        factory.update().unwrap();
        factory.set_closed_in_u_direction(false).unwrap();
        factory.update().unwrap();
        assert_eq!(factory.geometry().read().unwrap().face_count(), 10);
    }
}
