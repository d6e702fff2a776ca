//! Ready-made face sets.
//!
//! Polyhedra come with edges and face normals. The torus and the lat/long
//! sphere are quad meshes with smooth vertex normals.

use std::f64::consts::{PI, TAU};
use std::rc::Rc;

use super::{build_face_set, Rebuild};
use crate::attribute::Attribute;
use crate::data::DataList;
use crate::error::{GeometryError, Result};
use crate::factory::{FaceAttributes, GeometryFactory, QuadMeshFactory};
use crate::geometry::Geometry;
use crate::math::Metric;

const GOLDEN_RATIO: f64 = 1.618_033_988_749_895;

pub(crate) const ICOSAHEDRON_FACES: [[i32; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

/// The twelve icosahedron vertices on the unit sphere.
pub(crate) fn icosahedron_vertices() -> Vec<Vec<f64>> {
    let t = GOLDEN_RATIO;
    let raw = [
        [-1.0, t, 0.0],
        [1.0, t, 0.0],
        [-1.0, -t, 0.0],
        [1.0, -t, 0.0],
        [0.0, -1.0, t],
        [0.0, 1.0, t],
        [0.0, -1.0, -t],
        [0.0, 1.0, -t],
        [t, 0.0, -1.0],
        [t, 0.0, 1.0],
        [-t, 0.0, -1.0],
        [-t, 0.0, 1.0],
    ];
    let len = (1.0 + t * t).sqrt();
    raw.iter().map(|p| p.iter().map(|c| c / len).collect()).collect()
}

fn polyhedron(vertices: Vec<Vec<f64>>, faces: Vec<Vec<i32>>) -> Result<Rc<Geometry>> {
    let count = vertices.len();
    let attributes = [(Attribute::COORDINATES, DataList::from(vertices))].into_iter().collect();
    build_face_set(
        count,
        attributes,
        faces,
        Default::default(),
        Rebuild {
            edges: true,
            face_normals: true,
            vertex_normals: false,
        },
        Metric::Euclidean,
    )
}

/// The cube `[-1, 1]^3`, vertex `i` at `(±1, ±1, ±1)` by the bits of `i`.
pub fn cube() -> Result<Rc<Geometry>> {
    let vertices = (0..8)
        .map(|i| {
            let bit = |b: usize| if i & b == 0 { -1.0 } else { 1.0 };
            vec![bit(1), bit(2), bit(4)]
        })
        .collect();
    let faces = vec![
        vec![0, 2, 3, 1],
        vec![4, 5, 7, 6],
        vec![0, 1, 5, 4],
        vec![2, 6, 7, 3],
        vec![0, 4, 6, 2],
        vec![1, 3, 7, 5],
    ];
    polyhedron(vertices, faces)
}

pub fn tetrahedron() -> Result<Rc<Geometry>> {
    let vertices = vec![
        vec![1.0, 1.0, 1.0],
        vec![1.0, -1.0, -1.0],
        vec![-1.0, 1.0, -1.0],
        vec![-1.0, -1.0, 1.0],
    ];
    let faces = vec![vec![0, 1, 2], vec![2, 1, 3], vec![1, 0, 3], vec![0, 2, 3]];
    polyhedron(vertices, faces)
}

pub fn octahedron() -> Result<Rc<Geometry>> {
    let vertices = vec![
        vec![1.0, 0.0, 0.0],
        vec![-1.0, 0.0, 0.0],
        vec![0.0, 1.0, 0.0],
        vec![0.0, -1.0, 0.0],
        vec![0.0, 0.0, 1.0],
        vec![0.0, 0.0, -1.0],
    ];
    let faces = vec![
        vec![0, 2, 4],
        vec![2, 1, 4],
        vec![1, 3, 4],
        vec![3, 0, 4],
        vec![2, 0, 5],
        vec![1, 2, 5],
        vec![3, 1, 5],
        vec![0, 3, 5],
    ];
    polyhedron(vertices, faces)
}

/// The icosahedron inscribed in the unit sphere.
pub fn icosahedron() -> Result<Rc<Geometry>> {
    let faces = ICOSAHEDRON_FACES.iter().map(|f| f.to_vec()).collect();
    polyhedron(icosahedron_vertices(), faces)
}

/// A single face with `n` corners on the unit circle in the xy plane.
pub fn regular_polygon(n: usize) -> Result<Rc<Geometry>> {
    if n < 3 {
        return Err(GeometryError::TooFewSegments {
            primitive: "regular polygon",
            requested: n,
            minimum: 3,
        });
    }
    let vertices = (0..n)
        .map(|k| {
            let angle = TAU * k as f64 / n as f64;
            vec![angle.cos(), angle.sin(), 0.0]
        })
        .collect();
    polyhedron(vertices, vec![(0..n as i32).collect()])
}

fn quad_surface(
    u_lines: usize,
    v_lines: usize,
    closed_u: bool,
    closed_v: bool,
    point: impl Fn(f64, f64) -> [f64; 3],
) -> Result<Rc<Geometry>> {
    let mut factory = QuadMeshFactory::new(u_lines, v_lines, closed_u, closed_v)?;
    let du = if closed_u { u_lines } else { u_lines - 1 } as f64;
    let dv = if closed_v { v_lines } else { v_lines - 1 } as f64;
    let grid: Vec<Vec<Vec<f64>>> = (0..v_lines)
        .map(|v| {
            (0..u_lines)
                .map(|u| point(u as f64 / du, v as f64 / dv).to_vec())
                .collect()
        })
        .collect();
    factory.set_grid_coordinates(&grid)?;
    factory.set_generate_vertex_normals(true);
    factory.set_generate_texture_coordinates(true);
    factory.set_generate_edges_from_faces(true);
    factory.update()?;
    Ok(factory.geometry())
}

/// A torus around the z axis. `u` runs around the axis, `v` around the tube.
pub fn torus(big_radius: f64, small_radius: f64, u_lines: usize, v_lines: usize) -> Result<Rc<Geometry>> {
    if u_lines < 3 || v_lines < 3 {
        return Err(GeometryError::TooFewSegments {
            primitive: "torus",
            requested: u_lines.min(v_lines),
            minimum: 3,
        });
    }
    quad_surface(u_lines, v_lines, true, true, |s, t| {
        let (phi, theta) = (TAU * s, TAU * t);
        let ring = big_radius + small_radius * theta.cos();
        [ring * phi.cos(), ring * phi.sin(), small_radius * theta.sin()]
    })
}

/// A unit sphere from longitude/latitude lines, closed in longitude. The
/// first and last latitude line collapse onto the poles.
pub fn sphere(u_lines: usize, v_lines: usize) -> Result<Rc<Geometry>> {
    if u_lines < 3 || v_lines < 3 {
        return Err(GeometryError::TooFewSegments {
            primitive: "sphere",
            requested: u_lines.min(v_lines),
            minimum: 3,
        });
    }
    quad_surface(u_lines, v_lines, true, false, |s, t| {
        let (phi, theta) = (TAU * s, PI * (t - 0.5));
        [theta.cos() * phi.cos(), theta.cos() * phi.sin(), theta.sin()]
    })
}
