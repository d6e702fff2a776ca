//! Face and vertex normals.
//!
//! Euclidean normals are unit 3-vectors. Under a non-Euclidean metric a
//! face normal is the polar point of the face plane, a homogeneous
//! 4-vector scaled to length -1.

use nalgebra::{Point3, Vector4};

use crate::math::{
    normalize, plane_from_points, polarize_plane, set_to_length, to_homogeneous, to_point3, Metric,
    DEGENERACY_TOLERANCE,
};

/// Normal of one face from its vertex rows, `None` if every vertex triple
/// is degenerate.
pub fn face_normal(rows: &[&[f64]], metric: Metric) -> Option<Vector4<f64>> {
    let points: Vec<Vector4<f64>> = rows.iter().map(|row| to_homogeneous(row)).collect();
    match metric {
        Metric::Euclidean => {
            let points: Vec<Point3<f64>> = points.iter().map(to_point3).collect();
            let (p0, rest) = points.split_first()?;
            for (i, pi) in rest.iter().enumerate() {
                let e1 = pi - p0;
                if e1.norm() < DEGENERACY_TOLERANCE {
                    continue;
                }
                for pj in &rest[i + 1..] {
                    let n = e1.cross(&(pj - p0));
                    let len = n.norm();
                    if len > DEGENERACY_TOLERANCE {
                        let n = n / len;
                        return Some(Vector4::new(n.x, n.y, n.z, 0.0));
                    }
                }
            }
            None
        }
        _ => {
            let (p0, rest) = points.split_first()?;
            for (i, pi) in rest.iter().enumerate() {
                for pj in &rest[i + 1..] {
                    let plane = plane_from_points(p0, pi, pj);
                    if plane.norm() > DEGENERACY_TOLERANCE {
                        return Some(set_to_length(&polarize_plane(&plane, metric), -1.0, metric));
                    }
                }
            }
            None
        }
    }
}

/// One normal per face. Degenerate faces get a zero normal and a warning.
pub fn face_normals(vertices: &[Vec<f64>], faces: &[Vec<i32>], metric: Metric) -> Vec<Vec<f64>> {
    faces
        .iter()
        .enumerate()
        .map(|(index, face)| {
            let rows: Option<Vec<&[f64]>> = face
                .iter()
                .map(|&i| usize::try_from(i).ok().and_then(|i| vertices.get(i)).map(Vec::as_slice))
                .collect();
            let normal = rows.and_then(|rows| face_normal(&rows, metric));
            match normal {
                Some(n) => to_row(&n, metric),
                None => {
                    log::warn!("face {index} is degenerate, using a zero normal");
                    to_row(&Vector4::zeros(), metric)
                }
            }
        })
        .collect()
}

/// Per-vertex average of the normals of the incident faces.
///
/// Vertices no face touches keep a zero normal.
pub fn vertex_normals(
    vertex_count: usize,
    faces: &[Vec<i32>],
    face_normals: &[Vec<f64>],
    metric: Metric,
) -> Vec<Vec<f64>> {
    let mut sums = vec![Vector4::zeros(); vertex_count];
    for (face, normal) in faces.iter().zip(face_normals) {
        let normal = as_vector(normal, metric);
        for &i in face {
            if let Some(sum) = usize::try_from(i).ok().and_then(|i| sums.get_mut(i)) {
                *sum += normal;
            }
        }
    }
    sums.iter().map(|sum| to_row(&normalize(sum, metric), metric)).collect()
}

/// Vertex normals of a `u_lines` x `v_lines` grid, vertex `(i, j)` at
/// `i * u_lines + j`.
///
/// Each vertex averages the normals of the grid cells around it; cells
/// that wrap a closed direction are not used. Along a closed direction the
/// first and last line then share one averaged normal.
pub fn grid_vertex_normals(
    vertices: &[Vec<f64>],
    u_lines: usize,
    v_lines: usize,
    closed_u: bool,
    closed_v: bool,
    metric: Metric,
) -> Vec<Vec<f64>> {
    let index = |i: usize, j: usize| i * u_lines + j;
    let mut sums = vec![Vector4::zeros(); u_lines * v_lines];
    for i in 0..v_lines.saturating_sub(1) {
        for j in 0..u_lines.saturating_sub(1) {
            let corners = [index(i, j), index(i, j + 1), index(i + 1, j + 1), index(i + 1, j)];
            let rows: Option<Vec<&[f64]>> = corners.iter().map(|&c| vertices.get(c).map(Vec::as_slice)).collect();
            let Some(normal) = rows.and_then(|rows| face_normal(&rows, metric)) else {
                continue;
            };
            for c in corners {
                sums[c] += normal;
            }
        }
    }
    let mut normals: Vec<Vector4<f64>> = sums.iter().map(|s| normalize(s, metric)).collect();

    if closed_u && u_lines > 1 {
        for i in 0..v_lines {
            let sum = normals[index(i, 0)] + normals[index(i, u_lines - 1)];
            normals[index(i, 0)] = sum;
            normals[index(i, u_lines - 1)] = sum;
        }
    }
    if closed_v && v_lines > 1 {
        for j in 0..u_lines {
            let n = normalize(&(normals[index(0, j)] + normals[index(v_lines - 1, j)]), metric);
            normals[index(0, j)] = n;
            normals[index(v_lines - 1, j)] = n;
        }
    }
    if closed_u && u_lines > 1 {
        for i in 0..v_lines {
            for j in [0, u_lines - 1] {
                normals[index(i, j)] = normalize(&normals[index(i, j)], metric);
            }
        }
    }
    normals.iter().map(|n| to_row(n, metric)).collect()
}

fn as_vector(row: &[f64], metric: Metric) -> Vector4<f64> {
    match (metric, row) {
        (Metric::Euclidean, [x, y, z, ..]) => Vector4::new(*x, *y, *z, 0.0),
        (_, [x, y, z, w, ..]) => Vector4::new(*x, *y, *z, *w),
        _ => Vector4::zeros(),
    }
}

fn to_row(v: &Vector4<f64>, metric: Metric) -> Vec<f64> {
    match metric {
        Metric::Euclidean => vec![v.x, v.y, v.z],
        _ => vec![v.x, v.y, v.z, v.w],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn counter_clockwise_square_faces_up() {
        let vertices = vec![vec![0.0, 0.0, 0.0], vec![1.0, 0.0, 0.0], vec![1.0, 1.0, 0.0], vec![0.0, 1.0, 0.0]];
        let normals = face_normals(&vertices, &[vec![0, 1, 2, 3]], Metric::Euclidean);
        assert!(close(&normals[0], &[0.0, 0.0, 1.0]), "{normals:?}");
    }

    #[test]
    fn repeated_leading_vertex_is_skipped() {
        let vertices = vec![vec![0.0, 0.0, 0.0], vec![0.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]];
        let normals = face_normals(&vertices, &[vec![0, 1, 2, 3]], Metric::Euclidean);
        assert!(close(&normals[0], &[1.0, 0.0, 0.0]), "{normals:?}");
    }

    #[test]
    fn collinear_face_gets_zero_normal() {
        let vertices = vec![vec![0.0, 0.0, 0.0], vec![1.0, 0.0, 0.0], vec![2.0, 0.0, 0.0]];
        let normals = face_normals(&vertices, &[vec![0, 1, 2]], Metric::Euclidean);
        assert!(close(&normals[0], &[0.0, 0.0, 0.0]));
    }

    #[test]
    fn vertex_normal_averages_a_fold() {
        let vertices = vec![
            vec![0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![1.0, 0.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ];
        let faces = vec![vec![0, 2, 1], vec![0, 1, 3]];
        let fnormals = face_normals(&vertices, &faces, Metric::Euclidean);
        let vnormals = vertex_normals(4, &faces, &fnormals, Metric::Euclidean);
        let s = std::f64::consts::FRAC_1_SQRT_2;
        assert!(close(&vnormals[0], &[s, 0.0, s]), "{vnormals:?}");
        assert!(close(&vnormals[2], &[0.0, 0.0, 1.0]));
    }

    #[test]
    fn hyperbolic_normal_is_a_polar_point() {
        let rows: Vec<&[f64]> = vec![&[0.0, 0.0, 0.5, 1.0], &[0.1, 0.0, 0.5, 1.0], &[0.0, 0.1, 0.5, 1.0]];
        let n = face_normal(&rows, Metric::Hyperbolic).unwrap();
        let len2 = crate::math::inner_product(&n, &n, Metric::Hyperbolic);
        assert!((len2.abs() - 1.0).abs() < 1e-9);
        assert!(n.x.abs() < 1e-12 && n.y.abs() < 1e-12);
    }

    #[test]
    fn closed_grid_seam_normals_agree() {
        let (u, v) = (8, 3);
        let mut vertices = Vec::new();
        for i in 0..v {
            for j in 0..u {
                let angle = std::f64::consts::TAU * j as f64 / u as f64;
                vertices.push(vec![angle.cos(), angle.sin(), i as f64]);
            }
        }
        let normals = grid_vertex_normals(&vertices, u, v, true, false, Metric::Euclidean);
        for i in 0..v {
            assert!(close(&normals[i * u], &normals[i * u + u - 1]));
            let len: f64 = normals[i * u].iter().map(|c| c * c).sum::<f64>().sqrt();
            assert!((len - 1.0).abs() < 1e-9);
        }
    }
}
