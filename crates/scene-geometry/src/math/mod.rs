//! Homogeneous-coordinate helpers on top of nalgebra.
//!
//! Points are 4-component homogeneous vectors. A point with `w == 0` is a
//! point at infinity (a direction). Metric-aware operations are
//! parameterised by [`Metric`].

mod plane;
mod triangle;

pub use plane::Plane3D;
pub use triangle::Triangle;

use nalgebra::{Matrix4, Point3, Vector3, Vector4};

/// Below this magnitude a scalar is treated as zero.
pub const EPSILON: f64 = 1e-10;

/// Minimum distance between two vertices for them to count as distinct.
pub const DEGENERACY_TOLERANCE: f64 = 1e-8;

/// Squared-error tolerance on the barycentric sum.
pub const BARYCENTRIC_TOLERANCE: f64 = 1e-8;

/// The geometry a scene or mesh lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Metric {
    #[default]
    Euclidean,
    Hyperbolic,
    Elliptic,
}

impl Metric {
    /// Sign of the `w * w` term of the metric's bilinear form.
    #[inline]
    pub fn signature(self) -> f64 {
        match self {
            Metric::Euclidean => 0.0,
            Metric::Hyperbolic => -1.0,
            Metric::Elliptic => 1.0,
        }
    }
}

/// Builds a homogeneous point from 3 (w = 1) or 4 components.
pub fn to_homogeneous(row: &[f64]) -> Vector4<f64> {
    match row {
        [x, y, z, w, ..] => Vector4::new(*x, *y, *z, *w),
        [x, y, z] => Vector4::new(*x, *y, *z, 1.0),
        [x, y] => Vector4::new(*x, *y, 0.0, 1.0),
        [x] => Vector4::new(*x, 0.0, 0.0, 1.0),
        [] => Vector4::new(0.0, 0.0, 0.0, 1.0),
    }
}

/// Divides by `w` unless the point is at infinity.
#[inline]
pub fn dehomogenize(v: &Vector4<f64>) -> Vector4<f64> {
    if v.w.abs() < EPSILON || v.w == 1.0 {
        *v
    } else {
        v / v.w
    }
}

/// Euclidean position of a homogeneous point (the raw direction for `w == 0`).
#[inline]
pub fn to_point3(v: &Vector4<f64>) -> Point3<f64> {
    let d = dehomogenize(v);
    Point3::new(d.x, d.y, d.z)
}

/// Bilinear form of the metric.
pub fn inner_product(a: &Vector4<f64>, b: &Vector4<f64>, metric: Metric) -> f64 {
    a.xyz().dot(&b.xyz()) + metric.signature() * a.w * b.w
}

/// Normalises a point: dehomogenises in Euclidean space, scales to unit
/// (absolute) length under the metric otherwise.
pub fn normalize(v: &Vector4<f64>, metric: Metric) -> Vector4<f64> {
    match metric {
        Metric::Euclidean => {
            if v.w.abs() < EPSILON {
                let len = v.xyz().norm();
                if len < EPSILON { *v } else { v / len }
            } else {
                dehomogenize(v)
            }
        }
        _ => {
            let len2 = inner_product(v, v, metric).abs();
            if len2 < EPSILON * EPSILON {
                *v
            } else {
                v / len2.sqrt()
            }
        }
    }
}

/// Scales `v` to the given signed length under the metric.
pub fn set_to_length(v: &Vector4<f64>, length: f64, metric: Metric) -> Vector4<f64> {
    let len2 = match metric {
        Metric::Euclidean => v.xyz().norm_squared(),
        _ => inner_product(v, v, metric).abs(),
    };
    if len2 < EPSILON * EPSILON {
        *v
    } else {
        v * (length / len2.sqrt())
    }
}

/// Pole of a plane with respect to the metric's absolute quadric.
pub fn polarize_plane(plane: &Vector4<f64>, metric: Metric) -> Vector4<f64> {
    Vector4::new(plane.x, plane.y, plane.z, metric.signature() * plane.w)
}

/// Plane `(a, b, c, d)` through three homogeneous points, so that
/// `a x + b y + c z + d w = 0` for each of them.
///
/// For affine points the normal `(a, b, c)` is `(p1 - p0) x (p2 - p0)`.
pub fn plane_from_points(p0: &Vector4<f64>, p1: &Vector4<f64>, p2: &Vector4<f64>) -> Vector4<f64> {
    let rows = [p0, p1, p2];
    let minor = |skip: usize| {
        let cols: Vec<usize> = (0..4).filter(|&c| c != skip).collect();
        let m = nalgebra::Matrix3::from_fn(|r, c| rows[r][cols[c]]);
        m.determinant()
    };
    Vector4::new(minor(0), -minor(1), minor(2), -minor(3))
}

/// Distance between two points under the metric.
pub fn distance_between(a: &Vector4<f64>, b: &Vector4<f64>, metric: Metric) -> f64 {
    match metric {
        Metric::Euclidean => (to_point3(a) - to_point3(b)).norm(),
        Metric::Hyperbolic | Metric::Elliptic => {
            let ab = inner_product(a, b, metric);
            let aa = inner_product(a, a, metric);
            let bb = inner_product(b, b, metric);
            let denom = (aa * bb).abs().sqrt();
            if denom < EPSILON {
                return (to_point3(a) - to_point3(b)).norm();
            }
            let cosine = (ab / denom).abs();
            if metric == Metric::Hyperbolic {
                cosine.max(1.0).acosh()
            } else {
                cosine.min(1.0).acos()
            }
        }
    }
}

/// Parameter `t` with `point = from + t * (to - from)`, or `from + t * to`
/// when `to` is a direction.
pub fn affine_coordinate(from: &Vector4<f64>, to: &Vector4<f64>, point: &Vector4<f64>) -> f64 {
    let origin = to_point3(from);
    let direction = ray_direction(from, to);
    let len2 = direction.norm_squared();
    if len2 < EPSILON * EPSILON {
        return 0.0;
    }
    (to_point3(point) - origin).dot(&direction) / len2
}

/// Direction of the ray `from -> to` in Euclidean coordinates.
pub fn ray_direction(from: &Vector4<f64>, to: &Vector4<f64>) -> Vector3<f64> {
    if to.w.abs() < EPSILON {
        to.xyz()
    } else {
        to_point3(to) - to_point3(from)
    }
}

/// Transforms a Euclidean point by a projective matrix.
#[inline]
pub fn transform_point(m: &Matrix4<f64>, p: &Point3<f64>) -> Point3<f64> {
    to_point3(&(m * p.to_homogeneous()))
}

/// Uniform scale factor of a matrix (cube root of the linear part's determinant).
pub fn uniform_scale(m: &Matrix4<f64>) -> f64 {
    m.fixed_view::<3, 3>(0, 0).into_owned().determinant().abs().cbrt()
}

/// Binomial coefficient via the multiplicative formula.
pub fn binomial(n: u64, k: u64) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    (0..k).fold(1u64, |acc, i| acc * (n - i) / (i + 1))
}
