//! Pick state scoped to a scene subtree.

use nalgebra::Matrix4;

use crate::math::{uniform_scale, Metric, EPSILON};
use crate::scene::{keys, Appearance};

/// Which elements are pickable below a component, and how thick they are.
#[derive(Debug, Clone, PartialEq)]
pub struct PickInfo {
    pub show_points: bool,
    pub show_lines: bool,
    pub show_faces: bool,
    pub pickable_points: bool,
    pub pickable_lines: bool,
    pub pickable_faces: bool,
    pub point_radius: f64,
    pub tube_radius: f64,
    /// Radii are given in world units rather than object units.
    pub radii_world_coordinates: bool,
    pub metric: Metric,
}

impl Default for PickInfo {
    fn default() -> Self {
        Self {
            show_points: true,
            show_lines: true,
            show_faces: true,
            pickable_points: true,
            pickable_lines: true,
            pickable_faces: true,
            point_radius: keys::POINT_RADIUS_DEFAULT,
            tube_radius: keys::TUBE_RADIUS_DEFAULT,
            radii_world_coordinates: false,
            metric: Metric::Euclidean,
        }
    }
}

impl PickInfo {
    /// This state with every value `appearance` sets explicitly replaced.
    pub fn inherit(&self, appearance: &Appearance) -> PickInfo {
        let flag = |key: &str, current: bool| appearance.get_bool(key).unwrap_or(current);
        let number = |key: &str, current: f64| appearance.get_double(key).unwrap_or(current);
        PickInfo {
            show_points: flag(keys::SHOW_POINTS, self.show_points),
            show_lines: flag(keys::SHOW_LINES, self.show_lines),
            show_faces: flag(keys::SHOW_FACES, self.show_faces),
            pickable_points: flag(keys::PICKABLE_POINTS, self.pickable_points),
            pickable_lines: flag(keys::PICKABLE_LINES, self.pickable_lines),
            pickable_faces: flag(keys::PICKABLE_FACES, self.pickable_faces),
            point_radius: number(keys::POINT_RADIUS, self.point_radius),
            tube_radius: number(keys::TUBE_RADIUS, self.tube_radius),
            radii_world_coordinates: flag(keys::RADII_WORLD_COORDINATES, self.radii_world_coordinates),
            metric: appearance.get_metric(keys::METRIC).unwrap_or(self.metric),
        }
    }

    #[inline]
    pub fn picks_points(&self) -> bool {
        self.show_points && self.pickable_points
    }

    #[inline]
    pub fn picks_lines(&self) -> bool {
        self.show_lines && self.pickable_lines
    }

    #[inline]
    pub fn picks_faces(&self) -> bool {
        self.show_faces && self.pickable_faces
    }

    /// A radius in object units under the object-to-world `matrix`.
    pub fn object_radius(&self, radius: f64, matrix: &Matrix4<f64>) -> f64 {
        if !self.radii_world_coordinates {
            return radius;
        }
        let scale = uniform_scale(matrix);
        if scale < EPSILON { radius } else { radius / scale }
    }
}
