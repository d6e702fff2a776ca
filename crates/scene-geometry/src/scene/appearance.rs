//! Appearance attributes attached to scene components.

use std::collections::BTreeMap;

use crate::bounds::Rectangle3D;
use crate::math::Metric;

/// Well-known appearance keys and their defaults.
pub mod keys {
    pub const SHOW_POINTS: &str = "showPoints";
    pub const SHOW_LINES: &str = "showLines";
    pub const SHOW_FACES: &str = "showFaces";
    pub const PICKABLE_POINTS: &str = "pointShader.pickable";
    pub const PICKABLE_LINES: &str = "lineShader.pickable";
    pub const PICKABLE_FACES: &str = "polygonShader.pickable";
    pub const POINT_RADIUS: &str = "pointShader.pointRadius";
    pub const TUBE_RADIUS: &str = "lineShader.tubeRadius";
    pub const RADII_WORLD_COORDINATES: &str = "radiiWorldCoordinates";
    pub const METRIC: &str = "metric";
    pub const BOUNDING_BOX: &str = "boundingBox";

    pub const POINT_RADIUS_DEFAULT: f64 = 0.025;
    pub const TUBE_RADIUS_DEFAULT: f64 = 0.025;
}

/// A value stored in an [`Appearance`].
#[derive(Debug, Clone, PartialEq)]
pub enum AppearanceValue {
    Bool(bool),
    Double(f64),
    Metric(Metric),
    BoundingBox(Rectangle3D),
    /// Explicitly defers to the parent; same as not setting the key.
    Inherited,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Appearance {
    name: String,
    attributes: BTreeMap<String, AppearanceValue>,
}

impl Appearance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set(&mut self, key: impl Into<String>, value: AppearanceValue) -> &mut Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Builder form of [`Appearance::set`].
    pub fn with(mut self, key: impl Into<String>, value: AppearanceValue) -> Self {
        self.set(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<AppearanceValue> {
        self.attributes.remove(key)
    }

    /// The explicitly set value for `key`. `Inherited` reads as unset.
    pub fn get(&self, key: &str) -> Option<&AppearanceValue> {
        match self.attributes.get(key) {
            Some(AppearanceValue::Inherited) | None => None,
            value => value,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            AppearanceValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn get_double(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            AppearanceValue::Double(value) => Some(*value),
            _ => None,
        }
    }

    pub fn get_metric(&self, key: &str) -> Option<Metric> {
        match self.get(key)? {
            AppearanceValue::Metric(value) => Some(*value),
            _ => None,
        }
    }

    pub fn get_bounding_box(&self, key: &str) -> Option<&Rectangle3D> {
        match self.get(key)? {
            AppearanceValue::BoundingBox(value) => Some(value),
            _ => None,
        }
    }
}
