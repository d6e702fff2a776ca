//! A minimal scene graph: components carrying a transformation, an
//! appearance, a geometry and children.

mod appearance;
mod path;
mod visitor;

pub use appearance::{keys, Appearance, AppearanceValue};
pub use path::ScenePath;
pub use visitor::SceneVisitor;

use std::rc::Rc;

use nalgebra::Matrix4;

use crate::bounds::Rectangle3D;
use crate::geometry::{Geometry, GeometryKind};

/// A built-in shape with no vertex data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Primitive {
    /// Explicit bound, replacing the canonical unit cube.
    pub bounding_box: Option<Rectangle3D>,
}

/// The geometry slot of a component.
#[derive(Debug, Clone)]
pub enum SceneGeometry {
    Indexed(Rc<Geometry>),
    /// Unit sphere around the origin.
    Sphere(Primitive),
    /// Unit radius cylinder along z from -1 to 1.
    Cylinder(Primitive),
    ClippingPlane,
}

impl SceneGeometry {
    pub fn accept<V: SceneVisitor + ?Sized>(&self, visitor: &mut V) {
        match self {
            SceneGeometry::Indexed(geometry) => match geometry.kind() {
                GeometryKind::PointSet => visitor.visit_point_set(geometry),
                GeometryKind::LineSet => visitor.visit_line_set(geometry),
                GeometryKind::FaceSet => visitor.visit_face_set(geometry),
            },
            SceneGeometry::Sphere(sphere) => visitor.visit_sphere(sphere),
            SceneGeometry::Cylinder(cylinder) => visitor.visit_cylinder(cylinder),
            SceneGeometry::ClippingPlane => visitor.visit_clipping_plane(),
        }
    }

    pub fn as_indexed(&self) -> Option<&Rc<Geometry>> {
        match self {
            SceneGeometry::Indexed(geometry) => Some(geometry),
            _ => None,
        }
    }
}

impl From<Rc<Geometry>> for SceneGeometry {
    fn from(geometry: Rc<Geometry>) -> Self {
        SceneGeometry::Indexed(geometry)
    }
}

/// A node of the scene graph. Children are owned.
#[derive(Debug, Clone)]
pub struct SceneComponent {
    name: String,
    visible: bool,
    pickable: bool,
    transformation: Option<Matrix4<f64>>,
    appearance: Option<Appearance>,
    geometry: Option<SceneGeometry>,
    children: Vec<SceneComponent>,
}

impl SceneComponent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            pickable: true,
            transformation: None,
            appearance: None,
            geometry: None,
            children: Vec::new(),
        }
    }

    pub fn with_transformation(mut self, matrix: Matrix4<f64>) -> Self {
        self.transformation = Some(matrix);
        self
    }

    pub fn with_appearance(mut self, appearance: Appearance) -> Self {
        self.appearance = Some(appearance);
        self
    }

    pub fn with_geometry(mut self, geometry: impl Into<SceneGeometry>) -> Self {
        self.geometry = Some(geometry.into());
        self
    }

    pub fn with_child(mut self, child: SceneComponent) -> Self {
        self.children.push(child);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    #[inline]
    pub fn is_pickable(&self) -> bool {
        self.pickable
    }

    pub fn set_pickable(&mut self, pickable: bool) {
        self.pickable = pickable;
    }

    pub fn transformation(&self) -> Option<&Matrix4<f64>> {
        self.transformation.as_ref()
    }

    pub fn set_transformation(&mut self, matrix: Option<Matrix4<f64>>) {
        self.transformation = matrix;
    }

    pub fn appearance(&self) -> Option<&Appearance> {
        self.appearance.as_ref()
    }

    pub fn appearance_mut(&mut self) -> &mut Appearance {
        self.appearance.get_or_insert_with(Appearance::default)
    }

    pub fn geometry(&self) -> Option<&SceneGeometry> {
        self.geometry.as_ref()
    }

    pub fn set_geometry(&mut self, geometry: Option<SceneGeometry>) {
        self.geometry = geometry;
    }

    pub fn children(&self) -> &[SceneComponent] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<SceneComponent> {
        &mut self.children
    }

    pub fn add_child(&mut self, child: SceneComponent) {
        self.children.push(child);
    }

    pub fn accept<V: SceneVisitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_component(self);
    }

    /// Visits transformation, appearance, geometry and children, in that order.
    pub fn children_accept<V: SceneVisitor + ?Sized>(&self, visitor: &mut V) {
        if let Some(matrix) = &self.transformation {
            visitor.visit_transformation(matrix);
        }
        if let Some(appearance) = &self.appearance {
            visitor.visit_appearance(appearance);
        }
        if let Some(geometry) = &self.geometry {
            geometry.accept(visitor);
        }
        for child in &self.children {
            child.accept(visitor);
        }
    }
}
