//! Visitor pattern for scene graph traversal.
//!
//! Every method has a default. Geometry methods fall back from the most
//! specific kind to the most general one (face set, line set, point set,
//! then [`SceneVisitor::visit_geometry`]), so a visitor only implements
//! the cases it cares about.

use std::rc::Rc;

use nalgebra::Matrix4;

use super::{Appearance, Primitive, SceneComponent, SceneGeometry};
use crate::geometry::Geometry;

pub trait SceneVisitor {
    /// Called for each component. The default descends into it.
    fn visit_component(&mut self, component: &SceneComponent) {
        component.children_accept(self);
    }

    fn visit_transformation(&mut self, _matrix: &Matrix4<f64>) {}

    fn visit_appearance(&mut self, _appearance: &Appearance) {}

    /// Fallback for every geometry kind.
    fn visit_geometry(&mut self, _geometry: &SceneGeometry) {}

    fn visit_point_set(&mut self, geometry: &Rc<Geometry>) {
        self.visit_geometry(&SceneGeometry::Indexed(Rc::clone(geometry)));
    }

    fn visit_line_set(&mut self, geometry: &Rc<Geometry>) {
        self.visit_point_set(geometry);
    }

    fn visit_face_set(&mut self, geometry: &Rc<Geometry>) {
        self.visit_line_set(geometry);
    }

    fn visit_sphere(&mut self, sphere: &Primitive) {
        self.visit_geometry(&SceneGeometry::Sphere(sphere.clone()));
    }

    fn visit_cylinder(&mut self, cylinder: &Primitive) {
        self.visit_geometry(&SceneGeometry::Cylinder(cylinder.clone()));
    }

    fn visit_clipping_plane(&mut self) {
        self.visit_geometry(&SceneGeometry::ClippingPlane);
    }
}
