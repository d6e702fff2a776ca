//! World-space bounding boxes of scene subtrees.

mod rectangle;

pub use rectangle::{Rectangle2D, Rectangle3D};

use std::rc::Rc;

use nalgebra::{Matrix4, Point3};

use crate::attribute::{Attribute, Category};
use crate::geometry::{keys as geometry_keys, Geometry, GeometryAttribute};
use crate::math::{to_homogeneous, to_point3, transform_point};
use crate::scene::{keys, Primitive, SceneComponent, SceneVisitor};

/// Accumulates the bound of everything it visits under the current transform.
///
/// Priority per component: an appearance bounding box replaces the whole
/// subtree; otherwise the component's transformation is applied and its
/// geometry and children are visited. For a geometry, an explicit bounding
/// box attribute wins over a height field domain, which wins over the
/// transformed vertices.
#[derive(Debug, Clone)]
pub struct BoundingBoxTraversal {
    bound: Rectangle3D,
    matrix: Matrix4<f64>,
}

impl Default for BoundingBoxTraversal {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundingBoxTraversal {
    pub fn new() -> Self {
        Self::with_matrix(Matrix4::identity())
    }

    /// Starts from an initial object-to-world transform.
    pub fn with_matrix(matrix: Matrix4<f64>) -> Self {
        Self {
            bound: Rectangle3D::empty(),
            matrix,
        }
    }

    pub fn traverse(&mut self, root: &SceneComponent) {
        root.accept(self);
    }

    /// The accumulated bound, empty when nothing was visited or a bound
    /// turned NaN.
    pub fn bounding_box(&self) -> Rectangle3D {
        Rectangle3D::new(self.bound.min(), self.bound.max())
    }

    fn union_transformed(&mut self, bound: &Rectangle3D) {
        self.bound = self.bound.union(&bound.transform(&self.matrix));
    }

    fn union_primitive(&mut self, primitive: &Primitive) {
        let bound = primitive.bounding_box.unwrap_or_else(Rectangle3D::unit_cube);
        self.union_transformed(&bound);
    }

    fn union_geometry(&mut self, geometry: &Geometry) {
        let Ok(reader) = geometry.read() else {
            log::warn!("skipping geometry {} in bounding box, it is being written", geometry.id());
            return;
        };
        let explicit = reader
            .geometry_attribute(geometry_keys::BOUNDING_BOX)
            .and_then(|attribute| match &*attribute {
                GeometryAttribute::BoundingBox(bound) => Some(*bound),
                _ => None,
            });
        if let Some(bound) = explicit {
            self.union_transformed(&bound);
            return;
        }
        let vertices = reader
            .f64_rows(Category::Vertex, &Attribute::COORDINATES)
            .unwrap_or_default();
        let height_field = reader
            .geometry_attribute(geometry_keys::HEIGHT_FIELD_SHAPE)
            .and_then(|attribute| match &*attribute {
                GeometryAttribute::HeightField(domain) => Some(*domain),
                _ => None,
            });
        if let Some(domain) = height_field {
            let Some((low, high)) = height_range(&vertices) else {
                return;
            };
            let bound = Rectangle3D::new(
                Point3::new(domain.min.x, domain.min.y, low),
                Point3::new(domain.max.x, domain.max.y, high),
            );
            self.union_transformed(&bound);
            return;
        }
        for row in &vertices {
            let p = to_point3(&to_homogeneous(row));
            self.bound.add_point(&transform_point(&self.matrix, &p));
        }
    }
}

impl SceneVisitor for BoundingBoxTraversal {
    fn visit_component(&mut self, component: &SceneComponent) {
        if !component.is_visible() {
            return;
        }
        if let Some(bound) = component
            .appearance()
            .and_then(|a| a.get_bounding_box(keys::BOUNDING_BOX))
        {
            self.bound = self.bound.union(bound);
            return;
        }
        let saved = self.matrix;
        component.children_accept(self);
        self.matrix = saved;
    }

    fn visit_transformation(&mut self, matrix: &Matrix4<f64>) {
        self.matrix *= matrix;
    }

    fn visit_point_set(&mut self, geometry: &Rc<Geometry>) {
        self.union_geometry(geometry);
    }

    fn visit_sphere(&mut self, sphere: &Primitive) {
        self.union_primitive(sphere);
    }

    fn visit_cylinder(&mut self, cylinder: &Primitive) {
        self.union_primitive(cylinder);
    }

    fn visit_clipping_plane(&mut self) {}
}

/// World-space bound of a component including its own transformation.
pub fn calculate_bounding_box(component: &SceneComponent) -> Rectangle3D {
    let mut traversal = BoundingBoxTraversal::new();
    traversal.traverse(component);
    traversal.bounding_box()
}

/// Bound of a component's geometry and children in its own coordinates.
///
/// The component's transformation is ignored; an appearance bounding box
/// still applies.
pub fn calculate_children_bounding_box(component: &SceneComponent) -> Rectangle3D {
    let mut local = component.clone();
    local.set_transformation(None);
    calculate_bounding_box(&local)
}

/// The z-range of height field values.
///
/// A one-component row is the height itself; longer rows contribute their
/// dehomogenized z. NaN heights are skipped.
fn height_range(rows: &[Vec<f64>]) -> Option<(f64, f64)> {
    rows.iter()
        .filter_map(|row| match row.as_slice() {
            [] => None,
            [h] => Some(*h),
            _ => Some(to_point3(&to_homogeneous(row)).z),
        })
        .filter(|h| !h.is_nan())
        .fold(None, |range, h| match range {
            None => Some((h, h)),
            Some((low, high)) => Some((f64::min(low, h), f64::max(high, h))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataList;
    use crate::scene::{Appearance, AppearanceValue, SceneGeometry};
    use nalgebra::{Point2, Vector3};

    fn make_points(points: Vec<[f64; 3]>) -> Rc<Geometry> {
        let geometry = Geometry::point_set();
        geometry
            .write()
            .unwrap()
            .set_attribute(Category::Vertex, Attribute::COORDINATES, DataList::from(points))
            .unwrap();
        Rc::new(geometry)
    }

    #[test]
    fn invisible_component_is_ignored() {
        let mut hidden = SceneComponent::new("hidden").with_geometry(make_points(vec![[100.0, 0.0, 0.0]]));
        hidden.set_visible(false);
        let root = SceneComponent::new("root")
            .with_geometry(make_points(vec![[1.0, 1.0, 1.0]]))
            .with_child(hidden);
        let bound = calculate_bounding_box(&root);
        assert_eq!(bound.max(), Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn geometry_bounding_box_attribute_wins() {
        let geometry = make_points(vec![[50.0, 50.0, 50.0]]);
        let explicit = Rectangle3D::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        geometry
            .write()
            .unwrap()
            .set_geometry_attribute(geometry_keys::BOUNDING_BOX, GeometryAttribute::BoundingBox(explicit));
        let root = SceneComponent::new("root")
            .with_transformation(Matrix4::new_translation(&Vector3::new(0.0, 0.0, 1.0)))
            .with_geometry(geometry);
        let bound = calculate_bounding_box(&root);
        assert_eq!(bound.min(), Point3::new(0.0, 0.0, 1.0));
        assert_eq!(bound.max(), Point3::new(1.0, 1.0, 2.0));
    }

    #[test]
    fn height_field_uses_domain_and_heights() {
        let geometry = make_points(vec![[0.0, 0.0, -2.0], [0.0, 0.0, 3.0]]);
        geometry.write().unwrap().set_geometry_attribute(
            geometry_keys::HEIGHT_FIELD_SHAPE,
            GeometryAttribute::HeightField(Rectangle2D::new(Point2::new(-1.0, -1.0), Point2::new(4.0, 5.0))),
        );
        let bound = calculate_bounding_box(&SceneComponent::new("root").with_geometry(geometry));
        assert_eq!(bound.min(), Point3::new(-1.0, -1.0, -2.0));
        assert_eq!(bound.max(), Point3::new(4.0, 5.0, 3.0));
    }

    #[test]
    fn scalar_heights_give_the_z_range() {
        let geometry = Geometry::point_set();
        geometry
            .write()
            .unwrap()
            .set_attribute(Category::Vertex, Attribute::COORDINATES, DataList::from(vec![[-2.0], [3.0], [0.5]]))
            .unwrap();
        geometry.write().unwrap().set_geometry_attribute(
            geometry_keys::HEIGHT_FIELD_SHAPE,
            GeometryAttribute::HeightField(Rectangle2D::new(Point2::new(-1.0, -1.0), Point2::new(4.0, 5.0))),
        );
        let bound = calculate_bounding_box(&SceneComponent::new("root").with_geometry(Rc::new(geometry)));
        assert_eq!(bound.min(), Point3::new(-1.0, -1.0, -2.0));
        assert_eq!(bound.max(), Point3::new(4.0, 5.0, 3.0));
    }

    #[test]
    fn height_range_skips_nan() {
        assert_eq!(height_range(&[vec![1.0], vec![f64::NAN], vec![-1.0]]), Some((-1.0, 1.0)));
        assert_eq!(height_range(&[vec![0.0, 0.0, 4.0, 2.0]]), Some((2.0, 2.0)));
        assert_eq!(height_range(&[]), None);
    }

    #[test]
    fn sphere_uses_scaled_unit_cube() {
        let root = SceneComponent::new("root")
            .with_transformation(Matrix4::new_scaling(2.0))
            .with_geometry(SceneGeometry::Sphere(Primitive::default()));
        let bound = calculate_bounding_box(&root);
        assert_eq!(bound.min(), Point3::new(-2.0, -2.0, -2.0));
        assert_eq!(bound.max(), Point3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn children_bound_ignores_own_transformation() {
        let root = SceneComponent::new("root")
            .with_transformation(Matrix4::new_translation(&Vector3::new(5.0, 0.0, 0.0)))
            .with_geometry(make_points(vec![[1.0, 0.0, 0.0]]));
        assert_eq!(calculate_children_bounding_box(&root).min(), Point3::new(1.0, 0.0, 0.0));
        assert_eq!(calculate_bounding_box(&root).min(), Point3::new(6.0, 0.0, 0.0));
    }

    #[test]
    fn sibling_transforms_do_not_leak() {
        let root = SceneComponent::new("root")
            .with_child(
                SceneComponent::new("moved")
                    .with_transformation(Matrix4::new_translation(&Vector3::new(10.0, 0.0, 0.0)))
                    .with_geometry(make_points(vec![[0.0, 0.0, 0.0]])),
            )
            .with_child(SceneComponent::new("still").with_geometry(make_points(vec![[0.0, 0.0, 0.0]])));
        let bound = calculate_bounding_box(&root);
        assert_eq!(bound.min(), Point3::origin());
        assert_eq!(bound.max(), Point3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn override_box_is_not_transformed_further() {
        let override_box = Rectangle3D::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let root = SceneComponent::new("root").with_appearance(
            Appearance::new("app").with(keys::BOUNDING_BOX, AppearanceValue::BoundingBox(override_box)),
        );
        assert_eq!(calculate_bounding_box(&root), override_box);
    }
}
