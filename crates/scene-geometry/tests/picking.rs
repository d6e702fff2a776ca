use std::rc::Rc;

use nalgebra::{Matrix4, Vector3, Vector4};
use scene_geometry::algo::SphereCache;
use scene_geometry::scene::{keys, AppearanceValue};
use scene_geometry::{
    AabbPickSystem, Appearance, Attribute, Category, FaceAttributes, Geometry, GeometryFactory, Hit,
    IndexedFaceSetFactory, PickConfig, PickType, SceneComponent, VertexAttributes,
};

fn faces_only() -> Appearance {
    Appearance::new("faces only")
        .with(keys::SHOW_POINTS, AppearanceValue::Bool(false))
        .with(keys::SHOW_LINES, AppearanceValue::Bool(false))
}

fn make_scene(geometry: Rc<Geometry>) -> SceneComponent {
    SceneComponent::new("root").with_appearance(faces_only()).with_child(
        SceneComponent::new("sphere")
            .with_transformation(Matrix4::new_translation(&Vector3::new(0.0, 0.0, 1.0)))
            .with_geometry(geometry),
    )
}

fn pick(config: PickConfig, root: &SceneComponent, from: Vector4<f64>, to: Vector4<f64>) -> Vec<Hit> {
    AabbPickSystem::with_config(config).compute_pick(root, &from, &to)
}

fn assert_sorted_in_front(hits: &[Hit]) {
    assert!(hits.iter().all(|h| h.affine() >= 0.0));
    assert!(hits.windows(2).all(|w| w[0].affine() <= w[1].affine()));
}

#[test]
fn hits_behind_the_origin_are_dropped() {
    let mut spheres = SphereCache::new();
    let root = make_scene(spheres.shared(2).unwrap());
    // From the sphere's centre upwards: the lower half lies behind.
    let hits = pick(
        PickConfig::default(),
        &root,
        Vector4::new(0.01, 0.02, 1.0, 1.0),
        Vector4::new(0.0, 0.0, 1.0, 0.0),
    );
    assert!(!hits.is_empty());
    assert_sorted_in_front(&hits);
    assert!(hits.iter().all(|h| h.world_point().z > 1.5));
    assert!(hits.iter().all(|h| h.pick_type() == PickType::Face));
}

#[test]
fn tree_and_brute_force_agree() {
    let mut spheres = SphereCache::new();
    let root = make_scene(spheres.shared(3).unwrap());
    let from = Vector4::new(0.13, 0.27, 6.0, 1.0);
    let to = Vector4::new(0.05, -0.02, -1.0, 0.0);

    let with_tree = pick(PickConfig::default(), &root, from, to);
    let brute_force = pick(
        PickConfig {
            use_aabb_tree: false,
            ..PickConfig::default()
        },
        &root,
        from,
        to,
    );
    assert_eq!(with_tree.len(), 2);
    assert_eq!(with_tree.len(), brute_force.len());
    assert_sorted_in_front(&with_tree);
    for (a, b) in with_tree.iter().zip(&brute_force) {
        assert!((a.world_point() - b.world_point()).norm() < 1e-9, "{a:?} vs {b:?}");
        assert_eq!(a.index(), b.index());
    }
}

#[test]
fn sphere_hits_carry_texture_coordinates() {
    let mut spheres = SphereCache::new();
    let root = make_scene(spheres.shared(1).unwrap());
    let hits = pick(
        PickConfig::default(),
        &root,
        Vector4::new(0.2, 0.1, 5.0, 1.0),
        Vector4::new(0.0, 0.0, -1.0, 0.0),
    );
    let uv = hits[0].texture_coordinates().unwrap();
    assert_eq!(uv.len(), 2);
    assert!(uv.iter().all(|c| (0.0..=1.0).contains(c)), "{uv:?}");
    // Near the north pole in object space.
    assert!(uv[1] > 0.75, "{uv:?}");
}

#[test]
fn factory_attached_tree_survives_queries() {
    let mut spheres = SphereCache::new();
    let sphere = spheres.independent(2).unwrap();
    let reader = sphere.read().unwrap();
    let coordinates = reader.f64_rows(Category::Vertex, &Attribute::COORDINATES).unwrap();
    let faces = reader.i32_rows(Category::Face, &Attribute::INDICES).unwrap();
    drop(reader);

    let mut factory = IndexedFaceSetFactory::new();
    factory.set_vertex_coordinates(coordinates).unwrap();
    factory.set_face_indices(faces).unwrap();
    factory.set_generate_aabb_tree(true);
    factory.update().unwrap();

    let root = make_scene(factory.geometry());
    let from = Vector4::new(-0.1, 0.3, 5.0, 1.0);
    let to = Vector4::new(0.0, 0.0, -1.0, 0.0);
    let mut system = AabbPickSystem::new();
    let first = system.compute_pick(&root, &from, &to);
    let second = system.compute_pick(&root, &from, &to);
    assert_eq!(first.len(), 2);
    assert_eq!(first.len(), second.len());
    assert!((first[0].world_point() - second[0].world_point()).norm() < 1e-12);
}
