use scene_geometry::algo::primitives::{cube, icosahedron, torus};
use scene_geometry::algo::{binary_refine, implode, triangulate, BezierPatchMesh, RefineOutcome, SphereCache};
use scene_geometry::{
    Attribute, Category, DataList, FaceAttributes, GeometryError, GeometryFactory, IndexedFaceSetFactory,
    QuadMeshFactory, VertexAttributes,
};

#[test]
fn cube_faces_give_twelve_edges() {
    let cube = cube().unwrap();
    let reader = cube.read().unwrap();
    assert_eq!(reader.face_count(), 6);
    assert_eq!(reader.edge_count(), 12);
    let edges = reader.i32_rows(Category::Edge, &Attribute::INDICES).unwrap();
    let mut keys: Vec<(i32, i32)> = edges.iter().map(|e| (e[0].min(e[1]), e[0].max(e[1]))).collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), 12);
}

#[test]
fn icosahedral_refinement_stays_on_sphere() {
    let mut spheres = SphereCache::new();
    for k in 0..5u32 {
        let sphere = spheres.shared(k as usize).unwrap();
        let reader = sphere.read().unwrap();
        assert_eq!(reader.face_count(), 20 * 4usize.pow(k));
        for p in reader.f64_rows(Category::Vertex, &Attribute::COORDINATES).unwrap() {
            let norm = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            assert!((norm - 1.0).abs() <= 1e-9, "level {k}: {norm}");
        }
    }
}

#[test]
fn refining_the_icosahedron_matches_level_one() {
    let ico = icosahedron().unwrap();
    let RefineOutcome::Refined(refined) = binary_refine(&ico).unwrap() else {
        panic!("icosahedron is a closed triangle mesh");
    };
    let reader = refined.read().unwrap();
    assert_eq!((reader.vertex_count(), reader.edge_count(), reader.face_count()), (42, 120, 80));
}

#[test]
fn single_triangle_refinement() {
    let mut factory = IndexedFaceSetFactory::new();
    factory
        .set_vertex_coordinates(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
        .unwrap();
    factory.set_face_indices(vec![[0, 1, 2]]).unwrap();
    factory.set_generate_edges_from_faces(true);
    factory.update().unwrap();
    assert_eq!(factory.geometry().read().unwrap().edge_count(), 3);

    let outcome = binary_refine(&factory.geometry()).unwrap();
    let refined = outcome.geometry().unwrap();
    let reader = refined.read().unwrap();
    assert_eq!(reader.vertex_count(), 6);
    assert_eq!(reader.face_count(), 4);
    assert!(reader.is_triangulated());
}

#[test]
fn bezier_refinement_is_continuous() {
    let rows: Vec<Vec<Vec<f64>>> = (0..4)
        .map(|v| (0..4).map(|u| vec![u as f64, v as f64, 0.0]).collect())
        .collect();
    let original = BezierPatchMesh::from_rows(3, 3, &rows).unwrap();
    let mut refined = original.clone();
    refined.refine();
    assert_eq!((refined.u_segments(), refined.v_segments()), (2, 2));
    let shared = refined.control_points()[3][3];
    let midpoint = original.evaluate(0.5, 0.5);
    assert!((shared - midpoint).norm() < 1e-12, "{shared:?} vs {midpoint:?}");
    assert!((midpoint.x - 1.5).abs() < 1e-12 && (midpoint.y - 1.5).abs() < 1e-12);
}

#[test]
fn quad_mesh_rejects_face_indices() {
    let mut factory = QuadMeshFactory::new(3, 3, false, false).unwrap();
    let err = factory.set_face_indices(vec![[0, 1, 4, 3]]).unwrap_err();
    assert_eq!(err, GeometryError::DerivedTopology { category: Category::Face });
}

#[test]
fn mismatched_vertex_attribute_is_rejected() {
    let mut factory = IndexedFaceSetFactory::new();
    factory
        .set_vertex_attribute(Attribute::COORDINATES, DataList::from(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]))
        .unwrap();
    let err = factory
        .set_vertex_attribute(Attribute::COLORS, DataList::from(vec![[1.0, 0.0, 0.0, 1.0]; 3]))
        .unwrap_err();
    assert!(matches!(err, GeometryError::CountMismatch { expected: 2, actual: 3, .. }));
}

#[test]
fn torus_seam_normals_match() {
    let torus = torus(2.0, 0.5, 10, 8).unwrap();
    let reader = torus.read().unwrap();
    let normals = reader.f64_rows(Category::Vertex, &Attribute::NORMALS).unwrap();
    for v in 0..8 {
        let (first, last) = (&normals[v * 10], &normals[v * 10 + 9]);
        let length = first.iter().take(3).map(|c| c * c).sum::<f64>().sqrt();
        assert!((length - 1.0).abs() < 1e-9);
        assert!(first.iter().zip(last).all(|(a, b)| (a - b).abs() < 1e-12), "{first:?} vs {last:?}");
    }
}

#[test]
fn triangulate_then_implode_keeps_face_colors() {
    let mut factory = IndexedFaceSetFactory::new();
    factory
        .set_vertex_coordinates(vec![[0.0, 0.0, 0.0], [2.0, 1.0, 0.0], [4.0, 0.0, 0.0], [2.0, 4.0, 0.0]])
        .unwrap();
    factory.set_face_indices(vec![vec![0, 1, 2, 3]]).unwrap();
    factory.set_face_colors(&[vec![0.0, 0.5, 1.0]]).unwrap();
    factory.update().unwrap();

    let triangles = triangulate(&factory.geometry()).unwrap();
    let exploded = implode(&triangles, 0.8).unwrap();
    let reader = exploded.read().unwrap();
    assert_eq!(reader.face_count(), 2);
    assert_eq!(reader.vertex_count(), 6);
    let colors = reader.f64_rows(Category::Face, &Attribute::COLORS).unwrap();
    assert!(colors.iter().all(|c| c == &vec![0.0, 0.5, 1.0, 1.0]));
}
