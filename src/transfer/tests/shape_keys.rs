use glam::Vec3;

use crate::{
    fixtures::{basis_key, quad_strip},
    scene::{Driver, Face, Leaf, LeafData, Mesh, ShapeKey, VertexGroup},
    transfer::{exact, transfer_shape, GeometrySource, TransferPath},
};

fn with_smile(mut mesh: Mesh) -> Mesh {
    let mut smile = basis_key(&mesh);
    smile.name = "Smile".to_owned();
    smile.positions[0] += Vec3::new(0.0, 0.0, 1.0);

    mesh.shape_keys = vec![basis_key(&mesh), smile];
    mesh
}

fn close(a: Vec3, b: Vec3) -> bool {
    a.distance(b) < 1e-5
}

#[test]
fn key_offsets_are_added_to_the_target_base() {
    let source = with_smile(quad_strip());

    let mut target = quad_strip();
    target.vertices[0] += Vec3::new(1.0, 0.0, 0.0);

    exact::add_missing_shape_keys(&mut target, &source);

    let smile = target.shape_key("Smile").unwrap();
    assert_eq!(smile.positions[0], Vec3::new(1.0, 0.0, 1.0));
    assert_eq!(smile.positions[1], target.vertices[1]);
    assert_eq!(smile.relative_key, "Basis");
}

#[test]
fn exact_transfer_keeps_sculpted_deltas() {
    let _ = env_logger::try_init();

    let source_leaf = Leaf::new(LeafData::Mesh(with_smile(quad_strip())));

    let mut target_mesh = quad_strip();
    target_mesh.vertices[0] += Vec3::new(1.0, 0.0, 0.0);
    let mut frown = basis_key(&target_mesh);
    frown.name = "Frown".to_owned();
    frown.positions[3] += Vec3::new(0.0, -0.5, 0.0);
    target_mesh.shape_keys = vec![basis_key(&target_mesh), frown];
    let mut target = Leaf::new(LeafData::Mesh(target_mesh));

    let source = GeometrySource::new(&source_leaf);
    assert_eq!(transfer_shape(&mut target, &source), TransferPath::Exact);
    assert!(!source.has_bvh());

    let mesh = target.mesh().unwrap();
    assert_eq!(mesh.vertices, source_leaf.mesh().unwrap().vertices);

    let basis = mesh.shape_key("Basis").unwrap();
    assert_eq!(basis.positions, mesh.vertices);

    let frown = mesh.shape_key("Frown").unwrap();
    assert!(close(frown.positions[3] - mesh.vertices[3], Vec3::new(0.0, -0.5, 0.0)));

    let smile = mesh.shape_key("Smile").unwrap();
    assert!(close(smile.positions[0] - mesh.vertices[0], Vec3::new(0.0, 0.0, 1.0)));
}

/// A single quad covering the same area as the strip.
fn big_quad() -> Mesh {
    Mesh {
        vertices: vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ],
        faces: vec![Face::new(vec![0, 1, 2, 3])],
        ..Default::default()
    }
    .with_edges_from_faces()
}

#[test]
fn mismatched_topology_rebuilds_keys_and_weights() {
    let _ = env_logger::try_init();

    let mut old = big_quad();
    let mut bulge = basis_key(&old);
    bulge.name = "Bulge".to_owned();
    for position in &mut bulge.positions {
        *position += Vec3::new(0.0, 0.0, 1.0);
    }
    old.shape_keys = vec![basis_key(&old), bulge];
    old.vertex_groups = vec![VertexGroup {
        name: "Left".to_owned(),
        weights: vec![1.0, 0.0, 0.0, 1.0],
    }];

    let mut target = Leaf::new(LeafData::Mesh(old));
    target
        .drivers
        .push(Driver::scaffold("shape_keys[\"Bulge\"].value", None));

    let source_leaf = Leaf::new(LeafData::Mesh(quad_strip()));
    let source = GeometrySource::new(&source_leaf);

    assert_eq!(transfer_shape(&mut target, &source), TransferPath::Proximity);

    let mesh = target.mesh().unwrap();
    assert_eq!(mesh.vertices.len(), 6);
    assert_eq!(mesh.faces.len(), 2);

    let bulge = mesh.shape_key("Bulge").unwrap();
    for (key, base) in bulge.positions.iter().zip(&mesh.vertices) {
        assert!(close(*key - *base, Vec3::new(0.0, 0.0, 1.0)));
    }

    let left = &mesh.vertex_group("Left").unwrap().weights;
    assert!((left[0] - 1.0).abs() < 1e-5);
    assert!((left[1] - 0.5).abs() < 1e-5);
    assert!(left[4].abs() < 1e-5);

    assert_eq!(target.drivers.len(), 1);
}

#[test]
fn drivers_of_lost_keys_are_dropped() {
    let _ = env_logger::try_init();

    // No faces, so nothing can be interpolated from the old geometry.
    let mut old = Mesh {
        vertices: vec![Vec3::ZERO, Vec3::X],
        ..Default::default()
    };
    old.shape_keys = vec![ShapeKey {
        name: "Wink".to_owned(),
        positions: vec![Vec3::Z, Vec3::X],
        relative_key: "Basis".to_owned(),
        vertex_group: None,
        value: 0.0,
    }];

    let mut target = Leaf::new(LeafData::Mesh(old));
    target
        .drivers
        .push(Driver::scaffold("shape_keys[\"Wink\"].value", None));
    target.drivers.push(Driver::scaffold("location", Some(0)));

    let source_leaf = Leaf::new(LeafData::Mesh(quad_strip()));
    transfer_shape(&mut target, &GeometrySource::new(&source_leaf));

    assert!(target.mesh().unwrap().shape_key("Wink").is_none());
    assert_eq!(target.drivers.len(), 1);
    assert_eq!(target.drivers[0].data_path, "location");
}
