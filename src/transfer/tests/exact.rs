use glam::{Vec2, Vec3, Vec4};

use crate::{
    fixtures::{planar_uvs, quad_strip},
    scene::{CornerLayer, Leaf, LeafData, Mesh},
    transfer::{is_topology_exact, transfer_shape, transfer_surfacing, GeometrySource, TransferPath},
};

fn painted_source() -> Mesh {
    let mut mesh = quad_strip();

    for vertex in &mut mesh.vertices {
        *vertex += Vec3::new(0.0, 0.0, 0.25);
    }

    mesh.faces[0].material_index = 2;
    mesh.faces[1].smooth = true;
    mesh.edges[3].seam = true;

    let mut uvs = planar_uvs(&mesh, "UVMap");
    uvs.data[5] = Vec2::new(0.9, 0.1);
    mesh.uv_layers = vec![CornerLayer::new("Old", mesh.loop_count()), uvs];
    mesh.color_layers = vec![CornerLayer {
        name: "PREVIEW".to_owned(),
        data: vec![Vec4::ONE; mesh.loop_count()],
    }];

    mesh
}

#[test]
fn topology_check_compares_edges_in_order() {
    let a = Leaf::new(LeafData::Mesh(quad_strip()));
    let mut b = Leaf::new(LeafData::Mesh(quad_strip()));

    assert!(is_topology_exact(&a, &b));

    if let LeafData::Mesh(mesh) = &mut b.data {
        mesh.edges[0].vertices.swap(0, 1);
    }
    assert!(!is_topology_exact(&a, &b));

    assert!(!is_topology_exact(&a, &Leaf::new(LeafData::Empty)));
}

#[test]
fn identical_topology_copies_exactly_without_bvh() {
    let _ = env_logger::try_init();

    let source_leaf = Leaf::new(LeafData::Mesh(painted_source()));
    let mut target = Leaf::new(LeafData::Mesh(quad_strip()));
    target.mesh_mut().unwrap().uv_layers = vec![CornerLayer::new("Stale", 8)];

    let source = GeometrySource::new(&source_leaf);

    assert_eq!(transfer_shape(&mut target, &source), TransferPath::Exact);
    assert_eq!(transfer_surfacing(&mut target, &source), TransferPath::Exact);
    assert!(!source.has_bvh());

    let from = source_leaf.mesh().unwrap();
    let to = target.mesh().unwrap();

    assert_eq!(to.vertices, from.vertices);
    assert_eq!(to.faces, from.faces);
    assert_eq!(to.edges, from.edges);
    assert_eq!(to.uv_layers, from.uv_layers);
    assert_eq!(to.color_layers, from.color_layers);
    assert_eq!(to.active_uv, Some(1));
    assert_eq!(to.active_color, Some(0));
}

#[test]
fn empty_meshes_are_skipped() {
    let _ = env_logger::try_init();

    let source_leaf = Leaf::new(LeafData::Mesh(quad_strip()));
    let source = GeometrySource::new(&source_leaf);
    let mut target = Leaf::new(LeafData::Mesh(Mesh::default()));

    assert_eq!(transfer_shape(&mut target, &source), TransferPath::Skipped);
    assert_eq!(transfer_surfacing(&mut target, &source), TransferPath::Skipped);
    assert!(target.mesh().unwrap().is_empty());
}
