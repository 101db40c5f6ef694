//! Scene builders shared by the test suites.

use glam::{Vec2, Vec3};
use uuid::Uuid;

use crate::scene::{
    CornerLayer, Face, IdentityTag, Leaf, LeafData, Mesh, Node, NodeId, Scene, ShapeKey,
};

pub const ASSET: &str = "hero";

pub fn tag_for(uuid: Uuid) -> IdentityTag {
    IdentityTag {
        asset: ASSET.to_owned(),
        layer: "modelling".to_owned(),
        version: 1,
        uuid: Some(uuid),
    }
}

pub fn container(name: &str, uuid: Uuid) -> Node {
    Node::container(name).tagged(tag_for(uuid))
}

pub fn mesh_leaf(name: &str, uuid: Uuid, mesh: Mesh) -> Node {
    Node::leaf(name, Leaf::new(LeafData::Mesh(mesh))).tagged(tag_for(uuid))
}

pub fn empty_leaf(name: &str, uuid: Uuid) -> Node {
    Node::leaf(name, Leaf::new(LeafData::Empty)).tagged(tag_for(uuid))
}

pub fn add(scene: &mut Scene, parent: Option<NodeId>, node: Node) -> NodeId {
    let parent = parent.unwrap_or_else(|| scene.tree.root_id());
    scene.tree.insert(parent, node)
}

/// Two unit quads side by side along X, sharing the edge x = 1.
///
/// ```text
/// 3---2---5
/// |   |   |
/// 0---1---4
/// ```
pub fn quad_strip() -> Mesh {
    Mesh {
        vertices: vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 1.0, 0.0),
        ],
        faces: vec![Face::new(vec![0, 1, 2, 3]), Face::new(vec![1, 4, 5, 2])],
        ..Default::default()
    }
    .with_edges_from_faces()
}

/// A UV layer mapping every corner of the strip to its planar position.
pub fn planar_uvs(mesh: &Mesh, name: &str) -> CornerLayer<Vec2> {
    CornerLayer {
        name: name.to_owned(),
        data: mesh
            .loop_vertices()
            .into_iter()
            .map(|vertex| mesh.vertices[vertex as usize].truncate())
            .collect(),
    }
}

pub fn basis_key(mesh: &Mesh) -> ShapeKey {
    ShapeKey {
        name: "Basis".to_owned(),
        positions: mesh.vertices.clone(),
        relative_key: "Basis".to_owned(),
        vertex_group: None,
        value: 0.0,
    }
}
