use glam::{Vec2, Vec3};

use crate::{
    fixtures::{planar_uvs, quad_strip},
    scene::{sorted_pair, Face, Leaf, LeafData, Mesh},
    transfer::{transfer_surfacing, GeometrySource, TransferPath},
};

/// One quad straddling the strip's middle edge. Its center lies over the
/// strip's left face, its right-hand corners over the right face.
fn straddling_quad() -> Mesh {
    Mesh {
        vertices: vec![
            Vec3::new(0.2, 0.0, 0.0),
            Vec3::new(1.6, 0.0, 0.0),
            Vec3::new(1.6, 1.0, 0.0),
            Vec3::new(0.2, 1.0, 0.0),
        ],
        faces: vec![Face::new(vec![0, 1, 2, 3])],
        ..Default::default()
    }
    .with_edges_from_faces()
}

fn assert_uvs(actual: &[Vec2], expected: &[Vec2]) {
    assert_eq!(actual.len(), expected.len());

    for (actual, expected) in actual.iter().zip(expected) {
        assert!(
            actual.distance(*expected) < 1e-5,
            "expected {:?}, got {:?}",
            expected,
            actual
        );
    }
}

#[test]
fn corners_cross_continuous_edges() {
    let _ = env_logger::try_init();

    let mut source_mesh = quad_strip();
    source_mesh.uv_layers = vec![planar_uvs(&source_mesh, "UVMap")];
    let source_leaf = Leaf::new(LeafData::Mesh(source_mesh));
    let source = GeometrySource::new(&source_leaf);

    let mut target = Leaf::new(LeafData::Mesh(straddling_quad()));

    assert_eq!(transfer_surfacing(&mut target, &source), TransferPath::Proximity);
    assert!(source.has_bvh());

    assert_uvs(
        &target.mesh().unwrap().uv_layers[0].data,
        &[
            Vec2::new(0.2, 0.0),
            Vec2::new(1.6, 0.0),
            Vec2::new(1.6, 1.0),
            Vec2::new(0.2, 1.0),
        ],
    );
}

#[test]
fn corners_never_blend_across_a_uv_seam() {
    let _ = env_logger::try_init();

    let mut source_mesh = quad_strip();
    let mut uvs = planar_uvs(&source_mesh, "UVMap");

    // Move the right face to its own island.
    for uv in &mut uvs.data[4..8] {
        *uv += Vec2::new(10.0, 0.0);
    }
    source_mesh.uv_layers = vec![uvs];

    let source_leaf = Leaf::new(LeafData::Mesh(source_mesh));
    let source = GeometrySource::new(&source_leaf);

    let mut target = Leaf::new(LeafData::Mesh(straddling_quad()));
    transfer_surfacing(&mut target, &source);

    let result = &target.mesh().unwrap().uv_layers[0].data;

    // Every corner stays on the left island, clamped to its border.
    assert_uvs(
        result,
        &[
            Vec2::new(0.2, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.2, 1.0),
        ],
    );
    assert!(result.iter().all(|uv| uv.x <= 1.0 + 1e-5));
}

#[test]
fn face_attributes_come_from_nearest_face() {
    let _ = env_logger::try_init();

    let mut source_mesh = quad_strip();
    source_mesh.faces[1].material_index = 3;
    source_mesh.faces[1].smooth = true;
    source_mesh.edges.iter_mut().for_each(|edge| edge.seam = edge.vertices.contains(&4));

    let source_leaf = Leaf::new(LeafData::Mesh(source_mesh));
    let source = GeometrySource::new(&source_leaf);

    // A quad sitting entirely over the strip's right face.
    let mut target = Leaf::new(LeafData::Mesh(
        Mesh {
            vertices: vec![
                Vec3::new(1.2, 0.0, 0.1),
                Vec3::new(2.0, 0.0, 0.1),
                Vec3::new(2.0, 0.8, 0.1),
                Vec3::new(1.2, 0.8, 0.1),
            ],
            faces: vec![Face::new(vec![0, 1, 2, 3])],
            ..Default::default()
        }
        .with_edges_from_faces(),
    ));

    transfer_surfacing(&mut target, &source);

    let mesh = target.mesh().unwrap();
    assert_eq!(mesh.faces[0].material_index, 3);
    assert!(mesh.faces[0].smooth);

    // The bottom edge runs along the source's seam from 1 to 4.
    assert!(mesh.edges[0].seam);
}

#[test]
fn seams_come_from_the_nearest_face_edges() {
    let _ = env_logger::try_init();

    let mut source_mesh = quad_strip();
    source_mesh
        .edges
        .iter_mut()
        .filter(|edge| sorted_pair(edge.vertices) == (1, 2))
        .for_each(|edge| edge.seam = true);

    let source_leaf = Leaf::new(LeafData::Mesh(source_mesh));
    let source = GeometrySource::new(&source_leaf);

    // A quad over the strip's left face whose right edge hugs the seam.
    let mut target = Leaf::new(LeafData::Mesh(
        Mesh {
            vertices: vec![
                Vec3::new(0.3, 0.0, 0.0),
                Vec3::new(0.95, 0.0, 0.0),
                Vec3::new(0.95, 1.0, 0.0),
                Vec3::new(0.3, 1.0, 0.0),
                Vec3::new(0.3, 0.5, 0.0),
            ],
            faces: vec![Face::new(vec![0, 1, 2, 3, 4])],
            ..Default::default()
        }
        .with_edges_from_faces(),
    ));

    assert_eq!(transfer_surfacing(&mut target, &source), TransferPath::Proximity);

    let seams: Vec<bool> = target.mesh().unwrap().edges.iter().map(|e| e.seam).collect();
    assert_eq!(seams, vec![false, true, false, false, false]);
}
