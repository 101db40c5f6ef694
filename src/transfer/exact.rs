//! Index-aligned copies, only valid between topologically identical meshes.

use glam::Vec3;

use crate::scene::{CornerLayer, Mesh, ShapeKey};

/// Moves every target vertex by its offset to the matching source vertex.
///
/// The same offset is applied to every shape key, so sculpted key deltas
/// survive. Keys the target doesn't have yet are created from the source's
/// key offsets on top of the moved base.
pub fn transfer_positions(target: &mut Mesh, source: &Mesh) {
    let offsets: Vec<Vec3> = source
        .vertices
        .iter()
        .zip(&target.vertices)
        .map(|(from, to)| *from - *to)
        .collect();

    for (position, offset) in target.vertices.iter_mut().zip(&offsets) {
        *position += *offset;
    }

    for key in &mut target.shape_keys {
        for (position, offset) in key.positions.iter_mut().zip(&offsets) {
            *position += *offset;
        }
    }

    add_missing_shape_keys(target, source);
}

/// Creates every source shape key the target lacks, placing each one at the
/// target's base plus the source key's offset from the source base.
pub fn add_missing_shape_keys(target: &mut Mesh, source: &Mesh) {
    for source_key in &source.shape_keys {
        if target.shape_key(&source_key.name).is_some() {
            continue;
        }

        log::trace!("Adding shape key {}", source_key.name);

        let positions = target
            .vertices
            .iter()
            .zip(source_key.positions.iter().zip(&source.vertices))
            .map(|(base, (key, source_base))| *base + (*key - *source_base))
            .collect();

        target.shape_keys.push(ShapeKey {
            name: source_key.name.clone(),
            positions,
            relative_key: source_key.relative_key.clone(),
            vertex_group: source_key.vertex_group.clone(),
            value: source_key.value,
        });
    }
}

pub fn transfer_faces(target: &mut Mesh, source: &Mesh) {
    for (to, from) in target.faces.iter_mut().zip(&source.faces) {
        to.material_index = from.material_index;
        to.smooth = from.smooth;
    }
}

pub fn transfer_seams(target: &mut Mesh, source: &Mesh) {
    for (to, from) in target.edges.iter_mut().zip(&source.edges) {
        to.seam = from.seam;
    }
}

/// Replaces the target's UV and colour layers with copies of the source's,
/// by loop index. Old layers are dropped outright since layer order isn't
/// stable between files.
pub fn transfer_corner_layers(target: &mut Mesh, source: &Mesh) {
    let loop_count = target.loop_count();

    target.uv_layers = source
        .uv_layers
        .iter()
        .map(|layer| copy_layer(layer, loop_count))
        .collect();

    target.color_layers = source
        .color_layers
        .iter()
        .map(|layer| copy_layer(layer, loop_count))
        .collect();
}

fn copy_layer<T: Copy + Default>(layer: &CornerLayer<T>, loop_count: usize) -> CornerLayer<T> {
    let mut copy = CornerLayer::new(layer.name.clone(), loop_count);

    for (to, from) in copy.data.iter_mut().zip(&layer.data) {
        *to = *from;
    }

    copy
}
