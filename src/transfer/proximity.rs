//! Spatial transfers for meshes whose topology differs. Every lookup goes
//! through the nearest point on the source surface.

use std::{
    collections::{HashMap, HashSet},
    ops::{Add, Mul},
};

use glam::Vec3;

use crate::scene::{sorted_pair, CornerLayer, Mesh, ShapeKey, VertexGroup};

use super::bvh::{barycentric_weights, closest_point_on_triangle, Bvh};

/// Values that can be blended with barycentric weights.
pub trait Blend: Copy + Default + PartialEq + Add<Output = Self> + Mul<f32, Output = Self> {}

impl<T> Blend for T where T: Copy + Default + PartialEq + Add<Output = T> + Mul<f32, Output = T> {}

/// Copies material index and shading from the source face nearest to each
/// target face's center.
pub fn transfer_faces(target: &mut Mesh, source: &Mesh, bvh: &Bvh) {
    for face_index in 0..target.faces.len() {
        let center = target.face_center(face_index);

        if let Some(nearest) = bvh.nearest(center) {
            let from = &source.faces[nearest.face];
            let to = &mut target.faces[face_index];
            to.material_index = from.material_index;
            to.smooth = from.smooth;
        }
    }
}

/// Copies the seam flag of the nearest source edge onto every target edge,
/// measured from the target edge's midpoint. Only the edges bounding the
/// source face nearest to the midpoint are considered.
pub fn transfer_seams(target: &mut Mesh, source: &Mesh, bvh: &Bvh) {
    if source.edges.is_empty() {
        return;
    }

    let edge_lookup = source.edge_lookup();

    for edge in &mut target.edges {
        let [a, b] = edge.vertices;
        let midpoint = (target.vertices[a as usize] + target.vertices[b as usize]) * 0.5;

        let nearest = match bvh.nearest(midpoint) {
            Some(nearest) => nearest,
            None => continue,
        };

        let corners = &source.faces[nearest.face].corners;
        let mut best = f32::INFINITY;

        for (i, &start) in corners.iter().enumerate() {
            let end = corners[(i + 1) % corners.len()];

            let source_edge = match edge_lookup.get(&sorted_pair([start, end])) {
                Some(&index) => &source.edges[index],
                None => continue,
            };

            let distance = distance_squared_to_segment(
                midpoint,
                source.vertices[start as usize],
                source.vertices[end as usize],
            );

            if distance < best {
                best = distance;
                edge.seam = source_edge.seam;
            }
        }
    }
}

/// Rebuilds the target's UV and colour layers by interpolating the source's,
/// without blending across the source's data seams.
pub fn transfer_corner_layers(target: &mut Mesh, source: &Mesh, bvh: &Bvh) {
    let topology = SourceTopology::new(source);
    let queries = corner_queries(target, bvh);
    let loop_count = target.loop_count();

    target.uv_layers = source
        .uv_layers
        .iter()
        .map(|layer| topology.transfer_layer(layer, &queries, loop_count))
        .collect();

    target.color_layers = source
        .color_layers
        .iter()
        .map(|layer| topology.transfer_layer(layer, &queries, loop_count))
        .collect();
}

/// Replaces the target's geometry with the source's, then rebuilds the
/// target's own shape keys and vertex weights on top of it.
///
/// The old geometry is moved aside before the swap and interpolated from
/// afterwards. Returns the names of shape keys that couldn't be rebuilt.
pub fn swap_geometry(target: &mut Mesh, source: &Mesh) -> Vec<String> {
    let staged = std::mem::replace(target, source.clone());
    let staged_bvh = Bvh::build(&staged);

    if staged_bvh.triangles().is_empty() {
        log::warn!("Previous geometry had no faces, its shape keys and weights are lost");
    } else {
        transfer_vertex_groups(target, &staged, &staged_bvh);
        transfer_shape_keys(target, &staged, &staged_bvh);
    }

    staged
        .shape_keys
        .iter()
        .filter(|key| target.shape_key(&key.name).is_none())
        .map(|key| key.name.clone())
        .collect()
}

/// Rebuilds every source shape key on the target: for each target vertex the
/// key offsets of the nearest source triangle are blended and added to the
/// target's current position.
pub fn transfer_shape_keys(target: &mut Mesh, source: &Mesh, bvh: &Bvh) {
    if source.shape_keys.is_empty() {
        return;
    }

    let hits = vertex_hits(target, bvh);

    for source_key in &source.shape_keys {
        let positions = target
            .vertices
            .iter()
            .zip(&hits)
            .map(|(&base, hit)| match hit {
                Some((vertices, weights)) => {
                    let offset: Vec3 = (0..3)
                        .map(|i| {
                            let vertex = vertices[i] as usize;
                            let offset = source_key
                                .positions
                                .get(vertex)
                                .map_or(Vec3::ZERO, |position| *position - source.vertices[vertex]);
                            offset * weights[i]
                        })
                        .sum();
                    base + offset
                }
                None => base,
            })
            .collect();

        let existing = target
            .shape_keys
            .iter_mut()
            .find(|key| key.name == source_key.name);

        match existing {
            Some(key) => {
                key.positions = positions;
                key.relative_key.clone_from(&source_key.relative_key);
                key.vertex_group.clone_from(&source_key.vertex_group);
            }
            None => target.shape_keys.push(ShapeKey {
                name: source_key.name.clone(),
                positions,
                relative_key: source_key.relative_key.clone(),
                vertex_group: source_key.vertex_group.clone(),
                value: source_key.value,
            }),
        }
    }
}

/// Rebuilds every source vertex group on the target by blending weights of
/// the nearest source triangle.
pub fn transfer_vertex_groups(target: &mut Mesh, source: &Mesh, bvh: &Bvh) {
    if source.vertex_groups.is_empty() {
        return;
    }

    let hits = vertex_hits(target, bvh);

    for group in &source.vertex_groups {
        let weight_of = |vertex: u32| group.weights.get(vertex as usize).copied().unwrap_or(0.0);

        let weights = hits
            .iter()
            .map(|hit| match hit {
                Some((vertices, weights)) => (0..3).map(|i| weight_of(vertices[i]) * weights[i]).sum(),
                None => 0.0,
            })
            .collect();

        match target.vertex_groups.iter_mut().find(|g| g.name == group.name) {
            Some(existing) => existing.weights = weights,
            None => target.vertex_groups.push(VertexGroup {
                name: group.name.clone(),
                weights,
            }),
        }
    }
}

/// For every target vertex, the vertices of the nearest source triangle and
/// the barycentric weights of the nearest point on it.
fn vertex_hits(target: &Mesh, bvh: &Bvh) -> Vec<Option<([u32; 3], [f32; 3])>> {
    target
        .vertices
        .iter()
        .map(|&position| {
            let nearest = bvh.nearest(position)?;
            let triangle = &bvh.triangles()[nearest.triangle];
            Some((triangle.vertices, triangle.weights(nearest.point)))
        })
        .collect()
}

/// Where a target corner sits relative to the source surface.
struct CornerQuery {
    center: Vec3,
    point: Vec3,

    /// Source face nearest to the center of the corner's face.
    center_face: usize,

    /// Source face nearest to the corner itself.
    corner_face: usize,
}

fn corner_queries(target: &Mesh, bvh: &Bvh) -> Vec<Option<CornerQuery>> {
    let mut queries = Vec::with_capacity(target.loop_count());

    for (face_index, face) in target.faces.iter().enumerate() {
        let center = target.face_center(face_index);
        let center_face = bvh.nearest(center).map(|nearest| nearest.face);

        for &vertex in &face.corners {
            let point = target.vertices[vertex as usize];
            let corner_face = bvh.nearest(point).map(|nearest| nearest.face);

            queries.push(match (center_face, corner_face) {
                (Some(center_face), Some(corner_face)) => Some(CornerQuery {
                    center,
                    point,
                    center_face,
                    corner_face,
                }),
                _ => None,
            });
        }
    }

    queries
}

/// Face connectivity of the source mesh, used to walk across its surface.
struct SourceTopology<'a> {
    mesh: &'a Mesh,
    loop_starts: Vec<usize>,
    edge_faces: HashMap<(u32, u32), Vec<usize>>,
}

impl<'a> SourceTopology<'a> {
    fn new(mesh: &'a Mesh) -> Self {
        let mut edge_faces: HashMap<(u32, u32), Vec<usize>> = HashMap::new();

        for (face_index, face) in mesh.faces.iter().enumerate() {
            for edge in face_edges(&face.corners) {
                edge_faces.entry(sorted_pair(edge)).or_default().push(face_index);
            }
        }

        SourceTopology {
            mesh,
            loop_starts: mesh.loop_starts(),
            edge_faces,
        }
    }

    fn transfer_layer<T: Blend>(
        &self,
        layer: &CornerLayer<T>,
        queries: &[Option<CornerQuery>],
        loop_count: usize,
    ) -> CornerLayer<T> {
        let mut result = CornerLayer::new(layer.name.clone(), loop_count);

        for (value, query) in result.data.iter_mut().zip(queries) {
            let query = match query {
                Some(query) => query,
                None => continue,
            };

            let face = self.settle_face(query, layer);
            if let Some(interpolated) = self.interpolate(face, query.point, layer) {
                *value = interpolated;
            }
        }

        result
    }

    /// Walks from the center face toward the corner face, one shared edge at
    /// a time, and returns the face the walk stopped on. The walk stops short
    /// of any edge the layer's data is split along, so a corner only ever
    /// takes values from the island its face center lies in.
    fn settle_face<T: Blend>(&self, query: &CornerQuery, layer: &CornerLayer<T>) -> usize {
        let mut current = query.center_face;
        let mut visited_faces = HashSet::new();
        let mut crossed_edges = HashSet::new();

        while current != query.corner_face {
            visited_faces.insert(current);

            let edge = match self.crossing_edge(current, query.center, query.point, &crossed_edges) {
                Some(edge) => edge,
                None => break,
            };

            let next = match self.other_face(edge, current) {
                Some(next) => next,
                None => break,
            };

            crossed_edges.insert(sorted_pair(edge));

            if self.is_split(edge, layer) {
                log::trace!("Stopping walk at a seam in {}", layer.name);
                break;
            }

            current = next;

            if visited_faces.contains(&current) {
                current = query.center_face;
                break;
            }
        }

        current
    }

    /// The edge of `face` that the segment `from -> to` passes through.
    fn crossing_edge(
        &self,
        face: usize,
        from: Vec3,
        to: Vec3,
        skip: &HashSet<(u32, u32)>,
    ) -> Option<[u32; 2]> {
        face_edges(&self.mesh.faces[face].corners).find(|&edge| {
            if skip.contains(&sorted_pair(edge)) {
                return false;
            }

            let start = self.mesh.vertices[edge[0] as usize];
            let end = self.mesh.vertices[edge[1] as usize];

            match closest_line_params(from, to, start, end) {
                Some((along_segment, along_edge)) => {
                    (0.0..=1.0).contains(&along_segment) && (0.0..=1.0).contains(&along_edge)
                }
                None => false,
            }
        })
    }

    /// The face on the other side of an edge, if exactly two faces share it.
    fn other_face(&self, edge: [u32; 2], face: usize) -> Option<usize> {
        match self.edge_faces.get(&sorted_pair(edge))?.as_slice() {
            [a, b] if *a == face => Some(*b),
            [a, b] if *b == face => Some(*a),
            _ => None,
        }
    }

    /// Whether the faces around an edge disagree on the layer's value at
    /// either of its vertices.
    fn is_split<T: Blend>(&self, edge: [u32; 2], layer: &CornerLayer<T>) -> bool {
        let faces = match self.edge_faces.get(&sorted_pair(edge)) {
            Some(faces) => faces,
            None => return false,
        };

        for vertex in edge {
            let mut first = None;

            for &face in faces {
                let start = self.loop_starts[face];

                for (offset, &corner) in self.mesh.faces[face].corners.iter().enumerate() {
                    if corner != vertex {
                        continue;
                    }

                    let value = match layer.data.get(start + offset) {
                        Some(value) => *value,
                        None => continue,
                    };

                    match first {
                        None => first = Some(value),
                        Some(first) if first != value => return true,
                        Some(_) => {}
                    }
                }
            }
        }

        false
    }

    /// Blends the layer's values at the corners of the face's triangle
    /// closest to `point`.
    fn interpolate<T: Blend>(&self, face: usize, point: Vec3, layer: &CornerLayer<T>) -> Option<T> {
        let corners = &self.mesh.faces[face].corners;
        let start = self.loop_starts[face];

        let (offsets, positions, closest) = self
            .mesh
            .face_triangles(face)
            .into_iter()
            .map(|offsets| {
                let positions = offsets.map(|offset| self.mesh.vertices[corners[offset] as usize]);
                (offsets, positions, closest_point_on_triangle(point, positions))
            })
            .min_by(|a, b| {
                a.2.distance_squared(point)
                    .total_cmp(&b.2.distance_squared(point))
            })?;

        let weights = barycentric_weights(closest, positions);

        let mut value = T::default();
        for i in 0..3 {
            value = value + *layer.data.get(start + offsets[i])? * weights[i];
        }

        Some(value)
    }
}

fn face_edges(corners: &[u32]) -> impl Iterator<Item = [u32; 2]> + '_ {
    let count = corners.len();
    (0..count).map(move |i| [corners[i], corners[(i + 1) % count]])
}

/// Parameters of the closest points between the infinite lines through
/// `p1 -> p2` and `q1 -> q2`, or `None` if they are parallel.
fn closest_line_params(p1: Vec3, p2: Vec3, q1: Vec3, q2: Vec3) -> Option<(f32, f32)> {
    let d1 = p2 - p1;
    let d2 = q2 - q1;
    let r = p1 - q1;

    let a = d1.dot(d1);
    let b = d1.dot(d2);
    let c = d1.dot(r);
    let e = d2.dot(d2);
    let f = d2.dot(r);

    let denom = a * e - b * b;
    if denom.abs() <= f32::EPSILON * a * e || a == 0.0 || e == 0.0 {
        return None;
    }

    let s = (b * f - c * e) / denom;
    let t = (a * f - b * c) / denom;
    Some((s, t))
}

fn distance_squared_to_segment(point: Vec3, start: Vec3, end: Vec3) -> f32 {
    let along = end - start;
    let length_squared = along.length_squared();

    if length_squared == 0.0 {
        return point.distance_squared(start);
    }

    let t = ((point - start).dot(along) / length_squared).clamp(0.0, 1.0);
    point.distance_squared(start + along * t)
}
