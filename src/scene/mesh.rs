//! Geometry payloads carried by leaves: polygon meshes and curves.

use std::collections::HashMap;

use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub edges: Vec<Edge>,
    pub faces: Vec<Face>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uv_layers: Vec<CornerLayer<Vec2>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_uv: Option<usize>,

    /// The UV layer used when rendering, which can differ from the one being
    /// edited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_uv: Option<usize>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub color_layers: Vec<CornerLayer<Vec4>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_color: Option<usize>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shape_keys: Vec<ShapeKey>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vertex_groups: Vec<VertexGroup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub vertices: [u32; 2],

    #[serde(default)]
    pub seam: bool,
}

impl Edge {
    pub fn new(a: u32, b: u32) -> Self {
        Edge {
            vertices: [a, b],
            seam: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    /// Vertex indices of the face corners, in winding order. Corners of all
    /// faces laid end to end make up the mesh's loop list.
    pub corners: Vec<u32>,

    #[serde(default)]
    pub material_index: usize,

    #[serde(default)]
    pub smooth: bool,
}

impl Face {
    pub fn new(corners: Vec<u32>) -> Self {
        Face {
            corners,
            material_index: 0,
            smooth: false,
        }
    }
}

/// A named per-corner attribute, indexed by loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CornerLayer<T> {
    pub name: String,
    pub data: Vec<T>,
}

impl<T: Copy + Default> CornerLayer<T> {
    pub fn new(name: impl Into<String>, loop_count: usize) -> Self {
        CornerLayer {
            name: name.into(),
            data: vec![T::default(); loop_count],
        }
    }
}

/// A named set of vertex positions. The key's effect is its offset from the
/// base mesh, so moving the base moves every key with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeKey {
    pub name: String,
    pub positions: Vec<Vec3>,

    /// Name of the key this one is relative to. The base mesh is usually
    /// called "Basis".
    pub relative_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_group: Option<String>,

    #[serde(default)]
    pub value: f32,
}

/// Per-vertex weights. Unassigned vertices have a weight of zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexGroup {
    pub name: String,
    pub weights: Vec<f32>,
}

impl Mesh {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Checks that every face corner and edge points at an existing vertex.
    pub fn check_indices(&self) -> Result<(), String> {
        let vertex_count = self.vertices.len();
        let in_range = |vertex: u32| (vertex as usize) < vertex_count;

        for (index, face) in self.faces.iter().enumerate() {
            if let Some(vertex) = face.corners.iter().find(|&&v| !in_range(v)) {
                return Err(format!(
                    "face {} uses vertex {} but the mesh has {} vertices",
                    index, vertex, vertex_count
                ));
            }
        }

        for (index, edge) in self.edges.iter().enumerate() {
            if let Some(vertex) = edge.vertices.iter().find(|&&v| !in_range(v)) {
                return Err(format!(
                    "edge {} uses vertex {} but the mesh has {} vertices",
                    index, vertex, vertex_count
                ));
            }
        }

        Ok(())
    }

    pub fn loop_count(&self) -> usize {
        self.faces.iter().map(|face| face.corners.len()).sum()
    }

    /// Index of the first loop of every face.
    pub fn loop_starts(&self) -> Vec<usize> {
        let mut starts = Vec::with_capacity(self.faces.len());
        let mut next = 0;

        for face in &self.faces {
            starts.push(next);
            next += face.corners.len();
        }

        starts
    }

    /// Vertex index of every loop.
    pub fn loop_vertices(&self) -> Vec<u32> {
        self.faces
            .iter()
            .flat_map(|face| face.corners.iter().copied())
            .collect()
    }

    /// Median of the face's corner positions.
    pub fn face_center(&self, face_index: usize) -> Vec3 {
        let face = &self.faces[face_index];
        if face.corners.is_empty() {
            return Vec3::ZERO;
        }

        let sum: Vec3 = face
            .corners
            .iter()
            .map(|&vertex| self.vertices[vertex as usize])
            .sum();

        sum / face.corners.len() as f32
    }

    /// Fan triangulation of a face, as corner offsets into the face.
    pub fn face_triangles(&self, face_index: usize) -> Vec<[usize; 3]> {
        let corner_count = self.faces[face_index].corners.len();
        (1..corner_count.saturating_sub(1))
            .map(|i| [0, i, i + 1])
            .collect()
    }

    /// Maps an unordered vertex pair to its edge index.
    pub fn edge_lookup(&self) -> HashMap<(u32, u32), usize> {
        self.edges
            .iter()
            .enumerate()
            .map(|(index, edge)| (sorted_pair(edge.vertices), index))
            .collect()
    }

    pub fn shape_key(&self, name: &str) -> Option<&ShapeKey> {
        self.shape_keys.iter().find(|key| key.name == name)
    }

    pub fn vertex_group(&self, name: &str) -> Option<&VertexGroup> {
        self.vertex_groups.iter().find(|group| group.name == name)
    }

    /// Builds the edge list from the face list, one edge per unique pair of
    /// consecutive corners. Handy when authoring meshes by hand.
    pub fn with_edges_from_faces(mut self) -> Self {
        let mut seen = HashMap::new();
        let mut edges = Vec::new();

        for face in &self.faces {
            let count = face.corners.len();
            for i in 0..count {
                let pair = [face.corners[i], face.corners[(i + 1) % count]];
                seen.entry(sorted_pair(pair)).or_insert_with(|| {
                    edges.push(Edge::new(pair[0], pair[1]));
                    edges.len() - 1
                });
            }
        }

        self.edges = edges;
        self
    }
}

/// An edge's vertex pair with the lower index first.
pub fn sorted_pair([a, b]: [u32; 2]) -> (u32, u32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub splines: Vec<Spline>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spline {
    pub points: Vec<Vec3>,

    #[serde(default)]
    pub material_index: usize,

    #[serde(default)]
    pub cyclic: bool,
}
