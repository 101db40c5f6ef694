//! A bounding volume hierarchy over a mesh's triangulated faces, answering
//! nearest-point queries.

use glam::Vec3;

use crate::scene::Mesh;

/// Triangles per leaf before a node gets split.
const LEAF_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn empty() -> Self {
        Aabb {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    pub fn grow(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn union(mut self, other: &Aabb) -> Self {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self
    }

    pub fn distance_squared(&self, point: Vec3) -> f32 {
        let outside = (self.min - point).max(point - self.max).max(Vec3::ZERO);
        outside.length_squared()
    }

    fn longest_axis(&self) -> usize {
        let size = self.max - self.min;
        if size.x >= size.y && size.x >= size.z {
            0
        } else if size.y >= size.z {
            1
        } else {
            2
        }
    }
}

/// One triangle of a fan-triangulated face.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub positions: [Vec3; 3],

    /// Vertex index of each corner.
    pub vertices: [u32; 3],

    /// Loop index of each corner.
    pub loops: [usize; 3],

    pub face: usize,
}

impl Triangle {
    fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::empty();
        for position in self.positions {
            bounds.grow(position);
        }
        bounds
    }

    fn centroid(&self) -> Vec3 {
        (self.positions[0] + self.positions[1] + self.positions[2]) / 3.0
    }

    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        closest_point_on_triangle(point, self.positions)
    }

    /// Barycentric weights of a point lying on this triangle.
    pub fn weights(&self, point: Vec3) -> [f32; 3] {
        barycentric_weights(point, self.positions)
    }
}

/// Splits every face of a mesh into triangles, in face order.
pub fn triangulate(mesh: &Mesh) -> Vec<Triangle> {
    let starts = mesh.loop_starts();
    let mut triangles = Vec::new();

    for (face_index, face) in mesh.faces.iter().enumerate() {
        for offsets in mesh.face_triangles(face_index) {
            let vertices = offsets.map(|offset| face.corners[offset]);

            triangles.push(Triangle {
                positions: vertices.map(|vertex| mesh.vertices[vertex as usize]),
                vertices,
                loops: offsets.map(|offset| starts[face_index] + offset),
                face: face_index,
            });
        }
    }

    triangles
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest {
    /// Index into [`Bvh::triangles`].
    pub triangle: usize,
    pub face: usize,
    pub point: Vec3,
    pub distance_squared: f32,
}

#[derive(Debug)]
enum BvhNode {
    Leaf {
        bounds: Aabb,
        start: usize,
        count: usize,
    },
    Branch {
        bounds: Aabb,
        left: usize,
        right: usize,
    },
}

impl BvhNode {
    fn bounds(&self) -> &Aabb {
        match self {
            BvhNode::Leaf { bounds, .. } | BvhNode::Branch { bounds, .. } => bounds,
        }
    }
}

#[derive(Debug)]
pub struct Bvh {
    triangles: Vec<Triangle>,

    /// Triangle indices, grouped so every leaf node owns a contiguous run.
    order: Vec<usize>,

    nodes: Vec<BvhNode>,
}

impl Bvh {
    pub fn build(mesh: &Mesh) -> Self {
        let triangles = triangulate(mesh);
        let mut order: Vec<usize> = (0..triangles.len()).collect();
        let mut nodes = Vec::new();

        if !triangles.is_empty() {
            let count = order.len();
            build_node(&triangles, &mut order, 0, count, &mut nodes);
        }

        log::trace!(
            "Built BVH with {} triangle(s) in {} node(s)",
            triangles.len(),
            nodes.len()
        );

        Bvh {
            triangles,
            order,
            nodes,
        }
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Finds the point on the mesh surface closest to `point`. Ties go to the
    /// triangle that comes first in face order.
    pub fn nearest(&self, point: Vec3) -> Option<Nearest> {
        let mut best: Option<Nearest> = None;
        let mut stack = Vec::new();

        if !self.nodes.is_empty() {
            stack.push(0);
        }

        while let Some(node_index) = stack.pop() {
            let node = &self.nodes[node_index];
            let bound = node.bounds().distance_squared(point);

            if let Some(best) = &best {
                if bound > best.distance_squared {
                    continue;
                }
            }

            match *node {
                BvhNode::Leaf { start, count, .. } => {
                    for &triangle_index in &self.order[start..start + count] {
                        let triangle = &self.triangles[triangle_index];
                        let closest = triangle.closest_point(point);
                        let distance_squared = closest.distance_squared(point);

                        let better = match &best {
                            None => true,
                            Some(best) => {
                                distance_squared < best.distance_squared
                                    || (distance_squared == best.distance_squared
                                        && triangle_index < best.triangle)
                            }
                        };

                        if better {
                            best = Some(Nearest {
                                triangle: triangle_index,
                                face: triangle.face,
                                point: closest,
                                distance_squared,
                            });
                        }
                    }
                }
                BvhNode::Branch { left, right, .. } => {
                    let left_distance = self.nodes[left].bounds().distance_squared(point);
                    let right_distance = self.nodes[right].bounds().distance_squared(point);

                    // Visit the closer child first.
                    if left_distance <= right_distance {
                        stack.push(right);
                        stack.push(left);
                    } else {
                        stack.push(left);
                        stack.push(right);
                    }
                }
            }
        }

        best
    }
}

fn build_node(
    triangles: &[Triangle],
    order: &mut [usize],
    start: usize,
    count: usize,
    nodes: &mut Vec<BvhNode>,
) -> usize {
    let slice = &mut order[start..start + count];

    let bounds = slice
        .iter()
        .map(|&index| triangles[index].bounds())
        .fold(Aabb::empty(), |acc, bounds| acc.union(&bounds));

    let node_index = nodes.len();

    if count <= LEAF_SIZE {
        nodes.push(BvhNode::Leaf {
            bounds,
            start,
            count,
        });
        return node_index;
    }

    let mut centroid_bounds = Aabb::empty();
    for &index in slice.iter() {
        centroid_bounds.grow(triangles[index].centroid());
    }

    let axis = centroid_bounds.longest_axis();
    slice.sort_by(|&a, &b| {
        let a = triangles[a].centroid()[axis];
        let b = triangles[b].centroid()[axis];
        a.total_cmp(&b)
    });

    // Placeholder, patched once both children exist.
    nodes.push(BvhNode::Leaf {
        bounds,
        start,
        count,
    });

    let half = count / 2;
    let left = build_node(triangles, order, start, half, nodes);
    let right = build_node(triangles, order, start + half, count - half, nodes);

    nodes[node_index] = BvhNode::Branch {
        bounds,
        left,
        right,
    };

    node_index
}

/// Closest point to `p` on the triangle `abc`, from Ericson's Real-Time
/// Collision Detection.
pub fn closest_point_on_triangle(p: Vec3, [a, b, c]: [Vec3; 3]) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

/// Barycentric weights of `p` with respect to triangle `abc`. Degenerate
/// triangles put all the weight on the nearest corner.
pub fn barycentric_weights(p: Vec3, [a, b, c]: [Vec3; 3]) -> [f32; 3] {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;

    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);

    let denom = d00 * d11 - d01 * d01;
    if denom.abs() <= f32::EPSILON * (d00 * d11).max(f32::MIN_POSITIVE) {
        let distances = [a, b, c].map(|corner| corner.distance_squared(p));
        let mut weights = [0.0; 3];
        let nearest = (0..3)
            .min_by(|&i, &j| distances[i].total_cmp(&distances[j]))
            .unwrap_or(0);
        weights[nearest] = 1.0;
        return weights;
    }

    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    [1.0 - v - w, v, w]
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::scene::Face;

    fn grid(size: usize) -> Mesh {
        let mut vertices = Vec::new();
        for y in 0..=size {
            for x in 0..=size {
                vertices.push(Vec3::new(x as f32, y as f32, 0.0));
            }
        }

        let row = size as u32 + 1;
        let mut faces = Vec::new();
        for y in 0..size as u32 {
            for x in 0..size as u32 {
                let a = y * row + x;
                faces.push(Face::new(vec![a, a + 1, a + row + 1, a + row]));
            }
        }

        Mesh {
            vertices,
            faces,
            ..Default::default()
        }
    }

    #[test]
    fn closest_point_regions() {
        let tri = [Vec3::ZERO, Vec3::X, Vec3::Y];

        assert_eq!(closest_point_on_triangle(Vec3::new(-1.0, -1.0, 0.0), tri), Vec3::ZERO);
        assert_eq!(closest_point_on_triangle(Vec3::new(0.5, -1.0, 0.0), tri), Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(
            closest_point_on_triangle(Vec3::new(0.25, 0.25, 3.0), tri),
            Vec3::new(0.25, 0.25, 0.0)
        );
    }

    #[test]
    fn weights_reproduce_the_point() {
        let tri = [Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 0.0)];
        let point = Vec3::new(0.5, 1.0, 0.0);

        let [u, v, w] = barycentric_weights(point, tri);
        let rebuilt = tri[0] * u + tri[1] * v + tri[2] * w;

        assert!((u + v + w - 1.0).abs() < 1e-6);
        assert!(rebuilt.distance(point) < 1e-6);
    }

    #[test]
    fn nearest_matches_brute_force() {
        let mesh = grid(6);
        let bvh = Bvh::build(&mesh);

        for probe in [
            Vec3::new(0.1, 0.2, 1.0),
            Vec3::new(3.5, 2.5, -0.5),
            Vec3::new(5.9, 5.9, 0.0),
            Vec3::new(-2.0, 4.3, 0.0),
        ] {
            let nearest = bvh.nearest(probe).unwrap();

            let brute = bvh
                .triangles()
                .iter()
                .map(|triangle| triangle.closest_point(probe).distance_squared(probe))
                .fold(f32::INFINITY, f32::min);

            assert!((nearest.distance_squared - brute).abs() < 1e-5);
        }

        let inside = bvh.nearest(Vec3::new(3.5, 2.5, 0.2)).unwrap();
        assert_eq!(inside.face, 2 * 6 + 3);
    }

    #[test]
    fn empty_mesh_has_no_nearest() {
        assert!(Bvh::build(&Mesh::default()).nearest(Vec3::ZERO).is_none());
    }
}
