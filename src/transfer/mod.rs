//! Copies geometry and surfacing between a matched pair of leaves.
//!
//! When both leaves share their topology exactly, everything is copied by
//! index. Otherwise attributes are looked up spatially on the source surface
//! through a [`Bvh`] and interpolated.

mod active;
mod bvh;
mod exact;
mod proximity;
mod slots;

#[cfg(test)]
mod tests;

use std::cell::OnceCell;

use crate::scene::{Driver, Leaf, LeafData, Mesh};

pub use active::{activate_preview_textures, apply_active_layers};
pub use bvh::{barycentric_weights, closest_point_on_triangle, Aabb, Bvh, Nearest, Triangle};
pub use slots::transfer_material_slots;

/// Which strategy a transfer ended up using.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPath {
    Exact,
    Proximity,

    /// Nothing was transferred; the reason has been logged.
    Skipped,
}

/// The source side of a leaf transfer. The BVH over the source mesh is only
/// built the first time a proximity lookup needs it, and then reused.
pub struct GeometrySource<'a> {
    leaf: &'a Leaf,
    bvh: OnceCell<Bvh>,
}

impl<'a> GeometrySource<'a> {
    pub fn new(leaf: &'a Leaf) -> Self {
        GeometrySource {
            leaf,
            bvh: OnceCell::new(),
        }
    }

    pub fn leaf(&self) -> &'a Leaf {
        self.leaf
    }

    pub fn mesh(&self) -> Option<&'a Mesh> {
        self.leaf.mesh()
    }

    /// The BVH over the source mesh, built on first use. Sources that aren't
    /// meshes have none.
    pub fn bvh(&self) -> Option<&Bvh> {
        let mesh = self.mesh()?;

        Some(self.bvh.get_or_init(|| {
            log::debug!("Building BVH over {} source face(s)", mesh.faces.len());
            Bvh::build(mesh)
        }))
    }

    pub fn has_bvh(&self) -> bool {
        self.bvh.get().is_some()
    }
}

/// Whether two leaves are structurally identical, so attributes can be
/// copied index for index.
///
/// Meshes need equal vertex, edge and face counts, and every edge has to
/// connect the same vertices in the same order. Curves need the same number
/// of splines with the same number of points each.
pub fn is_topology_exact(target: &Leaf, source: &Leaf) -> bool {
    match (&target.data, &source.data) {
        (LeafData::Mesh(a), LeafData::Mesh(b)) => {
            a.vertices.len() == b.vertices.len()
                && a.edges.len() == b.edges.len()
                && a.faces.len() == b.faces.len()
                && a
                    .edges
                    .iter()
                    .zip(&b.edges)
                    .all(|(a, b)| a.vertices == b.vertices)
        }
        (LeafData::Curve(a), LeafData::Curve(b))
        | (LeafData::HairCurves(a), LeafData::HairCurves(b)) => {
            a.splines.len() == b.splines.len()
                && a
                    .splines
                    .iter()
                    .zip(&b.splines)
                    .all(|(a, b)| a.points.len() == b.points.len())
        }
        _ => false,
    }
}

/// Transfers vertex positions and shape keys, the geometry a modelling
/// update owns.
///
/// With matching topology every vertex moves by its offset to the source and
/// shape keys move along with it. Otherwise the target's geometry is replaced
/// by the source's, and its shape keys and vertex weights are rebuilt from a
/// staged copy of what it had before.
pub fn transfer_shape(target: &mut Leaf, source: &GeometrySource) -> TransferPath {
    let exact = is_topology_exact(target, source.leaf());

    match (&mut target.data, &source.leaf().data) {
        (LeafData::Mesh(target_mesh), LeafData::Mesh(source_mesh)) => {
            if target_mesh.is_empty() || source_mesh.is_empty() {
                log::warn!("Skipping geometry transfer, mesh has no vertices");
                return TransferPath::Skipped;
            }

            if exact {
                exact::transfer_positions(target_mesh, source_mesh);
                TransferPath::Exact
            } else {
                log::debug!("Topology differs, swapping geometry and rebuilding shape keys");
                let removed = proximity::swap_geometry(target_mesh, source_mesh);
                drop_stale_drivers(&mut target.drivers, &removed);
                TransferPath::Proximity
            }
        }
        (LeafData::Curve(target_curve), LeafData::Curve(source_curve))
        | (LeafData::HairCurves(target_curve), LeafData::HairCurves(source_curve)) => {
            if exact {
                for (to, from) in target_curve.splines.iter_mut().zip(&source_curve.splines) {
                    to.points.clone_from(&from.points);
                    to.cyclic = from.cyclic;
                }
                TransferPath::Exact
            } else {
                let material_indices: Vec<usize> = target_curve
                    .splines
                    .iter()
                    .map(|spline| spline.material_index)
                    .collect();

                *target_curve = source_curve.clone();

                // Keep whatever the materials layer assigned where splines
                // still line up.
                for (spline, index) in target_curve.splines.iter_mut().zip(material_indices) {
                    spline.material_index = index;
                }
                TransferPath::Proximity
            }
        }
        (target_data, source_data) => {
            if target_data.category() != source_data.category() {
                log::warn!(
                    "Cannot transfer geometry from a {:?} onto a {:?}",
                    source_data.category(),
                    target_data.category()
                );
            }
            TransferPath::Skipped
        }
    }
}

/// Transfers surfacing: per-face material indices and shading, UV seams,
/// UV and colour layers, and which layers are active.
///
/// Material slots aren't touched here; see [`transfer_material_slots`].
pub fn transfer_surfacing(target: &mut Leaf, source: &GeometrySource) -> TransferPath {
    let exact = is_topology_exact(target, source.leaf());

    match (&mut target.data, &source.leaf().data) {
        (LeafData::Mesh(target_mesh), LeafData::Mesh(source_mesh)) => {
            if target_mesh.is_empty() || source_mesh.is_empty() {
                log::warn!("Skipping surfacing transfer, mesh has no vertices");
                return TransferPath::Skipped;
            }

            let path = if exact {
                exact::transfer_faces(target_mesh, source_mesh);
                exact::transfer_seams(target_mesh, source_mesh);
                exact::transfer_corner_layers(target_mesh, source_mesh);
                TransferPath::Exact
            } else {
                log::debug!("Topology differs, falling back to proximity transfer");
                match source.bvh() {
                    Some(bvh) => {
                        proximity::transfer_faces(target_mesh, source_mesh, bvh);
                        proximity::transfer_seams(target_mesh, source_mesh, bvh);
                        proximity::transfer_corner_layers(target_mesh, source_mesh, bvh);
                    }
                    None => return TransferPath::Skipped,
                }
                TransferPath::Proximity
            };

            apply_active_layers(target_mesh, source_mesh);
            path
        }
        (LeafData::Curve(target_curve), LeafData::Curve(source_curve))
        | (LeafData::HairCurves(target_curve), LeafData::HairCurves(source_curve)) => {
            if target_curve.splines.is_empty() {
                log::warn!("Skipping surfacing transfer, curve has no splines");
                return TransferPath::Skipped;
            }

            for (to, from) in target_curve.splines.iter_mut().zip(&source_curve.splines) {
                to.material_index = from.material_index;
            }

            if exact {
                TransferPath::Exact
            } else {
                TransferPath::Proximity
            }
        }
        _ => TransferPath::Skipped,
    }
}

/// Drops drivers animating shape keys that don't exist anymore.
fn drop_stale_drivers(drivers: &mut Vec<Driver>, removed_keys: &[String]) {
    if removed_keys.is_empty() {
        return;
    }

    drivers.retain(|driver| match driver.shape_key_name() {
        Some(name) if removed_keys.iter().any(|removed| removed == name) => {
            log::warn!(
                "Dropping driver on {}, its shape key did not survive the transfer",
                driver.data_path
            );
            false
        }
        _ => true,
    });
}
