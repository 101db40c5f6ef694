use crate::{
    reconcile::{move_new_node, prune_deleted},
    remap::{
        rebind_modifiers, transfer_constraints, transfer_drivers, transfer_modifiers, RefMap,
    },
    scene::{LeafCategory, Node},
    transfer::{transfer_shape, transfer_surfacing, GeometrySource, TransferPath},
};

use super::{sync_version, LayerReport, TransferSession, TransferSettings};

/// Leaf categories other layers own. Modelling never adds, removes or
/// updates them.
const BLACKLIST: [LeafCategory; 5] = [
    LeafCategory::Light,
    LeafCategory::LightProbe,
    LeafCategory::Armature,
    LeafCategory::Camera,
    LeafCategory::Speaker,
];

fn is_modelling_leaf(node: &Node) -> bool {
    node.as_leaf()
        .map_or(false, |leaf| !BLACKLIST.contains(&leaf.category()))
}

pub(super) fn apply(session: &mut TransferSession, settings: &TransferSettings) -> LayerReport {
    let mut report = LayerReport::default();

    add_new_leaves(session, &mut report);

    report.removed = prune_deleted(session.workspace, &session.table, is_modelling_leaf);

    let pairs = session.table.pairs().to_vec();

    for pair in pairs {
        let source = match session.snapshot.tree.get(pair.source) {
            Some(node) if is_modelling_leaf(node) => node,
            _ => continue,
        };
        let source_leaf = match source.as_leaf() {
            Some(leaf) => leaf,
            None => continue,
        };

        let target = match session.workspace.leaf_mut(pair.target) {
            Some(leaf) => leaf,
            None => {
                log::warn!(
                    "{:?} is a leaf in the snapshot but not in the workspace",
                    source.name
                );
                continue;
            }
        };

        log::debug!("Updating {:?}", source.name);
        report.matched += 1;

        if settings.update_transform {
            target.transform = source_leaf.transform;
        }

        let geometry = GeometrySource::new(source_leaf);
        let path = transfer_shape(target, &geometry);
        report.record(path);

        if !settings.replacing_materials {
            transfer_surfacing(target, &geometry);
        }

        let refs = RefMap::new(&session.table, pair);
        transfer_modifiers(target, source_leaf, &refs);
        transfer_drivers(target, source_leaf, &refs);
        transfer_constraints(target, source_leaf, &refs);

        if path == TransferPath::Proximity {
            rebind_modifiers(target);
        }

        sync_version(session, pair);
    }

    report
}

/// Moves new modelling leaves out of the snapshot, without the animation
/// and materials other layers are responsible for. References between them
/// are only resolved once all of them have been moved.
fn add_new_leaves(session: &mut TransferSession, report: &mut LayerReport) {
    let new_nodes = session.table.new_nodes().to_vec();
    let mut moved = Vec::new();

    for id in new_nodes {
        match session.snapshot.tree.get(id) {
            Some(node) if is_modelling_leaf(node) => {}
            Some(node) => {
                log::trace!("Not adding {:?}, modelling doesn't own it", node.name);
                continue;
            }
            None => continue,
        }

        if let Some(leaf) = session.snapshot.leaf_mut(id) {
            leaf.clear_animation();
            leaf.clear_materials();
        }

        let moved_id = move_new_node(
            session.workspace,
            &mut session.snapshot,
            &mut session.table,
            &session.asset,
            id,
        );

        moved.extend(moved_id);
    }

    for &id in &moved {
        if let Some(leaf) = session.workspace.leaf_mut(id) {
            RefMap::moved(&session.table, id).remap_leaf(leaf);
            rebind_modifiers(leaf);
        }
    }

    report.added = moved.len();
}
