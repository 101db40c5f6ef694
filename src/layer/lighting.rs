use crate::{
    reconcile::{move_new_node, prune_deleted},
    remap::{copy_parenting, transfer_drivers, RefMap},
    scene::{LeafData, Node},
};

use super::{sync_version, LayerReport, TransferSession};

fn is_lighting_leaf(node: &Node) -> bool {
    node.as_leaf()
        .map_or(false, |leaf| leaf.category().is_lighting())
}

pub(super) fn apply(session: &mut TransferSession) -> LayerReport {
    let mut report = LayerReport::default();

    let new_nodes = session.table.new_nodes().to_vec();
    let mut moved = Vec::new();

    for id in new_nodes {
        if !session.snapshot.tree.get(id).map_or(false, is_lighting_leaf) {
            continue;
        }

        moved.extend(move_new_node(
            session.workspace,
            &mut session.snapshot,
            &mut session.table,
            &session.asset,
            id,
        ));
    }

    for &id in &moved {
        if let Some(leaf) = session.workspace.leaf_mut(id) {
            RefMap::moved(&session.table, id).remap_leaf(leaf);
        }
    }

    report.added = moved.len();
    report.removed = prune_deleted(session.workspace, &session.table, is_lighting_leaf);

    let pairs = session.table.pairs().to_vec();

    for pair in pairs {
        let source = match session.snapshot.tree.get(pair.source) {
            Some(node) if is_lighting_leaf(node) => node,
            _ => continue,
        };
        let source_leaf = match source.as_leaf() {
            Some(leaf) => leaf,
            None => continue,
        };
        let target = match session.workspace.leaf_mut(pair.target) {
            Some(leaf) if leaf.category() == source_leaf.category() => leaf,
            _ => {
                log::warn!("{:?} is not the same kind of light in the workspace", source.name);
                continue;
            }
        };

        log::debug!("Updating light {:?}", source.name);
        report.matched += 1;

        let refs = RefMap::new(&session.table, pair);

        target.transform = source_leaf.transform;
        copy_parenting(target, source_leaf, &refs);

        match (&mut target.data, &source_leaf.data) {
            (LeafData::Light(to), LeafData::Light(from)) => to.copy_settings_from(from),
            (LeafData::LightProbe(to), LeafData::LightProbe(from)) => to.copy_settings_from(from),
            _ => {}
        }

        transfer_drivers(target, source_leaf, &refs);

        sync_version(session, pair);
    }

    if let Some(world) = session.snapshot.world.take() {
        log::debug!("Replacing world settings");
        session.workspace.world = Some(world);
    }

    report
}
