//! Establishes which workspace nodes correspond to which snapshot nodes.
//!
//! Identity is carried entirely by the uuid in each node's identity tag.
//! Nodes that are untagged, or tagged by a different asset, are invisible
//! here: they are never matched, never new and never deleted.

mod hierarchy;
mod match_table;


use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    multimap::MultiMap,
    scene::{NodeId, SceneTree},
};

pub use hierarchy::{move_new_node, prune_deleted, rebuild_parents};
pub use match_table::{MatchTable, MatchedPair};

/// Reconciles `snapshot` against `workspace` within the namespace of `asset`.
///
/// When a uuid appears several times, workspace node `i` pairs with snapshot
/// node `min(i, n - 1)`. That's invalid authoring, so it's logged, but it
/// still produces a predictable result.
pub fn compute_match_table(
    workspace: &SceneTree,
    snapshot: &SceneTree,
    asset: &str,
    needs_hierarchy: bool,
) -> MatchTable {
    let target_index = index_tree(workspace, asset, "workspace");
    let source_index = index_tree(snapshot, asset, "snapshot");

    let mut table = MatchTable::default();

    for (uuid, sources) in source_index.iter() {
        let targets = target_index.get(uuid);

        if targets.is_empty() {
            log::trace!("uuid {} is new ({} node(s))", uuid, sources.len());
            table.new_nodes.extend_from_slice(sources);
            continue;
        }

        if targets.len() != sources.len() {
            log::warn!(
                "uuid {} appears {} time(s) in the workspace but {} time(s) in the snapshot, pairing by order",
                uuid,
                targets.len(),
                sources.len()
            );
        }

        for (i, &target) in targets.iter().enumerate() {
            let source = sources[i.min(sources.len() - 1)];

            table.pairs.push(MatchedPair { target, source });
            table.by_source.entry(source).or_insert(target);
            table.by_target.insert(target, source);
        }
    }

    for (uuid, targets) in target_index.iter() {
        if !source_index.contains_key(uuid) {
            log::trace!("uuid {} is deleted", uuid);
            table.deleted.extend_from_slice(targets);
        }
    }

    if needs_hierarchy {
        table.parents = Some(parent_lookup(snapshot));
    }

    log::debug!(
        "Reconciled {}: {} matched, {} new, {} deleted",
        asset,
        table.pairs.len(),
        table.new_nodes.len(),
        table.deleted.len()
    );

    table.source_index = source_index;
    table.target_index = target_index;
    table
}

/// Groups the tagged nodes of a tree by uuid, in pre-order.
fn index_tree(tree: &SceneTree, asset: &str, side: &str) -> MultiMap<Uuid, NodeId> {
    let mut index = MultiMap::new();

    for node in tree.walk().skip(1) {
        let tag = match &node.tag {
            Some(tag) if tag.in_namespace(asset) => tag,
            _ => continue,
        };

        match tag.uuid {
            Some(uuid) => {
                if !index.get(&uuid).is_empty() {
                    log::warn!(
                        "Duplicate uuid {} in {} on {:?}, pairing by order",
                        uuid,
                        side,
                        node.name
                    );
                }

                index.insert(uuid, node.id());
            }
            None => log::warn!(
                "{:?} in {} is tagged for {} but has no uuid, ignoring it",
                node.name,
                side,
                asset
            ),
        }
    }

    index
}

fn parent_lookup(snapshot: &SceneTree) -> HashMap<NodeId, NodeId> {
    let root = snapshot.root_id();

    snapshot
        .walk()
        .filter_map(|node| match node.parent() {
            Some(parent) if parent != root => Some((node.id(), parent)),
            _ => None,
        })
        .collect()
}
