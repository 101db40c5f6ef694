//! Moving new snapshot nodes into the workspace under the right containers,
//! and cleaning up after deleted ones.

use crate::scene::{Node, NodeId, Scene};

use super::MatchTable;

/// Makes sure the snapshot ancestors of `source` exist in the workspace and
/// returns the workspace container `source` belongs under.
///
/// Walks up the snapshot ancestor chain until it finds a container that's
/// already in the workspace, either because it was matched or because an
/// earlier call moved it there. Every unmatched container on the way is
/// taken out of the snapshot without its members and attached in the
/// workspace, top-down. Moved containers are registered in the table so a
/// sibling coming through here later reuses them.
///
/// Without a parent lookup in the table everything lands under the
/// workspace root.
pub fn rebuild_parents(
    workspace: &mut Scene,
    snapshot: &mut Scene,
    table: &mut MatchTable,
    asset: &str,
    source: NodeId,
) -> NodeId {
    let mut unmatched = Vec::new();
    let mut cursor = table.parent_of(source);

    let anchor = loop {
        let parent = match cursor {
            Some(parent) => parent,
            None => break workspace.tree.root_id(),
        };

        if let Some(target) = table.target_for(parent) {
            if workspace.tree.contains(target) {
                break target;
            }
        }

        unmatched.push(parent);
        cursor = table.parent_of(parent);
    };

    let mut attach_to = anchor;

    for container in unmatched.into_iter().rev() {
        let node = match snapshot.tree.take(container) {
            Some(node) => node,
            None => {
                log::warn!("Container {} vanished from the snapshot", container);
                continue;
            }
        };

        log::debug!("Reconstructing container {:?}", node.name);

        let uuid = node.uuid_in(asset);
        attach_to = workspace.tree.adopt(attach_to, node);
        table.register_moved(container, uuid);
    }

    attach_to
}

/// Moves a new snapshot node into the workspace, rebuilding its container
/// chain first. Returns the node's ID, which it keeps.
pub fn move_new_node(
    workspace: &mut Scene,
    snapshot: &mut Scene,
    table: &mut MatchTable,
    asset: &str,
    source: NodeId,
) -> Option<NodeId> {
    let parent = rebuild_parents(workspace, snapshot, table, asset, source);

    let node = snapshot.tree.take(source)?;
    let uuid = node.uuid_in(asset);

    log::debug!("Adding new node {:?}", node.name);

    let id = workspace.tree.adopt(parent, node);
    table.register_moved(id, uuid);

    Some(id)
}

/// Removes deleted workspace leaves that `eligible` accepts, then deleted
/// containers that ended up empty.
///
/// Containers are visited deepest first so a chain of emptied containers
/// collapses in one pass. A deleted container that still holds anything,
/// tagged or not, is kept.
pub fn prune_deleted(
    workspace: &mut Scene,
    table: &MatchTable,
    eligible: impl Fn(&Node) -> bool,
) -> usize {
    let mut removed = 0;
    let mut containers = Vec::new();

    for &id in table.deleted() {
        let node = match workspace.tree.get(id) {
            Some(node) => node,
            None => continue,
        };

        if node.is_container() {
            containers.push((depth(workspace, id), id));
        } else if eligible(node) {
            log::debug!("Removing deleted leaf {:?}", node.name);
            removed += workspace.tree.remove(id);
        }
    }

    containers.sort_by(|a, b| b.0.cmp(&a.0));

    for (_, id) in containers {
        let node = match workspace.tree.get(id) {
            Some(node) => node,
            None => continue,
        };

        if node.children().is_empty() {
            log::debug!("Pruning empty container {:?}", node.name);
            removed += workspace.tree.remove(id);
        } else {
            log::trace!(
                "Keeping deleted container {:?}, it still has {} member(s)",
                node.name,
                node.children().len()
            );
        }
    }

    removed
}

fn depth(scene: &Scene, id: NodeId) -> usize {
    let mut depth = 0;
    let mut cursor = scene.tree.get(id).and_then(Node::parent);

    while let Some(parent) = cursor {
        depth += 1;
        cursor = scene.tree.get(parent).and_then(Node::parent);
    }

    depth
}
