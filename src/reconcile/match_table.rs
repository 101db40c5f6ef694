use std::collections::HashMap;

use uuid::Uuid;

use crate::{multimap::MultiMap, scene::NodeId};

/// A workspace node paired with the snapshot node it corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedPair {
    pub target: NodeId,
    pub source: NodeId,
}

/// The outcome of reconciling a snapshot against a workspace. Only ever lives
/// for a single transfer.
#[derive(Debug, Default)]
pub struct MatchTable {
    pub(super) pairs: Vec<MatchedPair>,

    /// Snapshot node to the first workspace node paired with it. Nodes moved
    /// out of the snapshot map to themselves.
    pub(super) by_source: HashMap<NodeId, NodeId>,

    pub(super) by_target: HashMap<NodeId, NodeId>,

    /// Snapshot nodes with no workspace counterpart.
    pub(super) new_nodes: Vec<NodeId>,

    /// Workspace nodes with no snapshot counterpart.
    pub(super) deleted: Vec<NodeId>,

    /// Snapshot node to its snapshot parent. Top-level snapshot nodes have no
    /// entry. Only built when hierarchy reconstruction was requested.
    pub(super) parents: Option<HashMap<NodeId, NodeId>>,

    pub(super) source_index: MultiMap<Uuid, NodeId>,
    pub(super) target_index: MultiMap<Uuid, NodeId>,
}

impl MatchTable {
    pub fn pairs(&self) -> &[MatchedPair] {
        &self.pairs
    }

    pub fn new_nodes(&self) -> &[NodeId] {
        &self.new_nodes
    }

    pub fn deleted(&self) -> &[NodeId] {
        &self.deleted
    }

    /// The workspace node standing in for a snapshot node, if any.
    pub fn target_for(&self, source: NodeId) -> Option<NodeId> {
        self.by_source.get(&source).copied()
    }

    pub fn source_for(&self, target: NodeId) -> Option<NodeId> {
        self.by_target.get(&target).copied()
    }

    pub fn has_parents(&self) -> bool {
        self.parents.is_some()
    }

    pub fn parent_of(&self, source: NodeId) -> Option<NodeId> {
        self.parents.as_ref()?.get(&source).copied()
    }

    /// All workspace nodes tagged with the given uuid, in tree order.
    pub fn targets_with_uuid(&self, uuid: Uuid) -> &[NodeId] {
        self.target_index.get(&uuid)
    }

    pub fn sources_with_uuid(&self, uuid: Uuid) -> &[NodeId] {
        self.source_index.get(&uuid)
    }

    /// Records that a snapshot node was moved into the workspace as-is, so
    /// later lookups resolve it to itself.
    pub fn register_moved(&mut self, id: NodeId, uuid: Option<Uuid>) {
        log::trace!("Registering moved node {}", id);

        self.by_source.insert(id, id);

        if let Some(uuid) = uuid {
            self.target_index.insert(uuid, id);
        }
    }
}
