//! The scene model shared by live workspaces and loaded snapshots.

mod driver;
mod id;
mod mesh;
mod modifier;
mod node;
mod surface;
mod tag;
mod tree;

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

pub use self::driver::*;
pub use self::id::NodeId;
pub use self::mesh::*;
pub use self::modifier::*;
pub use self::node::*;
pub use self::surface::*;
pub use self::tag::{clear_tag, tag, transfer_version, IdentityTag, TagOutcome};
pub use self::tree::{Descendants, SceneTree};

/// A whole scene: the node tree plus the scene-wide data nodes point into.
///
/// Both the artist's workspace and every published layer version are scenes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub tree: SceneTree,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world: Option<World>,

    /// Material library, keyed by material name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub materials: BTreeMap<String, Material>,
}

impl Scene {
    pub fn new(root_name: impl Into<String>) -> Self {
        Scene {
            tree: SceneTree::new(root_name),
            world: None,
            materials: BTreeMap::new(),
        }
    }

    /// Every leaf reachable from the root, in pre-order.
    pub fn leaves(&self) -> impl Iterator<Item = (&Node, &Leaf)> {
        self.tree
            .walk()
            .filter_map(|node| node.as_leaf().map(|leaf| (node, leaf)))
    }

    pub fn leaf(&self, id: NodeId) -> Option<&Leaf> {
        self.tree.get(id).and_then(Node::as_leaf)
    }

    pub fn leaf_mut(&mut self, id: NodeId) -> Option<&mut Leaf> {
        self.tree.get_mut(id).and_then(Node::as_leaf_mut)
    }

    /// Gives every node a fresh ID. Loading the same file twice must not
    /// produce two scenes whose nodes collide.
    pub fn reissue_ids(&mut self) {
        self.tree.reissue_ids();
    }

    /// Drops materials that no reachable leaf's slots use, returning their
    /// names.
    pub fn purge_orphan_materials(&mut self) -> Vec<String> {
        let used: HashSet<&str> = self
            .leaves()
            .flat_map(|(_, leaf)| leaf.material_slots.iter())
            .filter_map(|slot| slot.material.as_deref())
            .collect();

        let orphans: Vec<String> = self
            .materials
            .keys()
            .filter(|name| !used.contains(name.as_str()))
            .cloned()
            .collect();

        for name in &orphans {
            log::trace!("Purging unused material {}", name);
            self.materials.remove(name);
        }

        orphans
    }
}
