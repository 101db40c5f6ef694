use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Node, NodeId};

/// An arena of nodes rooted at a single container.
///
/// Nodes refer to each other by [`NodeId`]. Nodes taken out of one tree keep
/// their ID when adopted into another, which is how snapshot data ends up in
/// the workspace without any reference fixups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "TreeFile", try_from = "TreeFile")]
pub struct SceneTree {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
}

impl SceneTree {
    pub fn new(root_name: impl Into<String>) -> Self {
        let root = Node::container(root_name);
        let root_id = root.id;

        let mut nodes = HashMap::new();
        nodes.insert(root_id, root);

        SceneTree {
            nodes,
            root: root_id,
        }
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn root(&self) -> &Node {
        self.nodes
            .get(&self.root)
            .expect("tree root was removed from its arena")
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        // The root is always present.
        false
    }

    /// Inserts a brand new node as the last child of `parent`.
    ///
    /// Panics if `parent` is not in the tree.
    pub fn insert(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let id = node.id;
        node.parent = Some(parent);
        node.children.clear();

        self.nodes
            .get_mut(&parent)
            .expect("cannot insert under a node that is not in the tree")
            .children
            .push(id);
        self.nodes.insert(id, node);

        id
    }

    /// Attaches a node taken from another tree as the last child of `parent`,
    /// keeping its ID. Any children the node still lists are dropped; they
    /// have to be adopted one by one.
    pub fn adopt(&mut self, parent: NodeId, node: Node) -> NodeId {
        log::trace!("Adopting {} ({}) under {}", node.name, node.id, parent);
        self.insert(parent, node)
    }

    /// Detaches a single node from the tree and hands it back.
    ///
    /// Children of the node stay behind as parentless nodes, so the caller
    /// gets exactly the node and none of its members. The root can't be taken.
    pub fn take(&mut self, id: NodeId) -> Option<Node> {
        if id == self.root {
            return None;
        }

        let mut node = self.nodes.remove(&id)?;

        if let Some(parent) = node.parent.take() {
            if let Some(parent) = self.nodes.get_mut(&parent) {
                parent.children.retain(|&child| child != id);
            }
        }

        for child in node.children.drain(..) {
            if let Some(child) = self.nodes.get_mut(&child) {
                child.parent = None;
            }
        }

        Some(node)
    }

    /// Moves a node, members included, to the end of `new_parent`'s
    /// children. Returns false and changes nothing if that would move the
    /// root or put a node inside itself.
    pub fn reparent(&mut self, id: NodeId, new_parent: NodeId) -> bool {
        if id == self.root
            || id == new_parent
            || !self.nodes.contains_key(&id)
            || !self.nodes.contains_key(&new_parent)
            || self.descendants(id).any(|descendant| descendant == new_parent)
        {
            return false;
        }

        let old_parent = self.nodes.get_mut(&id).and_then(|node| node.parent.replace(new_parent));

        if let Some(old_parent) = old_parent.and_then(|old| self.nodes.get_mut(&old)) {
            old_parent.children.retain(|&child| child != id);
        }

        if let Some(parent) = self.nodes.get_mut(&new_parent) {
            parent.children.push(id);
        }

        true
    }

    /// Removes a node along with all of its descendants, returning how many
    /// nodes were removed.
    pub fn remove(&mut self, id: NodeId) -> usize {
        if id == self.root || !self.nodes.contains_key(&id) {
            return 0;
        }

        let doomed: Vec<NodeId> = std::iter::once(id).chain(self.descendants(id)).collect();

        if let Some(node) = self.take(id) {
            log::trace!("Removing {} ({})", node.name, id);
        }

        for descendant in &doomed[1..] {
            self.nodes.remove(descendant);
        }

        doomed.len()
    }

    /// Iterates over every node below `id` in pre-order, not including `id`
    /// itself.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack = Vec::new();

        if let Some(node) = self.nodes.get(&id) {
            stack.extend(node.children.iter().rev().copied());
        }

        Descendants { tree: self, stack }
    }

    /// Iterates over every node reachable from the root, root first.
    pub fn walk(&self) -> impl Iterator<Item = &Node> {
        std::iter::once(self.root())
            .chain(self.descendants(self.root).map(move |id| &self.nodes[&id]))
    }

    /// Iterates over every node in the arena, reachable or not, in no
    /// particular order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        let parent = self.nodes.get(&parent)?;
        parent
            .children
            .iter()
            .copied()
            .find(|child| self.nodes[child].name == name)
    }

    /// Gives every node a fresh ID, rewriting every reference held inside
    /// the tree. Returns the mapping from old to new IDs so references held
    /// outside of the tree can follow.
    pub fn reissue_ids(&mut self) -> HashMap<NodeId, NodeId> {
        let mapping: HashMap<NodeId, NodeId> = self
            .nodes
            .keys()
            .map(|&old| (old, NodeId::new()))
            .collect();

        let old_nodes = std::mem::take(&mut self.nodes);
        for (old_id, mut node) in old_nodes {
            node.id = mapping[&old_id];
            node.parent = node.parent.and_then(|parent| mapping.get(&parent).copied());
            for child in &mut node.children {
                *child = mapping[child];
            }

            if let Some(leaf) = node.as_leaf_mut() {
                leaf.for_each_ref_mut(|slot| {
                    if let Some(new_id) = slot.and_then(|id| mapping.get(&id)) {
                        *slot = Some(*new_id);
                    }
                });
            }

            self.nodes.insert(node.id, node);
        }

        self.root = mapping[&self.root];
        mapping
    }
}

pub struct Descendants<'a> {
    tree: &'a SceneTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;

        if let Some(node) = self.tree.nodes.get(&id) {
            self.stack.extend(node.children.iter().rev().copied());
        }

        Some(id)
    }
}

/// On-disk shape of a tree. Node links are stored on the nodes themselves and
/// checked when loading.
#[derive(Serialize, Deserialize)]
struct TreeFile {
    root: NodeId,
    nodes: Vec<Node>,
}

impl From<SceneTree> for TreeFile {
    fn from(tree: SceneTree) -> Self {
        // Detached nodes aren't part of the scene anymore.
        let order: Vec<NodeId> = std::iter::once(tree.root)
            .chain(tree.descendants(tree.root))
            .collect();

        let SceneTree { mut nodes, root } = tree;
        let nodes = order
            .into_iter()
            .filter_map(|id| nodes.remove(&id))
            .collect();

        TreeFile { root, nodes }
    }
}

impl TryFrom<TreeFile> for SceneTree {
    type Error = String;

    fn try_from(file: TreeFile) -> Result<Self, Self::Error> {
        let nodes: HashMap<NodeId, Node> = file
            .nodes
            .into_iter()
            .map(|node| (node.id, node))
            .collect();

        if !nodes.contains_key(&file.root) {
            return Err(format!("root node {} is missing", file.root));
        }

        for node in nodes.values() {
            for child in &node.children {
                match nodes.get(child) {
                    Some(child_node) if child_node.parent == Some(node.id) => {}
                    Some(_) => {
                        return Err(format!("node {} does not point back at its parent", child))
                    }
                    None => return Err(format!("child node {} is missing", child)),
                }
            }

            if !node.children.is_empty() && !node.is_container() {
                return Err(format!("leaf {} has children", node.id));
            }

            if let Some(mesh) = node.as_leaf().and_then(|leaf| leaf.mesh()) {
                mesh.check_indices()
                    .map_err(|err| format!("node {} has a broken mesh: {}", node.id, err))?;
            }
        }

        Ok(SceneTree {
            nodes,
            root: file.root,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn chain() -> (SceneTree, NodeId, NodeId, NodeId) {
        let mut tree = SceneTree::new("root");
        let a = tree.insert(tree.root_id(), Node::container("A"));
        let b = tree.insert(a, Node::container("B"));
        let c = tree.insert(b, Node::container("C"));
        (tree, a, b, c)
    }

    #[test]
    fn descendants_are_pre_order() {
        let (mut tree, a, b, c) = chain();
        let d = tree.insert(a, Node::container("D"));

        let order: Vec<_> = tree.descendants(tree.root_id()).collect();
        assert_eq!(order, vec![a, b, c, d]);
    }

    #[test]
    fn take_leaves_members_behind() {
        let (mut tree, a, b, c) = chain();

        let taken = tree.take(b).unwrap();

        assert!(taken.children().is_empty());
        assert_eq!(taken.parent(), None);
        assert!(tree.get(a).unwrap().children().is_empty());
        assert_eq!(tree.get(c).unwrap().parent(), None);
    }

    #[test]
    fn adopt_keeps_ids() {
        let (mut source, _, b, _) = chain();
        let mut target = SceneTree::new("workspace");

        let node = source.take(b).unwrap();
        let adopted = target.adopt(target.root_id(), node);

        assert_eq!(adopted, b);
        assert_eq!(target.root().children(), &[b]);
    }

    #[test]
    fn reparent_moves_whole_subtree() {
        let (mut tree, a, b, c) = chain();
        let root = tree.root_id();

        assert!(tree.reparent(b, root));
        assert_eq!(tree.root().children(), &[a, b]);
        assert_eq!(tree.get(c).unwrap().parent(), Some(b));
        assert!(tree.get(a).unwrap().children().is_empty());

        assert!(!tree.reparent(b, c));
        assert!(!tree.reparent(root, a));
    }

    #[test]
    fn remove_takes_descendants_too() {
        let (mut tree, a, _, _) = chain();

        assert_eq!(tree.remove(a), 3);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.remove(tree.root_id()), 0);
    }

    #[test]
    fn reissued_ids_keep_structure() {
        let (mut tree, a, _, _) = chain();

        let mapping = tree.reissue_ids();
        let new_a = mapping[&a];

        assert_ne!(new_a, a);
        assert_eq!(tree.root().children(), &[new_a]);
        assert_eq!(tree.descendants(tree.root_id()).count(), 3);
    }

    #[test]
    fn json_round_trip_drops_detached_nodes() {
        let (mut tree, _, b, c) = chain();
        tree.take(b);

        let json = serde_json::to_string(&tree).unwrap();
        let loaded: SceneTree = serde_json::from_str(&json).unwrap();

        assert_eq!(loaded.len(), 2);
        assert!(!loaded.contains(c));
    }
}
