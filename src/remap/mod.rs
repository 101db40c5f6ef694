//! Transfers modifier stacks, drivers, constraints and parenting between
//! matched leaves, pointing every copied node reference at the workspace.

mod constraints;
mod drivers;
mod modifiers;

use crate::{
    reconcile::{MatchTable, MatchedPair},
    scene::{Leaf, NodeId},
};

pub use constraints::{copy_parenting, transfer_constraints};
pub use drivers::{copy_driver, transfer_drivers};
pub use modifiers::{rebind_modifiers, transfer_modifiers};

/// Resolves node references copied out of a snapshot.
///
/// A reference to the source leaf itself becomes a reference to the target
/// leaf. Anything else goes through the match table, which also knows about
/// nodes moved into the workspace. References with no counterpart are
/// cleared rather than left pointing into the snapshot.
#[derive(Debug, Clone, Copy)]
pub struct RefMap<'a> {
    table: &'a MatchTable,
    source_owner: NodeId,
    target_owner: NodeId,
}

impl<'a> RefMap<'a> {
    pub fn new(table: &'a MatchTable, pair: MatchedPair) -> Self {
        RefMap {
            table,
            source_owner: pair.source,
            target_owner: pair.target,
        }
    }

    /// For a node that was moved out of the snapshot as-is.
    pub fn moved(table: &'a MatchTable, id: NodeId) -> Self {
        RefMap {
            table,
            source_owner: id,
            target_owner: id,
        }
    }

    pub fn resolve(&self, id: Option<NodeId>) -> Option<NodeId> {
        let id = id?;

        if id == self.source_owner {
            return Some(self.target_owner);
        }

        match self.table.target_for(id) {
            Some(target) => Some(target),
            None => {
                log::warn!("Reference to {} has no counterpart in the workspace, clearing it", id);
                None
            }
        }
    }

    /// Resolves every reference a leaf holds. Only meant for leaves that came
    /// out of the snapshot wholesale, whose references all still point into
    /// it.
    pub fn remap_leaf(&self, leaf: &mut Leaf) {
        leaf.for_each_ref_mut(|slot| *slot = self.resolve(*slot));
    }
}

#[cfg(test)]
mod test {
    use uuid::Uuid;

    use super::*;

    use crate::{
        fixtures::{add, empty_leaf, ASSET},
        reconcile::compute_match_table,
        scene::Scene,
    };

    #[test]
    fn self_references_resolve_to_target() {
        let _ = env_logger::try_init();

        let uuid = Uuid::new_v4();
        let other = Uuid::new_v4();

        let mut workspace = Scene::new("workspace");
        let target = add(&mut workspace, None, empty_leaf("Thing", uuid));
        let w_other = add(&mut workspace, None, empty_leaf("Other", other));

        let mut snapshot = Scene::new("snapshot");
        let source = add(&mut snapshot, None, empty_leaf("Thing", uuid));
        let s_other = add(&mut snapshot, None, empty_leaf("Other", other));
        let stray = add(&mut snapshot, None, empty_leaf("Stray", Uuid::new_v4()));

        let table = compute_match_table(&workspace.tree, &snapshot.tree, ASSET, false);
        let refs = RefMap::new(&table, MatchedPair { target, source });

        assert_eq!(refs.resolve(Some(source)), Some(target));
        assert_eq!(refs.resolve(Some(s_other)), Some(w_other));
        assert_eq!(refs.resolve(Some(stray)), None);
        assert_eq!(refs.resolve(None), None);
    }
}
