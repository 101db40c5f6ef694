use crate::{
    reconcile::{compute_match_table, MatchTable},
    scene::Scene,
};

/// A snapshot opened against a workspace for the duration of one layer
/// transfer.
///
/// Dropping the session releases the snapshot and its match table, then
/// purges materials nothing in the workspace uses anymore. That happens on
/// every way out of a layer, early returns and panics included.
pub struct TransferSession<'w> {
    pub workspace: &'w mut Scene,
    pub snapshot: Scene,
    pub table: MatchTable,
    pub asset: String,
}

impl<'w> TransferSession<'w> {
    pub fn open(
        workspace: &'w mut Scene,
        snapshot: Scene,
        asset: &str,
        needs_hierarchy: bool,
    ) -> Self {
        let table = compute_match_table(&workspace.tree, &snapshot.tree, asset, needs_hierarchy);

        log::debug!(
            "Opened snapshot: {} matched, {} new, {} deleted",
            table.pairs().len(),
            table.new_nodes().len(),
            table.deleted().len()
        );

        TransferSession {
            workspace,
            snapshot,
            table,
            asset: asset.to_owned(),
        }
    }
}

impl Drop for TransferSession<'_> {
    fn drop(&mut self) {
        self.table = MatchTable::default();
        self.snapshot = Scene::new(String::new());

        let purged = self.workspace.purge_orphan_materials();
        if !purged.is_empty() {
            log::debug!("Purged {} unused material(s)", purged.len());
        }
    }
}
