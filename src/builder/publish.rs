use std::fmt;

use crate::{
    layer::BuildLayer,
    scene::{tag, Scene, TagOutcome},
    store::{LayerVersion, StoreError, VersionedStore},
};

/// How many tags a publish created, updated, or left alone.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishReport {
    pub created: usize,
    pub updated: usize,
    pub foreign: usize,
}

impl PublishReport {
    fn record(&mut self, outcome: TagOutcome) {
        match outcome {
            TagOutcome::Created => self.created += 1,
            TagOutcome::Updated => self.updated += 1,
            TagOutcome::Foreign => self.foreign += 1,
        }
    }
}

impl fmt::Display for PublishReport {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(
            formatter,
            "{} tagged, {} retagged, {} owned elsewhere",
            self.created, self.updated, self.foreign
        )
    }
}

/// Tags everything in `workspace` as the next version of `layer` and writes
/// it to the store.
///
/// Every node below the root is tagged. The material library is tagged too
/// when the layer owns materials. Data another asset or layer already tagged
/// keeps its tag.
pub fn publish_layer(
    store: &VersionedStore,
    workspace: &mut Scene,
    asset: &str,
    layer: &BuildLayer,
) -> Result<(LayerVersion, PublishReport), StoreError> {
    let version = store.next_version(asset, layer.storage_key)?;
    let mut report = PublishReport::default();

    let ids: Vec<_> = workspace.tree.descendants(workspace.tree.root_id()).collect();
    for id in ids {
        if let Some(node) = workspace.tree.get_mut(id) {
            report.record(tag(&mut node.tag, asset, layer.storage_key, version));
        }
    }

    if layer.owns_materials() {
        for material in workspace.materials.values_mut() {
            report.record(tag(&mut material.tag, asset, layer.storage_key, version));
        }
    }

    log::debug!("Tagging for {} v{:03}: {}", layer.storage_key, version, report);

    let published = store.publish(asset, layer.storage_key, workspace)?;
    Ok((published, report))
}
