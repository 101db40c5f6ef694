//! Builds assets out of published layer versions and keeps workspaces up to
//! date with the store.

mod error;
mod publish;
mod update;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use uuid::Uuid;

use crate::{
    layer::{BuildLayer, LayerReport, TransferSettings},
    scene::{Node, NodeId, Scene, SceneTree},
    store::{StoreError, VersionedStore},
};

pub use error::{BuildError, TransferError};
pub use publish::{publish_layer, PublishReport};
pub use update::{apply_updates, check_updates, AssetUpdate, BatchReport};

/// Looks a layer up by storage key or label.
pub fn resolve_layer(name: &str) -> Result<&'static BuildLayer, TransferError> {
    BuildLayer::find(name).ok_or_else(|| TransferError::unknown_layer(name))
}

/// Applies layers of one asset from a store onto workspaces.
pub struct AssetBuilder<'s> {
    store: &'s VersionedStore,
    asset: String,

    /// Catalog entry the asset's builds are listed under.
    catalog_id: Uuid,
}

impl<'s> AssetBuilder<'s> {
    pub fn new(store: &'s VersionedStore, asset: impl Into<String>) -> Self {
        AssetBuilder {
            store,
            asset: asset.into(),
            catalog_id: Uuid::new_v4(),
        }
    }

    pub fn with_catalog_id(mut self, catalog_id: Uuid) -> Self {
        self.catalog_id = catalog_id;
        self
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    /// Applies one version of `layer` to `workspace`, the latest one unless
    /// `version` names another.
    pub fn process(
        &self,
        workspace: &mut Scene,
        layer: &BuildLayer,
        settings: &TransferSettings,
        version: Option<u32>,
    ) -> Result<LayerReport, TransferError> {
        let version = self.store.resolve(&self.asset, layer.storage_key, version)?;
        let snapshot = self.store.load(&version)?;

        log::info!("Processing {}", version);

        Ok(layer.apply(workspace, snapshot, &self.asset, settings))
    }

    /// Applies the latest version of every layer in pipeline order. Layers
    /// nobody has published yet are skipped. Any other failure stops the
    /// build.
    pub fn build_full(
        &self,
        workspace: &mut Scene,
        settings: &TransferSettings,
    ) -> Result<Vec<(&'static BuildLayer, LayerReport)>, BuildError> {
        let mut reports = Vec::new();

        for layer in BuildLayer::all() {
            match self.process(workspace, layer, settings, None) {
                Ok(report) => reports.push((layer, report)),
                Err(err) if err.is_not_found() => {
                    log::info!("Skipping {} for {}: {}", layer.label, self.asset, err);
                }
                Err(err) => return Err(BuildError::layer(&self.asset, layer.storage_key, err)),
            }
        }

        Ok(reports)
    }

    /// Makes sure everything in the workspace sits under a single container
    /// named after the asset and returns that container.
    ///
    /// A lone top-level container is renamed. Otherwise a new container is
    /// created and every top-level node moves into it.
    pub fn mark_asset(&self, workspace: &mut Scene) -> NodeId {
        let root = workspace.tree.root_id();
        let top_level = workspace.tree.root().children().to_vec();

        if let [only] = top_level[..] {
            if let Some(node) = workspace.tree.get_mut(only).filter(|node| node.is_container()) {
                log::debug!("Marking {} as asset {}", node.name, self.asset);
                node.name = self.asset.clone();
                return only;
            }
        }

        let container = workspace.tree.insert(root, Node::container(self.asset.as_str()));
        for child in top_level {
            workspace.tree.reparent(child, container);
        }

        log::debug!("Created asset container {}", self.asset);

        container
    }

    /// Saves `workspace` as the next build of the asset, listing it in the
    /// asset catalog when `write_catalog` is set.
    pub fn save_build(&self, workspace: &Scene, write_catalog: bool) -> Result<PathBuf, BuildError> {
        let save = || -> Result<PathBuf, StoreError> {
            let (number, path) = self.store.save_build(&self.asset, workspace)?;

            if write_catalog {
                self.store.append_catalog(self.catalog_id, &self.asset, number)?;
            }

            Ok(path)
        };

        save().map_err(|source| BuildError::Save {
            asset: self.asset.clone(),
            source,
        })
    }

    /// Brings the asset into `workspace`: the contents of its latest build,
    /// or a fresh full build when none has been saved.
    pub fn fetch(&self, workspace: &mut Scene, settings: &TransferSettings) -> Result<FetchSource, BuildError> {
        let version = match self.store.latest_build(&self.asset) {
            Ok(version) => version,
            Err(err) if err.is_not_found() => {
                log::info!("{} has no builds yet, building it from its layers", self.asset);
                self.build_full(workspace, settings)?;
                return Ok(FetchSource::Built);
            }
            Err(source) => return Err(self.load_error(source)),
        };

        let mut build = self
            .store
            .load(&version)
            .map_err(|source| self.load_error(source))?;

        let root = workspace.tree.root_id();
        let top_level = build.tree.root().children().to_vec();
        for id in top_level {
            graft(&mut build.tree, id, &mut workspace.tree, root);
        }

        workspace.materials.append(&mut build.materials);
        if workspace.world.is_none() {
            workspace.world = build.world.take();
        }

        log::info!("Fetched {}", version);

        Ok(FetchSource::Build(version.number))
    }

    fn load_error(&self, source: StoreError) -> BuildError {
        BuildError::Load {
            asset: self.asset.clone(),
            source,
        }
    }
}

/// Where [`AssetBuilder::fetch`] got the asset from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    /// An existing build, by number.
    Build(u32),

    /// No build existed, so the layers were applied directly.
    Built,
}

/// Moves the subtree at `id` out of `from` and under `parent` in `to`,
/// keeping node IDs.
fn graft(from: &mut SceneTree, id: NodeId, to: &mut SceneTree, parent: NodeId) {
    let children = match from.get(id) {
        Some(node) => node.children().to_vec(),
        None => return,
    };

    if let Some(node) = from.take(id) {
        let adopted = to.adopt(parent, node);

        for child in children {
            graft(from, child, to, adopted);
        }
    }
}
