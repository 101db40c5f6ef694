use std::collections::{BTreeMap, HashMap};

use crate::{
    layer::{BuildLayer, TransferSettings},
    scene::{IdentityTag, PayloadKind, Scene},
    store::{StoreError, VersionedStore},
};

use super::{AssetBuilder, BuildError};

/// The layers of one asset that have newer published versions than what a
/// workspace holds. An empty list means the asset is up to date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetUpdate {
    pub asset: String,
    pub outdated: Vec<&'static BuildLayer>,
}

impl AssetUpdate {
    pub fn is_outdated(&self) -> bool {
        !self.outdated.is_empty()
    }

    fn includes(&self, storage_key: &str) -> bool {
        self.outdated.iter().any(|layer| layer.storage_key == storage_key)
    }
}

/// Compares every tag in `workspace` against the store.
///
/// Leaves and materials are looked at when what they carry triggers some
/// layer. Their tag names the layer to check, and the layer is outdated if
/// a newer version than the tag's has been published. Every asset seen gets
/// an entry, sorted by name, with outdated layers in pipeline order.
pub fn check_updates(store: &VersionedStore, workspace: &Scene) -> Result<Vec<AssetUpdate>, StoreError> {
    let mut tagged: Vec<(&IdentityTag, Vec<PayloadKind>)> = workspace
        .leaves()
        .filter_map(|(node, leaf)| node.tag.as_ref().map(|tag| (tag, leaf.payload_kinds())))
        .collect();

    tagged.extend(
        workspace
            .materials
            .values()
            .filter_map(|material| material.tag.as_ref())
            .map(|tag| (tag, vec![PayloadKind::Material])),
    );

    let mut updates: BTreeMap<&str, Vec<&'static BuildLayer>> = BTreeMap::new();
    let mut latest: HashMap<(&str, &str), u32> = HashMap::new();

    for (tag, kinds) in tagged {
        if !BuildLayer::all().iter().any(|layer| layer.is_triggered_by(&kinds)) {
            continue;
        }

        let outdated = updates.entry(tag.asset.as_str()).or_default();

        let layer = match BuildLayer::find(&tag.layer) {
            Some(layer) => layer,
            None => {
                log::warn!("{} is tagged with unknown layer {}", tag.asset, tag.layer);
                continue;
            }
        };

        if outdated.contains(&layer) {
            continue;
        }

        let key = (tag.asset.as_str(), layer.storage_key);
        let published = match latest.get(&key) {
            Some(&number) => number,
            None => {
                let number = store.list_versions(&tag.asset, layer.storage_key)?.len() as u32;
                latest.insert(key, number);
                number
            }
        };

        if published > tag.version {
            log::debug!(
                "{} {} is at v{:03}, v{:03} is available",
                tag.asset,
                layer.storage_key,
                tag.version,
                published
            );
            outdated.push(layer);
        }
    }

    Ok(updates
        .into_iter()
        .map(|(asset, mut outdated)| {
            outdated.sort_by_key(|layer| layer.order());
            AssetUpdate {
                asset: asset.to_owned(),
                outdated,
            }
        })
        .collect())
}

/// What a batch update did.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Assets whose outdated layers were all applied.
    pub updated: Vec<String>,

    pub failed: Vec<BuildError>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Applies the latest version of every outdated layer in `updates`.
///
/// A failing layer stops the rest of its asset, but other assets still get
/// updated. Materials are replaced wholesale when the Materials layer is part
/// of an asset's update.
pub fn apply_updates(
    store: &VersionedStore,
    workspace: &mut Scene,
    updates: &[AssetUpdate],
    settings: &TransferSettings,
) -> BatchReport {
    let mut report = BatchReport::default();

    for update in updates.iter().filter(|update| update.is_outdated()) {
        let settings = TransferSettings {
            replacing_materials: update.includes("materials"),
            ..*settings
        };

        let builder = AssetBuilder::new(store, update.asset.as_str());
        let failure = update.outdated.iter().find_map(|layer| {
            builder
                .process(workspace, layer, &settings, None)
                .err()
                .map(|err| BuildError::layer(&update.asset, layer.storage_key, err))
        });

        match failure {
            Some(err) => {
                log::error!("Updating {} failed: {:?}", update.asset, err);
                report.failed.push(err);
            }
            None => {
                log::info!("Updated {}", update.asset);
                report.updated.push(update.asset.clone());
            }
        }
    }

    report
}
