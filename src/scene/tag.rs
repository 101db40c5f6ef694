//! Identity tags stamped on scene data when it is published.
//!
//! A tag links a node (or a material) to the asset, layer and version that
//! introduced it. The `uuid` is what reconciliation matches on; names are
//! never used because artists rename things freely.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityTag {
    pub asset: String,
    pub layer: String,
    pub version: u32,

    /// Assigned on first tagging and never changed afterwards. Hand-edited or
    /// legacy files can lack it, in which case the tagged data is invisible to
    /// reconciliation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
}

impl IdentityTag {
    pub fn new(asset: impl Into<String>, layer: impl Into<String>, version: u32) -> Self {
        IdentityTag {
            asset: asset.into(),
            layer: layer.into(),
            version,
            uuid: Some(Uuid::new_v4()),
        }
    }

    pub fn in_namespace(&self, asset: &str) -> bool {
        self.asset == asset
    }
}

/// What [`tag`] did to a tag slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOutcome {
    /// The data was untagged and now carries a fresh uuid.
    Created,

    /// Same asset and layer; only the version moved.
    Updated,

    /// Tagged by another asset or layer, left alone.
    Foreign,
}

/// Tags a slot with an asset, layer and version.
///
/// Untagged data gets a full tag with a new uuid. Data already tagged by the
/// same asset and layer only has its version updated. Anything else is owned
/// by another asset or layer and is never overridden.
pub fn tag(slot: &mut Option<IdentityTag>, asset: &str, layer: &str, version: u32) -> TagOutcome {
    match slot {
        None => {
            *slot = Some(IdentityTag::new(asset, layer, version));
            TagOutcome::Created
        }
        Some(existing) if existing.asset == asset && existing.layer == layer => {
            existing.version = version;
            TagOutcome::Updated
        }
        Some(_) => TagOutcome::Foreign,
    }
}

/// Strips a tag, making the data invisible to reconciliation until it is
/// tagged again under a new uuid.
pub fn clear_tag(slot: &mut Option<IdentityTag>) -> Option<IdentityTag> {
    slot.take()
}

/// Copies the version number from a source tag onto a target tag, used after
/// data has been transferred so update checks see the target as current.
/// Nothing happens unless both sides are tagged.
pub fn transfer_version(source: &Option<IdentityTag>, target: &mut Option<IdentityTag>) {
    if let (Some(source), Some(target)) = (source, target) {
        target.version = source.version;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn first_tag_assigns_uuid() {
        let mut slot = None;

        assert_eq!(tag(&mut slot, "zoe", "models", 1), TagOutcome::Created);

        let tag = slot.unwrap();
        assert_eq!(tag.asset, "zoe");
        assert_eq!(tag.layer, "models");
        assert_eq!(tag.version, 1);
        assert!(tag.uuid.is_some());
    }

    #[test]
    fn retag_same_layer_keeps_uuid() {
        let mut slot = None;
        tag(&mut slot, "zoe", "models", 1);
        let uuid = slot.as_ref().unwrap().uuid;

        assert_eq!(tag(&mut slot, "zoe", "models", 2), TagOutcome::Updated);

        let tag = slot.unwrap();
        assert_eq!(tag.uuid, uuid);
        assert_eq!(tag.version, 2);
    }

    #[test]
    fn foreign_tags_are_untouched() {
        let mut slot = None;
        tag(&mut slot, "zoe", "models", 3);
        let before = slot.clone();

        assert_eq!(tag(&mut slot, "zoe", "lights", 7), TagOutcome::Foreign);
        assert_eq!(tag(&mut slot, "tom", "models", 7), TagOutcome::Foreign);
        assert_eq!(slot, before);
    }

    #[test]
    fn cleared_tags_come_back_with_new_uuid() {
        let mut slot = None;
        tag(&mut slot, "zoe", "models", 1);
        let old = clear_tag(&mut slot).unwrap();

        assert_eq!(tag(&mut slot, "zoe", "models", 2), TagOutcome::Created);
        assert_ne!(slot.unwrap().uuid, old.uuid);
    }

    #[test]
    fn version_transfer_needs_both_tags() {
        let source = Some(IdentityTag::new("zoe", "models", 4));
        let mut target = Some(IdentityTag::new("zoe", "models", 2));
        let mut untagged = None;

        transfer_version(&source, &mut target);
        transfer_version(&source, &mut untagged);

        assert_eq!(target.unwrap().version, 4);
        assert!(untagged.is_none());
    }
}
