//! The pipeline's build layers and what each one does when it's applied to
//! a workspace.

mod lighting;
mod materials;
mod modelling;
mod session;
mod settings;

#[cfg(test)]
mod tests;

use std::fmt;

use crate::{
    reconcile::MatchedPair,
    scene::{transfer_version, PayloadKind, Scene},
    transfer::TransferPath,
};

pub use session::TransferSession;
pub use settings::TransferSettings;

/// A stage of the asset pipeline, owned by one department.
#[derive(Debug, PartialEq, Eq)]
pub struct BuildLayer {
    /// Directory name in the store, also the value written into tags.
    pub storage_key: &'static str,

    /// Human readable name.
    pub label: &'static str,

    /// Payload kinds that make a tagged piece of data belong to this layer
    /// for update checks.
    pub triggers: &'static [PayloadKind],

    /// Whether new nodes have to be reattached under their snapshot
    /// containers, which needs a snapshot parent lookup.
    pub needs_hierarchy: bool,

    policy: Policy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Policy {
    Modelling,
    Materials,
    Lighting,

    /// Declared so its data can be published and tracked, but applying it
    /// doesn't transfer anything yet.
    Passive,
}

/// Every layer, in the order they're applied.
pub static LAYERS: [BuildLayer; 7] = [
    BuildLayer {
        storage_key: "models",
        label: "Modelling",
        triggers: &[
            PayloadKind::Mesh,
            PayloadKind::Curve,
            PayloadKind::HairCurves,
            PayloadKind::ShapeKeys,
        ],
        needs_hierarchy: true,
        policy: Policy::Modelling,
    },
    BuildLayer {
        storage_key: "materials",
        label: "Surfacing / UVs",
        triggers: &[PayloadKind::Material],
        needs_hierarchy: false,
        policy: Policy::Materials,
    },
    BuildLayer {
        storage_key: "grooms",
        label: "Grooming",
        triggers: &[PayloadKind::HairCurves],
        needs_hierarchy: false,
        policy: Policy::Passive,
    },
    BuildLayer {
        storage_key: "rigs",
        label: "Rigging",
        triggers: &[PayloadKind::Armature, PayloadKind::ShapeKeys],
        needs_hierarchy: false,
        policy: Policy::Passive,
    },
    BuildLayer {
        storage_key: "assembly",
        label: "Assembly / Layout",
        triggers: &[PayloadKind::Camera],
        needs_hierarchy: false,
        policy: Policy::Passive,
    },
    BuildLayer {
        storage_key: "anims",
        label: "Animation",
        triggers: &[PayloadKind::Action, PayloadKind::ShapeKeys],
        needs_hierarchy: false,
        policy: Policy::Passive,
    },
    BuildLayer {
        storage_key: "lights",
        label: "Lighting",
        triggers: &[PayloadKind::Light, PayloadKind::LightProbe],
        needs_hierarchy: true,
        policy: Policy::Lighting,
    },
];

impl BuildLayer {
    pub fn all() -> &'static [BuildLayer] {
        &LAYERS
    }

    /// Looks a layer up by storage key, or by label ignoring case.
    pub fn find(name: &str) -> Option<&'static BuildLayer> {
        LAYERS.iter().find(|layer| {
            layer.storage_key == name || layer.label.eq_ignore_ascii_case(name)
        })
    }

    pub fn is_triggered_by(&self, kinds: &[PayloadKind]) -> bool {
        self.triggers.iter().any(|trigger| kinds.contains(trigger))
    }

    /// Whether publishing this layer tags the material library as well.
    pub fn owns_materials(&self) -> bool {
        self.triggers.contains(&PayloadKind::Material)
    }

    /// Position in the pipeline order.
    pub fn order(&self) -> usize {
        LAYERS
            .iter()
            .position(|layer| layer.storage_key == self.storage_key)
            .unwrap_or(LAYERS.len())
    }

    /// Applies a published version of this layer, `snapshot`, to `workspace`.
    /// The snapshot is consumed and released once the transfer is done.
    pub fn apply(
        &self,
        workspace: &mut Scene,
        snapshot: Scene,
        asset: &str,
        settings: &TransferSettings,
    ) -> LayerReport {
        log::info!("Applying {} layer to {}", self.label, asset);

        if self.policy == Policy::Passive {
            log::info!("The {} layer has nothing to transfer", self.label);
            return LayerReport::default();
        }

        let mut session = TransferSession::open(workspace, snapshot, asset, self.needs_hierarchy);

        let report = match self.policy {
            Policy::Modelling => modelling::apply(&mut session, settings),
            Policy::Materials => materials::apply(&mut session),
            Policy::Lighting => lighting::apply(&mut session),
            Policy::Passive => LayerReport::default(),
        };

        log::info!("Finished {} layer: {}", self.label, report);

        report
    }
}

impl fmt::Display for BuildLayer {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{}", self.storage_key)
    }
}

/// What a layer transfer did, for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LayerReport {
    pub matched: usize,
    pub added: usize,
    pub removed: usize,
    pub exact: usize,
    pub proximity: usize,
    pub skipped: usize,
}

impl LayerReport {
    fn record(&mut self, path: TransferPath) {
        match path {
            TransferPath::Exact => self.exact += 1,
            TransferPath::Proximity => self.proximity += 1,
            TransferPath::Skipped => self.skipped += 1,
        }
    }
}

impl fmt::Display for LayerReport {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(
            formatter,
            "{} matched ({} exact, {} by proximity, {} skipped), {} added, {} removed",
            self.matched, self.exact, self.proximity, self.skipped, self.added, self.removed
        )
    }
}

/// Marks a transferred workspace node as current with the snapshot node it
/// was transferred from.
fn sync_version(session: &mut TransferSession, pair: MatchedPair) {
    let source = session
        .snapshot
        .tree
        .get(pair.source)
        .and_then(|node| node.tag.clone());

    if let Some(target) = session.workspace.tree.get_mut(pair.target) {
        transfer_version(&source, &mut target.tag);
    }
}
