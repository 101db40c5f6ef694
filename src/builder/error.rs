use thiserror::Error;

use crate::store::StoreError;

/// Failure to apply one layer version to a workspace.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("{name} is not a known build layer")]
    UnknownLayer { name: String },

    #[error(transparent)]
    Store {
        #[from]
        source: StoreError,
    },
}

impl TransferError {
    pub fn unknown_layer(name: impl Into<String>) -> Self {
        Self::UnknownLayer { name: name.into() }
    }

    /// Whether the layer simply has nothing published yet.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store { source } if source.is_not_found())
    }
}

/// Failure to build or update one asset.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("could not apply the {layer} layer of {asset}")]
    Layer {
        asset: String,
        layer: String,
        source: TransferError,
    },

    #[error("could not load the build of {asset}")]
    Load { asset: String, source: StoreError },

    #[error("could not save the build of {asset}")]
    Save { asset: String, source: StoreError },
}

impl BuildError {
    pub fn layer(asset: &str, layer: &str, source: TransferError) -> Self {
        Self::Layer {
            asset: asset.to_owned(),
            layer: layer.to_owned(),
            source,
        }
    }

    pub fn asset(&self) -> &str {
        match self {
            Self::Layer { asset, .. } | Self::Load { asset, .. } | Self::Save { asset, .. } => asset,
        }
    }
}
