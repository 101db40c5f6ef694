use std::path::PathBuf;

use clap::Parser;

use crate::{
    builder::{resolve_layer, AssetBuilder},
    layer::TransferSettings,
};

use super::{read_workspace, resolve_path, write_workspace, StoreOptions};

/// Applies one published layer version to a workspace.
#[derive(Debug, Parser)]
pub struct LayerCommand {
    /// Path to the workspace scene file.
    pub workspace: PathBuf,

    /// Asset to take the layer from.
    #[clap(long)]
    pub asset: String,

    /// Layer to apply, by storage key or label.
    #[clap(long)]
    pub layer: String,

    /// Version to apply. Defaults to the latest.
    #[clap(long)]
    pub version: Option<u32>,

    /// Leave world transforms of matched nodes alone.
    #[clap(long)]
    pub keep_transforms: bool,

    /// Skip surfacing during modelling because materials are applied next.
    #[clap(long)]
    pub replacing_materials: bool,

    #[clap(flatten)]
    pub store: StoreOptions,
}

impl LayerCommand {
    pub fn run(self) -> anyhow::Result<()> {
        let layer = resolve_layer(&self.layer)?;
        let store = self.store.open()?;

        let workspace_path = resolve_path(&self.workspace);
        let mut workspace = read_workspace(&workspace_path, true)?;

        let settings = TransferSettings {
            update_transform: !self.keep_transforms,
            replacing_materials: self.replacing_materials,
        };

        let report = AssetBuilder::new(&store, self.asset.as_str()).process(
            &mut workspace,
            layer,
            &settings,
            self.version,
        )?;

        write_workspace(&workspace_path, &workspace)?;

        println!("{} {}: {}", self.asset, layer.label, report);

        Ok(())
    }
}
