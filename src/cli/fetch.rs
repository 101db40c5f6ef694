use std::path::PathBuf;

use clap::Parser;

use crate::{
    builder::{AssetBuilder, FetchSource},
    layer::TransferSettings,
};

use super::{read_workspace, resolve_path, write_workspace, StoreOptions};

/// Brings an asset into a workspace from its latest build, building it
/// from its layers if it has never been built.
#[derive(Debug, Parser)]
pub struct FetchCommand {
    /// Path to the workspace scene file. Created if it doesn't exist.
    pub workspace: PathBuf,

    /// Asset to fetch.
    #[clap(long)]
    pub asset: String,

    #[clap(flatten)]
    pub store: StoreOptions,
}

impl FetchCommand {
    pub fn run(self) -> anyhow::Result<()> {
        let store = self.store.open()?;

        let workspace_path = resolve_path(&self.workspace);
        let mut workspace = read_workspace(&workspace_path, true)?;

        let settings = TransferSettings {
            update_transform: true,
            replacing_materials: true,
        };

        let source = AssetBuilder::new(&store, self.asset.as_str()).fetch(&mut workspace, &settings)?;

        write_workspace(&workspace_path, &workspace)?;

        match source {
            FetchSource::Build(number) => println!("Fetched {} build v{:03}", self.asset, number),
            FetchSource::Built => println!("Built {} from its layers", self.asset),
        }

        Ok(())
    }
}
