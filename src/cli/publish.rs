use std::path::PathBuf;

use clap::Parser;
use fs_err as fs;

use crate::builder::{publish_layer, resolve_layer};

use super::{read_workspace, resolve_path, write_workspace, StoreOptions};

/// Tags a workspace and publishes it as the next version of a layer.
#[derive(Debug, Parser)]
pub struct PublishCommand {
    /// Path to the workspace scene file.
    pub workspace: PathBuf,

    /// Asset the workspace belongs to.
    #[clap(long)]
    pub asset: String,

    /// Layer to publish, by storage key or label.
    #[clap(long)]
    pub layer: String,

    #[clap(flatten)]
    pub store: StoreOptions,
}

impl PublishCommand {
    pub fn run(self) -> anyhow::Result<()> {
        let layer = resolve_layer(&self.layer)?;
        let store = self.store.open()?;

        let workspace_path = resolve_path(&self.workspace);
        let mut workspace = read_workspace(&workspace_path, false)?;

        fs::create_dir_all(store.layer_dir(&self.asset, layer.storage_key))?;
        let (version, report) = publish_layer(&store, &mut workspace, &self.asset, layer)?;

        // Tags live in the artist's file too, so later publishes keep uuids.
        write_workspace(&workspace_path, &workspace)?;

        println!("Published {} ({})", version, report);

        Ok(())
    }
}
