use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use fs_err as fs;

use crate::{builder::AssetBuilder, layer::TransferSettings, scene::Scene};

use super::{resolve_path, write_workspace, StoreOptions};

/// Builds an asset from the latest version of every published layer and
/// saves it as the asset's next build.
#[derive(Debug, Parser)]
pub struct BuildCommand {
    /// Name of the asset to build.
    pub asset: String,

    #[clap(flatten)]
    pub store: StoreOptions,

    /// Don't list the build in the asset catalog.
    #[clap(long)]
    pub no_catalog: bool,

    /// Also write the built scene to this file.
    #[clap(long, short)]
    pub output: Option<PathBuf>,
}

impl BuildCommand {
    pub fn run(self) -> anyhow::Result<()> {
        let store = self.store.open()?;
        let builder = AssetBuilder::new(&store, self.asset.as_str());

        // A full build always replaces surfacing with the materials layer.
        let settings = TransferSettings {
            update_transform: true,
            replacing_materials: true,
        };

        let mut workspace = Scene::new(self.asset.as_str());
        let reports = builder.build_full(&mut workspace, &settings)?;

        for (layer, report) in &reports {
            log::info!("{}: {}", layer.label, report);
        }

        builder.mark_asset(&mut workspace);

        fs::create_dir_all(store.build_dir(&self.asset))?;
        let path = builder
            .save_build(&workspace, !self.no_catalog)
            .with_context(|| format!("Could not save the build of {}", self.asset))?;

        if let Some(output) = &self.output {
            write_workspace(&resolve_path(output), &workspace)?;
        }

        println!("Built {} from {} layer(s) into {}", self.asset, reports.len(), path.display());

        Ok(())
    }
}
