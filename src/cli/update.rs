use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::bail;
use clap::Parser;
use termcolor::{BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

use crate::{
    builder::{apply_updates, check_updates, AssetUpdate},
    layer::TransferSettings,
};

use super::{read_workspace, resolve_path, write_workspace, GlobalOptions, StoreOptions};

/// Lists assets in a workspace that have newer published layers, and
/// optionally applies them.
#[derive(Debug, Parser)]
pub struct UpdateCommand {
    /// Path to the workspace scene file.
    pub workspace: PathBuf,

    /// Apply every outdated layer instead of only listing them.
    #[clap(long)]
    pub apply: bool,

    /// Leave world transforms of matched nodes alone.
    #[clap(long)]
    pub keep_transforms: bool,

    #[clap(flatten)]
    pub store: StoreOptions,
}

impl UpdateCommand {
    pub fn run(self, global: GlobalOptions) -> anyhow::Result<()> {
        let store = self.store.open()?;

        let workspace_path = resolve_path(&self.workspace);
        let mut workspace = read_workspace(&workspace_path, false)?;

        let updates = check_updates(&store, &workspace)?;
        let _ = show_updates(&updates, global.color.into());

        if !self.apply || updates.iter().all(|update| !update.is_outdated()) {
            return Ok(());
        }

        let settings = TransferSettings {
            update_transform: !self.keep_transforms,
            ..TransferSettings::default()
        };

        let report = apply_updates(&store, &mut workspace, &updates, &settings);

        // Assets that did update are kept even if others failed.
        write_workspace(&workspace_path, &workspace)?;

        println!("Updated {} asset(s)", report.updated.len());

        if !report.is_success() {
            let count = report.failed.len();
            for err in report.failed {
                log::error!("{:?}", anyhow::Error::from(err));
            }

            bail!("{} asset(s) could not be updated", count);
        }

        Ok(())
    }
}

fn show_updates(updates: &[AssetUpdate], color: ColorChoice) -> io::Result<()> {
    let writer = BufferWriter::stdout(color);
    let mut buffer = writer.buffer();

    if updates.is_empty() {
        writeln!(&mut buffer, "No tagged assets in this workspace.")?;
    }

    for update in updates {
        write!(&mut buffer, "  {}: ", update.asset)?;

        if update.is_outdated() {
            let layers: Vec<&str> = update.outdated.iter().map(|layer| layer.label).collect();

            buffer.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
            writeln!(&mut buffer, "{}", layers.join(", "))?;
        } else {
            buffer.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            writeln!(&mut buffer, "up to date")?;
        }

        buffer.set_color(&ColorSpec::new())?;
    }

    writer.print(&buffer)?;

    Ok(())
}
