//! Defines Strata's CLI through clap types.

mod build;
mod fetch;
mod layer;
mod publish;
mod update;

use std::{
    borrow::Cow,
    env, io,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Context;
use clap::Parser;
use fs_err as fs;
use memofs::Vfs;
use thiserror::Error;

use crate::{scene::Scene, store::VersionedStore};

pub use self::build::BuildCommand;
pub use self::fetch::FetchCommand;
pub use self::layer::LayerCommand;
pub use self::publish::PublishCommand;
pub use self::update::UpdateCommand;

/// Command line options that Strata accepts, defined using the clap crate.
#[derive(Debug, Parser)]
#[clap(name = "Strata", version, about, author)]
pub struct Options {
    #[clap(flatten)]
    pub global: GlobalOptions,

    /// Subcommand to run in this invocation.
    #[clap(subcommand)]
    pub subcommand: Subcommand,
}

impl Options {
    pub fn run(self) -> anyhow::Result<()> {
        match self.subcommand {
            Subcommand::Build(subcommand) => subcommand.run(),
            Subcommand::Publish(subcommand) => subcommand.run(),
            Subcommand::Update(subcommand) => subcommand.run(self.global),
            Subcommand::Layer(subcommand) => subcommand.run(),
            Subcommand::Fetch(subcommand) => subcommand.run(),
        }
    }
}

#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Sets verbosity level. Can be specified multiple times.
    #[clap(long("verbose"), short, global(true), parse(from_occurrences))]
    pub verbosity: u8,

    /// Set color behavior. Valid values are auto, always, and never.
    #[clap(long("color"), global(true), default_value("auto"))]
    pub color: ColorChoice,
}

/// Where the versioned store lives.
#[derive(Debug, Parser)]
pub struct StoreOptions {
    /// Root directory of the versioned store.
    #[clap(long, env = "STRATA_STORE")]
    pub store: PathBuf,
}

impl StoreOptions {
    pub fn open(&self) -> anyhow::Result<VersionedStore> {
        let root = resolve_path(&self.store);

        log::trace!("Opening store at {}", root.display());
        VersionedStore::open(Vfs::new_default(), root.into_owned())
            .context("Could not open the versioned store")
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl FromStr for ColorChoice {
    type Err = ColorChoiceParseError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        match source {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(ColorChoiceParseError {
                attempted: source.to_owned(),
            }),
        }
    }
}

impl From<ColorChoice> for termcolor::ColorChoice {
    fn from(value: ColorChoice) -> Self {
        match value {
            ColorChoice::Auto => termcolor::ColorChoice::Auto,
            ColorChoice::Always => termcolor::ColorChoice::Always,
            ColorChoice::Never => termcolor::ColorChoice::Never,
        }
    }
}

impl From<ColorChoice> for env_logger::WriteStyle {
    fn from(value: ColorChoice) -> Self {
        match value {
            ColorChoice::Auto => env_logger::WriteStyle::Auto,
            ColorChoice::Always => env_logger::WriteStyle::Always,
            ColorChoice::Never => env_logger::WriteStyle::Never,
        }
    }
}

#[derive(Debug, Error)]
#[error("Invalid color choice '{attempted}'. Valid values are: auto, always, never")]
pub struct ColorChoiceParseError {
    attempted: String,
}

#[derive(Debug, Parser)]
pub enum Subcommand {
    Build(BuildCommand),
    Publish(PublishCommand),
    Update(UpdateCommand),
    Layer(LayerCommand),
    Fetch(FetchCommand),
}

pub(super) fn resolve_path(path: &Path) -> Cow<'_, Path> {
    if path.is_absolute() {
        Cow::Borrowed(path)
    } else {
        match env::current_dir() {
            Ok(current) => Cow::Owned(current.join(path)),
            Err(_) => Cow::Borrowed(path),
        }
    }
}

/// Reads a workspace scene file. A file that doesn't exist yet is an empty
/// workspace when `allow_missing` is set.
pub(super) fn read_workspace(path: &Path, allow_missing: bool) -> anyhow::Result<Scene> {
    let contents = match fs::read(path) {
        Ok(contents) => contents,
        Err(err) if allow_missing && err.kind() == io::ErrorKind::NotFound => {
            log::debug!("{} doesn't exist yet, starting from an empty workspace", path.display());
            return Ok(Scene::new("workspace"));
        }
        Err(err) => return Err(err.into()),
    };

    serde_json::from_slice(&contents)
        .with_context(|| format!("{} is not a valid scene file", path.display()))
}

pub(super) fn write_workspace(path: &Path, scene: &Scene) -> anyhow::Result<()> {
    let contents = serde_json::to_vec_pretty(scene)?;
    fs::write(path, contents)?;

    log::debug!("Wrote workspace to {}", path.display());
    Ok(())
}
