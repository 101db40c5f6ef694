//! The versioned store of published layer files and asset builds.
//!
//! Layout under the store root:
//!
//! ```text
//! wip/<asset>/<layer>/<asset>_<layer>_v001.scene.json
//! build/<asset>/<asset>_v001.scene.json
//! build/assets.cats.txt
//! ```
//!
//! Versions are numbered from 1 in sorted file name order.

use std::{
    fmt, io,
    path::{Path, PathBuf},
};

use memofs::{IoResultExt, Vfs};
use thiserror::Error;
use uuid::Uuid;

use crate::scene::Scene;

const SCENE_EXTENSION: &str = ".scene.json";
const CATALOG_FILE: &str = "assets.cats.txt";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store root {} is missing or not a directory", .path.display())]
    Configuration { path: PathBuf },

    #[error("no versions of {layer} have been published for {asset}")]
    NotFound { asset: String, layer: String },

    #[error("version {requested} of {asset} {layer} is out of range, the latest is {available}")]
    OutOfRange {
        asset: String,
        layer: String,
        requested: u32,
        available: u32,
    },

    #[error("malformed scene file at path {}", .path.display())]
    MalformedScene {
        source: serde_json::Error,
        path: PathBuf,
    },

    #[error("could not encode scene for path {}", .path.display())]
    Encode {
        source: serde_json::Error,
        path: PathBuf,
    },

    #[error(transparent)]
    Io {
        #[from]
        source: io::Error,
    },
}

impl StoreError {
    fn not_found(asset: &str, layer: &str) -> Self {
        Self::NotFound {
            asset: asset.to_owned(),
            layer: layer.to_owned(),
        }
    }

    /// Whether this only means nothing was published yet, which callers
    /// building everything they can usually skip past.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// One published file of a layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerVersion {
    pub asset: String,
    pub layer: String,

    /// Starts at 1.
    pub number: u32,

    pub path: PathBuf,
}

impl fmt::Display for LayerVersion {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{} {} v{:03}", self.asset, self.layer, self.number)
    }
}

pub struct VersionedStore {
    vfs: Vfs,
    root: PathBuf,
}

impl VersionedStore {
    /// Opens the store rooted at `root`, which has to be an existing
    /// directory.
    pub fn open(vfs: Vfs, root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();

        match vfs.metadata(&root).with_not_found()? {
            Some(metadata) if metadata.is_dir() => {}
            _ => return Err(StoreError::Configuration { path: root }),
        }

        log::debug!("Opened store at {}", root.display());

        Ok(VersionedStore { vfs, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layer_dir(&self, asset: &str, layer: &str) -> PathBuf {
        self.root.join("wip").join(asset).join(layer)
    }

    pub fn build_dir(&self, asset: &str) -> PathBuf {
        self.root.join("build").join(asset)
    }

    /// Every published file of a layer, oldest first. A layer directory
    /// that doesn't exist holds no versions.
    pub fn list_versions(&self, asset: &str, layer: &str) -> Result<Vec<PathBuf>, StoreError> {
        list_scene_files(&self.vfs, &self.layer_dir(asset, layer))
    }

    pub fn latest(&self, asset: &str, layer: &str) -> Result<LayerVersion, StoreError> {
        let versions = self.list_versions(asset, layer)?;
        let number = versions.len() as u32;

        match versions.into_iter().last() {
            Some(path) => Ok(LayerVersion {
                asset: asset.to_owned(),
                layer: layer.to_owned(),
                number,
                path,
            }),
            None => Err(StoreError::not_found(asset, layer)),
        }
    }

    pub fn version(&self, asset: &str, layer: &str, number: u32) -> Result<LayerVersion, StoreError> {
        let versions = self.list_versions(asset, layer)?;

        if versions.is_empty() {
            return Err(StoreError::not_found(asset, layer));
        }

        let available = versions.len() as u32;
        if number == 0 || number > available {
            return Err(StoreError::OutOfRange {
                asset: asset.to_owned(),
                layer: layer.to_owned(),
                requested: number,
                available,
            });
        }

        Ok(LayerVersion {
            asset: asset.to_owned(),
            layer: layer.to_owned(),
            number,
            path: versions[number as usize - 1].clone(),
        })
    }

    /// The explicit version if one is given, otherwise the latest.
    pub fn resolve(
        &self,
        asset: &str,
        layer: &str,
        number: Option<u32>,
    ) -> Result<LayerVersion, StoreError> {
        match number {
            Some(number) => self.version(asset, layer, number),
            None => self.latest(asset, layer),
        }
    }

    /// The number the next published version of a layer will get.
    pub fn next_version(&self, asset: &str, layer: &str) -> Result<u32, StoreError> {
        Ok(self.list_versions(asset, layer)?.len() as u32 + 1)
    }

    /// Reads a published scene. Node IDs are reissued so the result never
    /// collides with a workspace that came from the same file.
    pub fn load(&self, version: &LayerVersion) -> Result<Scene, StoreError> {
        log::debug!("Loading {} from {}", version, version.path.display());

        let mut scene = read_scene(&self.vfs, &version.path)?;
        scene.reissue_ids();
        Ok(scene)
    }

    /// Writes `scene` as the next version of a layer. The layer directory
    /// has to exist already.
    pub fn publish(&self, asset: &str, layer: &str, scene: &Scene) -> Result<LayerVersion, StoreError> {
        let number = self.next_version(asset, layer)?;
        let file_name = format!("{}_{}_v{:03}{}", asset, layer, number, SCENE_EXTENSION);
        let path = self.layer_dir(asset, layer).join(file_name);

        write_scene(&self.vfs, &path, scene)?;

        let version = LayerVersion {
            asset: asset.to_owned(),
            layer: layer.to_owned(),
            number,
            path,
        };
        log::info!("Published {}", version);

        Ok(version)
    }

    /// Writes `scene` as the next build of an asset and returns the build
    /// number and path. The build directory has to exist already.
    pub fn save_build(&self, asset: &str, scene: &Scene) -> Result<(u32, PathBuf), StoreError> {
        let number = list_scene_files(&self.vfs, &self.build_dir(asset))?.len() as u32 + 1;
        let file_name = format!("{}_v{:03}{}", asset, number, SCENE_EXTENSION);
        let path = self.build_dir(asset).join(file_name);

        write_scene(&self.vfs, &path, scene)?;
        log::info!("Saved build {}", path.display());

        Ok((number, path))
    }

    /// The most recent build of an asset. Builds share the numbering rules
    /// of layer versions and are reported under the layer name `build`.
    pub fn latest_build(&self, asset: &str) -> Result<LayerVersion, StoreError> {
        let builds = list_scene_files(&self.vfs, &self.build_dir(asset))?;
        let number = builds.len() as u32;

        match builds.into_iter().last() {
            Some(path) => Ok(LayerVersion {
                asset: asset.to_owned(),
                layer: "build".to_owned(),
                number,
                path,
            }),
            None => Err(StoreError::not_found(asset, "build")),
        }
    }

    /// Lists a build in the asset catalog next to the builds, creating the
    /// catalog if needed.
    pub fn append_catalog(&self, catalog_id: Uuid, asset: &str, number: u32) -> Result<(), StoreError> {
        let path = self.root.join("build").join(CATALOG_FILE);

        let mut contents = match self.vfs.read(&path).with_not_found()? {
            Some(existing) => String::from_utf8_lossy(&existing).into_owned(),
            None => format!("VERSION 1\n\n{}:Builds:Builds", Uuid::new_v4()),
        };

        let name = capitalize(asset);
        contents.push_str(&format!("\n{}:Builds/{}:{} v{:03}", catalog_id, name, name, number));

        self.vfs.write(&path, contents)?;
        Ok(())
    }
}

fn list_scene_files(vfs: &Vfs, dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let entries = match vfs.read_dir(dir).with_not_found()? {
        Some(entries) => entries,
        None => return Ok(Vec::new()),
    };

    let mut files = Vec::new();

    for entry in entries {
        let path = entry?.path().to_path_buf();
        let is_scene = path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(false, |name| name.ends_with(SCENE_EXTENSION));

        if is_scene {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Reads and parses a scene file without touching its IDs.
pub fn read_scene(vfs: &Vfs, path: &Path) -> Result<Scene, StoreError> {
    let contents = vfs.read(path)?;

    serde_json::from_slice(&contents).map_err(|source| StoreError::MalformedScene {
        source,
        path: path.to_owned(),
    })
}

pub fn write_scene(vfs: &Vfs, path: &Path, scene: &Scene) -> Result<(), StoreError> {
    let contents = serde_json::to_vec_pretty(scene).map_err(|source| StoreError::Encode {
        source,
        path: path.to_owned(),
    })?;

    vfs.write(path, contents)?;
    Ok(())
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
