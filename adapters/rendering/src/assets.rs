//! Named asset bytes and the TOML manifest describing them.

use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{AssetError, ConfigError, ShapeId, Theater};

/// Manifest version this build understands.
pub const SUPPORTED_MANIFEST_VERSION: u32 = 1;

/// Supplies raw asset bytes by name. Archive formats are the source's concern.
pub trait AssetSource {
    /// Reads the named asset.
    fn read(&self, name: &str) -> Result<Vec<u8>, AssetError>;

    /// Returns `true` when the named asset exists.
    fn contains(&self, name: &str) -> bool {
        self.read(name).is_ok()
    }
}

/// Assets held in memory, keyed by upper-cased name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryAssets {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryAssets {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an asset, replacing any previous bytes under the same name.
    pub fn insert<N>(&mut self, name: N, bytes: Vec<u8>)
    where
        N: AsRef<str>,
    {
        let _ = self.entries.insert(name.as_ref().to_ascii_uppercase(), bytes);
    }

    /// Builder form of [`Self::insert`].
    #[must_use]
    pub fn with_asset<N>(mut self, name: N, bytes: Vec<u8>) -> Self
    where
        N: AsRef<str>,
    {
        self.insert(name, bytes);
        self
    }

    /// Number of stored assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AssetSource for MemoryAssets {
    fn read(&self, name: &str) -> Result<Vec<u8>, AssetError> {
        self.entries
            .get(&name.to_ascii_uppercase())
            .cloned()
            .ok_or_else(|| AssetError::Missing {
                name: name.to_owned(),
            })
    }

    fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_uppercase())
    }
}

/// Loose asset files in one directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    /// Reads assets from `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory the assets are read from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for DirectoryAssets {
    fn read(&self, name: &str) -> Result<Vec<u8>, AssetError> {
        fs::read(self.root.join(name)).map_err(|error| match error.kind() {
            ErrorKind::NotFound => AssetError::Missing {
                name: name.to_owned(),
            },
            _ => AssetError::Unreadable {
                name: name.to_owned(),
                reason: error.to_string(),
            },
        })
    }
}

/// Per-theater file names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TheaterAssets {
    /// Palette file; defaults to the theater's standard name.
    pub palette: Option<String>,
    /// Template extension; defaults to the theater's standard extension.
    pub extension: Option<String>,
}

/// Shape file registered under an id.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ShapeEntry {
    /// Id draw requests refer to.
    pub id: u16,
    /// Asset name of the shape data.
    pub name: String,
}

/// Versioned description of where theater and shape data live.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AssetManifest {
    /// Document version; must equal [`SUPPORTED_MANIFEST_VERSION`].
    pub version: u32,
    /// Overrides keyed by lowercase theater name.
    #[serde(default)]
    pub theaters: BTreeMap<String, TheaterAssets>,
    /// Shapes to preload.
    #[serde(default)]
    pub shapes: Vec<ShapeEntry>,
}

impl AssetManifest {
    /// Parses a manifest document.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let manifest: Self = toml::from_str(contents)?;
        if manifest.version != SUPPORTED_MANIFEST_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: manifest.version,
                expected: SUPPORTED_MANIFEST_VERSION,
            });
        }
        Ok(manifest)
    }

    /// Reads and parses a manifest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read asset manifest at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse asset manifest at {}", path.display()))
    }

    /// Palette file for the theater.
    #[must_use]
    pub fn palette_for(&self, theater: Theater) -> &str {
        self.theaters
            .get(theater.name())
            .and_then(|entry| entry.palette.as_deref())
            .unwrap_or_else(|| theater.palette_name())
    }

    /// Template extension for the theater.
    #[must_use]
    pub fn extension_for(&self, theater: Theater) -> &str {
        self.theaters
            .get(theater.name())
            .and_then(|entry| entry.extension.as_deref())
            .unwrap_or_else(|| theater.tile_extension())
    }

    /// Shapes listed by the manifest.
    pub fn shape_ids(&self) -> impl Iterator<Item = (ShapeId, &str)> + '_ {
        self.shapes
            .iter()
            .map(|entry| (ShapeId::new(entry.id), entry.name.as_str()))
    }
}
