//! Application configuration assembled from the subsystem configs.

use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tactica_rendering::{ConfigError, PipelineConfig};
use tactica_system_session::SessionConfig;

/// Window settings for the macroquad backend.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct WindowConfig {
    pub(crate) title: String,
    pub(crate) scale: u32,
    pub(crate) target_fps: u32,
    pub(crate) vsync: bool,
    pub(crate) show_fps: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Tactica".to_owned(),
            scale: 2,
            target_fps: 60,
            vsync: true,
            show_fps: false,
        }
    }
}

/// Size of the generated demo map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct MapConfig {
    pub(crate) columns: u32,
    pub(crate) rows: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            columns: 64,
            rows: 64,
        }
    }
}

/// Where theater and shape data come from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct AssetConfig {
    /// Directory holding the game files; generated art is used when unset.
    pub(crate) directory: Option<PathBuf>,
    /// Manifest file name inside the directory.
    pub(crate) manifest: Option<String>,
}

impl AssetConfig {
    pub(crate) fn manifest_path(&self) -> Option<PathBuf> {
        let directory = self.directory.as_ref()?;
        Some(directory.join(self.manifest.as_deref().unwrap_or("assets.toml")))
    }
}

/// Every setting the `tactica` binary reads.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub(crate) session: SessionConfig,
    pub(crate) pipeline: PipelineConfig,
    pub(crate) window: WindowConfig,
    pub(crate) map: MapConfig,
    pub(crate) assets: AssetConfig,
}

impl AppConfig {
    /// Parses a configuration document; absent sections keep their defaults.
    pub(crate) fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Loads the file at `path`, or the defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse configuration at {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactica_rendering::Theater;

    #[test]
    fn empty_documents_yield_defaults() {
        assert_eq!(AppConfig::parse("").expect("empty config"), AppConfig::default());
    }

    #[test]
    fn partial_sections_override_only_named_fields() {
        let config = AppConfig::parse(
            r#"
[pipeline]
theater = "snow"
debug_overlay = true

[pipeline.dirty_rects]
max_rects = 8

[window]
scale = 3

[map]
columns = 32
"#,
        )
        .expect("valid config");
        assert_eq!(config.pipeline.theater, Theater::Snow);
        assert!(config.pipeline.debug_overlay);
        assert_eq!(config.pipeline.dirty_rects.max_rects, 8);
        assert_eq!(config.pipeline.width, 640, "unnamed fields keep defaults");
        assert_eq!(config.window.scale, 3);
        assert_eq!(config.map.columns, 32);
        assert_eq!(config.map.rows, 64);
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert!(AppConfig::parse("[pipeline]\ntheater = \"desert\"").is_err());
    }

    #[test]
    fn manifest_path_defaults_inside_the_asset_directory() {
        let assets = AssetConfig {
            directory: Some(PathBuf::from("/data")),
            manifest: None,
        };
        assert_eq!(
            assets.manifest_path(),
            Some(PathBuf::from("/data/assets.toml"))
        );
        assert_eq!(AssetConfig::default().manifest_path(), None);
    }
}
