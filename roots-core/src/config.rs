//! ROOTS configuration (`roots.toml`).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/roots.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RootsConfig {
    pub layout: Layout,
    pub hooks: HookConfig,
    pub logging: LoggingConfig,
    /// File the configuration was read from; `None` for built-in defaults.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl RootsConfig {
    /// Load from `path`; a missing file yields the defaults with no `source`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config =
            Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Fixed paths and helper binaries of the recovery environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub cache_root: PathBuf,
    pub data_root: PathBuf,
    pub metadata_root: PathBuf,
    /// Subtree of the data root kept by the media-preserving wipe.
    pub media_exclude: PathBuf,
    /// Breadcrumb directory signalling file-based encryption after a data wipe.
    pub convert_fbe_dir: PathBuf,
    pub system_root: Option<PathBuf>,
    /// Log directory, relative to the cache root.
    pub log_dir: PathBuf,
    pub find_program: String,
    pub mkfs_f2fs_program: String,
    pub mke2fs_program: String,
    pub security_context: Option<String>,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            cache_root: PathBuf::from("/cache"),
            data_root: PathBuf::from("/data"),
            metadata_root: PathBuf::from("/metadata"),
            media_exclude: PathBuf::from("/data/media"),
            convert_fbe_dir: PathBuf::from("/tmp/convert_fbe"),
            system_root: None,
            log_dir: PathBuf::from("recovery"),
            find_program: "/system/bin/find".to_string(),
            mkfs_f2fs_program: "/sbin/mkfs.f2fs".to_string(),
            mke2fs_program: "mke2fs".to_string(),
            security_context: None,
        }
    }
}

impl Layout {
    /// Marker file inside the breadcrumb directory.
    pub fn convert_fbe_file(&self) -> PathBuf {
        self.convert_fbe_dir.join("convert_fbe")
    }

    pub fn cache_log_dir(&self) -> PathBuf {
        self.cache_root.join(&self.log_dir)
    }
}

/// Optional device-specific commands bracketing a data wipe.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    pub pre_wipe_data: Option<Vec<String>>,
    pub post_wipe_data: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: Some(PathBuf::from("/tmp/recovery.log")),
        }
    }
}
