// src/infrastructure/config.rs
use crate::constants::{DEFAULT_SCRATCH_PREFIX, DEFAULT_STREAM_CHUNK_SIZE};
use crate::infrastructure::archive::{ArchiveOptions, Compression};
use crate::infrastructure::scratch::TempScratchProvider;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// TOML configuration for package generation
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub scratch: ScratchConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ScratchConfig {
    /// Directory for scratch dirs and artifacts; system temp dir when unset.
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ArchiveConfig {
    #[serde(default)]
    pub compression: Compression,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_prefix() -> String {
    DEFAULT_SCRATCH_PREFIX.to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_STREAM_CHUNK_SIZE
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            root: None,
            prefix: default_prefix(),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse TOML config")?;

        if config.archive.chunk_size == 0 {
            anyhow::bail!("archive.chunk_size must be greater than zero");
        }
        Ok(config)
    }

    /// Load an explicit file, else `<config dir>/ankipack/config.toml` if it
    /// exists, else defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => {
                debug!(?path, "Loading config from default location");
                Self::load(path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ankipack").join("config.toml"))
    }

    pub fn scratch_provider(&self) -> TempScratchProvider {
        let provider = match &self.scratch.root {
            Some(root) => TempScratchProvider::in_dir(root),
            None => TempScratchProvider::new(),
        };
        provider.with_prefix(&self.scratch.prefix)
    }

    pub fn archive_options(&self) -> ArchiveOptions {
        ArchiveOptions {
            compression: self.archive.compression,
        }
    }
}
