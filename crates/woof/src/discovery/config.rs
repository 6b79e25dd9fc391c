//! Discovery configuration

use super::error::{DiscoveryError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Tunables for a discovery run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Extra path regexes the detector never classifies or descends into
    #[serde(default)]
    pub exclude_paths: Vec<String>,

    /// Object-store roots listed at once
    #[serde(default = "default_listing_concurrency")]
    pub listing_concurrency: usize,

    /// Per-root listing timeout in seconds
    #[serde(default = "default_listing_timeout")]
    pub listing_timeout_secs: u64,

    /// Manifest location, relative to the output directory
    #[serde(default = "default_manifest_path")]
    pub manifest_path: String,
}

fn default_listing_concurrency() -> usize {
    4
}

fn default_listing_timeout() -> u64 {
    300
}

fn default_manifest_path() -> String {
    "nextflow/input_files.tsv".to_string()
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            exclude_paths: Vec::new(),
            listing_concurrency: default_listing_concurrency(),
            listing_timeout_secs: default_listing_timeout(),
            manifest_path: default_manifest_path(),
        }
    }
}

impl DiscoveryConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DiscoveryConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| DiscoveryError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Explicit file if given, else `<home>/config.toml` if present, else
    /// defaults. Returns the file actually read, if any.
    pub fn resolve(explicit: Option<&Path>, home: &Path) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }
        let path = home.join(CONFIG_FILE_NAME);
        if path.is_file() {
            return Ok((Self::load(&path)?, Some(path)));
        }
        Ok((Self::default(), None))
    }

    pub fn validate(&self) -> Result<()> {
        if self.listing_concurrency == 0 {
            return Err(DiscoveryError::Config(
                "listing_concurrency must be at least 1".to_string(),
            ));
        }
        if self.listing_timeout_secs == 0 {
            return Err(DiscoveryError::Config(
                "listing_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.manifest_path.trim().is_empty() {
            return Err(DiscoveryError::Config("manifest_path is empty".to_string()));
        }
        Ok(())
    }

    pub fn listing_timeout(&self) -> Duration {
        Duration::from_secs(self.listing_timeout_secs)
    }

    /// Manifest path under `output_dir`.
    pub fn manifest_path_in(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.manifest_path)
    }
}
