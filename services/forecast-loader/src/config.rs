//! Configuration loading for the loader service.
//!
//! Reads an [`EtlConfig`] from YAML and layers command-line / environment
//! overrides on top of it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use forecast_etl::EtlConfig;
use tracing::{debug, info, warn};

/// Load the pipeline configuration from `path`.
///
/// A missing file is not an error: the defaults are used instead.
pub fn load_config(path: &Path) -> Result<EtlConfig> {
    if !path.exists() {
        warn!(path = %path.display(), "Config file not found, using defaults");
        return Ok(EtlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    // An empty document deserialises to unit, not to an empty mapping
    if content.trim().is_empty() {
        debug!(path = %path.display(), "Config file is empty, using defaults");
        return Ok(EtlConfig::default());
    }

    let config: EtlConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    info!(path = %path.display(), url = %config.feed.url, "Loaded forecast config");
    Ok(config)
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub db_path: Option<PathBuf>,
    pub csv_path: Option<PathBuf>,
    pub accept_invalid_certs: bool,
}

impl Overrides {
    /// Apply these overrides to `config`. Unset values leave the file's value alone.
    pub fn apply(self, mut config: EtlConfig) -> EtlConfig {
        if let Some(key) = self.api_key.filter(|k| !k.trim().is_empty()) {
            config.feed.api_key = Some(key);
        }
        if let Some(path) = self.db_path {
            config.store.path = path;
        }
        if let Some(path) = self.csv_path {
            config.export.path = path;
        }
        if self.accept_invalid_certs {
            config.feed.accept_invalid_certs = true;
        }
        config
    }
}
