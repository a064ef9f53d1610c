//! Configuration for wikiml

mod dataset;
mod download;
mod dump;
mod logging;

pub use dataset::{DatasetConfig, Split, DEFAULT_SHARD_MAX_BYTES};
pub use download::{DownloadConfig, DEFAULT_USER_AGENT};
pub use dump::{CacheMode, DumpConfig, DEFAULT_MIRROR_URL};
pub use logging::{LogFormat, LogLevel, LoggingConfig};

use crate::fetch::{DumpDate, Language};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Dump selection and cache policy
    #[serde(default)]
    pub dump: DumpConfig,
    /// Dataset build/read options
    #[serde(default)]
    pub dataset: DatasetConfig,
    /// HTTP client options
    #[serde(default)]
    pub download: DownloadConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let config = Self::from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without validating, so callers can apply
    /// overrides first.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))
    }

    /// Validate all configuration fields.
    ///
    /// Collects all validation errors and reports them together.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        match self.dump.language.as_deref() {
            None => errors.push("dump.language must be set".to_string()),
            Some(code) => {
                if let Err(e) = Language::new(code) {
                    errors.push(e.to_string());
                }
            }
        }
        match self.dump.date {
            None => errors.push("dump.date must be set (YYYYMMDD)".to_string()),
            Some(date) => {
                if let Err(e) = DumpDate::from_yyyymmdd(date) {
                    errors.push(e.to_string());
                }
            }
        }
        if self.dump.data_dir.as_os_str().is_empty() {
            errors.push("dump.data_dir must not be empty".to_string());
        }
        if let Err(e) = url::Url::parse(&self.dump.mirror_url) {
            errors.push(format!(
                "dump.mirror_url '{}' is not a valid URL: {}",
                self.dump.mirror_url, e
            ));
        }

        if self.dataset.batch_size == 0 {
            errors.push("dataset.batch_size must be positive".to_string());
        }
        if self.dataset.shard_max_bytes == 0 {
            errors.push("dataset.shard_max_bytes must be positive".to_string());
        }
        if self.dataset.as_supervised {
            errors.push(
                "dataset.as_supervised is not supported: Wikipedia datasets define no supervised keys"
                    .to_string(),
            );
        }

        if self.download.connect_timeout_secs == 0 {
            errors.push("download.connect_timeout_secs must be positive".to_string());
        }
        if self.download.user_agent.trim().is_empty() {
            errors.push("download.user_agent must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}
