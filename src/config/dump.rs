//! Dump selection and cache configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Public Wikimedia dump server
pub const DEFAULT_MIRROR_URL: &str = "https://dumps.wikimedia.org";

/// How existing local state is treated when loading a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheMode {
    /// Ignore everything on disk and download again
    ForceRedownload,
    /// Reuse a built dataset if present, otherwise reuse downloads
    ReuseDatasetIfExists,
    /// Reuse downloaded dump files but always rebuild the dataset
    ReuseCacheIfExists,
}

impl CacheMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ForceRedownload => "force-redownload",
            Self::ReuseDatasetIfExists => "reuse-dataset-if-exists",
            Self::ReuseCacheIfExists => "reuse-cache-if-exists",
        }
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "force-redownload" => Ok(Self::ForceRedownload),
            "reuse-dataset-if-exists" => Ok(Self::ReuseDatasetIfExists),
            "reuse-cache-if-exists" => Ok(Self::ReuseCacheIfExists),
            other => Err(format!(
                "unknown cache mode '{}' (expected force-redownload, reuse-dataset-if-exists or reuse-cache-if-exists)",
                other
            )),
        }
    }
}

/// Which dump to fetch and where to keep it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpConfig {
    /// Wikipedia language code (e.g. "en", "simple", "zh_yue")
    pub language: Option<String>,
    /// Dump date stamp, YYYYMMDD
    pub date: Option<u32>,
    /// Root directory for cache slots
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Dump server base URL
    #[serde(default = "default_mirror_url")]
    pub mirror_url: String,
    /// Cache reuse policy
    #[serde(default = "default_cache_mode")]
    pub cache_mode: CacheMode,
    /// Download again even when a complete artifact exists
    #[serde(default)]
    pub force_download: bool,
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "wikiml")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".wikiml"))
}

fn default_mirror_url() -> String {
    DEFAULT_MIRROR_URL.to_string()
}

fn default_cache_mode() -> CacheMode {
    CacheMode::ReuseDatasetIfExists
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            language: None,
            date: None,
            data_dir: default_data_dir(),
            mirror_url: default_mirror_url(),
            cache_mode: default_cache_mode(),
            force_download: false,
        }
    }
}

impl DumpConfig {
    /// Whether the gate must skip its cache check
    pub fn forces_download(&self) -> bool {
        self.force_download || self.cache_mode == CacheMode::ForceRedownload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_mode_parses_known_values() {
        assert_eq!("force-redownload".parse(), Ok(CacheMode::ForceRedownload));
        assert_eq!(
            "reuse-dataset-if-exists".parse(),
            Ok(CacheMode::ReuseDatasetIfExists)
        );
        assert_eq!(
            "reuse-cache-if-exists".parse(),
            Ok(CacheMode::ReuseCacheIfExists)
        );
    }

    #[test]
    fn cache_mode_rejects_unknown_value() {
        let err = "reuse-everything".parse::<CacheMode>().unwrap_err();
        assert!(err.contains("unknown cache mode 'reuse-everything'"));
    }

    #[test]
    fn unknown_cache_mode_in_toml_is_a_parse_error() {
        let result: Result<DumpConfig, _> = toml::from_str(
            r#"
language = "en"
date = 20200220
cache_mode = "sometimes"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn force_redownload_mode_forces_download() {
        let mut cfg = DumpConfig::default();
        assert!(!cfg.forces_download());
        cfg.cache_mode = CacheMode::ForceRedownload;
        assert!(cfg.forces_download());
        cfg.cache_mode = CacheMode::ReuseCacheIfExists;
        cfg.force_download = true;
        assert!(cfg.forces_download());
    }
}
