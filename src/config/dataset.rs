//! Dataset build and read configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound on a single output shard (128 MiB)
pub const DEFAULT_SHARD_MAX_BYTES: u64 = 128 * 1024 * 1024;

/// Dataset split selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Test,
    /// Every split the dataset has
    #[serde(alias = "none")]
    All,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Test => "test",
            Self::All => "all",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(Self::Train),
            "test" => Ok(Self::Test),
            "all" | "none" => Ok(Self::All),
            other => Err(format!("unknown split '{}' (expected train, test or all)", other)),
        }
    }
}

/// Dataset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Split to read after the build
    pub split: Split,
    /// Yield (input, target) pairs instead of records
    pub as_supervised: bool,
    /// Records per batch when reading
    pub batch_size: usize,
    /// Shuffle shard order when reading
    pub shuffle_files: bool,
    /// Skip articles whose cleaned text is shorter than this
    pub min_content_length: usize,
    /// Namespace allowlist (0 = main articles, empty = every namespace)
    pub namespaces: Vec<i32>,
    /// Upper bound on dump bytes per output shard
    pub shard_max_bytes: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            split: Split::Train,
            as_supervised: false,
            batch_size: 1,
            shuffle_files: false,
            min_content_length: 0,
            namespaces: vec![0],
            shard_max_bytes: DEFAULT_SHARD_MAX_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_none_means_all() {
        assert_eq!("none".parse(), Ok(Split::All));
        assert_eq!("train".parse(), Ok(Split::Train));
        assert!("validation".parse::<Split>().is_err());
    }

    #[test]
    fn split_none_in_toml_means_all() {
        let cfg: DatasetConfig = toml::from_str("split = \"none\"").unwrap();
        assert_eq!(cfg.split, Split::All);
        let cfg: DatasetConfig = toml::from_str("split = \"all\"").unwrap();
        assert_eq!(cfg.split, Split::All);
        assert!(toml::from_str::<DatasetConfig>("split = \"validation\"").is_err());
    }

    #[test]
    fn defaults_read_train_split_one_at_a_time() {
        let cfg = DatasetConfig::default();
        assert_eq!(cfg.split, Split::Train);
        assert_eq!(cfg.batch_size, 1);
        assert_eq!(cfg.namespaces, vec![0]);
        assert_eq!(cfg.shard_max_bytes, 134_217_728);
    }
}
