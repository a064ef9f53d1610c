//! `dataset_info.json`: the description of a built dataset
//!
//! Written last, via a temporary file, so its presence means every shard it
//! lists is complete.

use super::source::{BuildStats, DatasetError};
use crate::config::Split;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DATASET_INFO_FILE: &str = "dataset_info.json";

pub const HOMEPAGE: &str = "https://dumps.wikimedia.org";

pub const CITATION: &str = r#"@ONLINE {wikidump,
    author = "Wikimedia Foundation",
    title  = "Wikimedia Downloads",
    url    = "https://dumps.wikimedia.org"
}"#;

pub const LICENSE: &str = "This work is licensed under the Creative Commons Attribution-ShareAlike \
3.0 Unported License. To view a copy of this license, visit \
http://creativecommons.org/licenses/by-sa/3.0/ or send a letter to \
Creative Commons, PO Box 1866, Mountain View, CA 94042, USA.";

/// One output shard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardInfo {
    /// File name relative to the dataset directory
    pub file: String,
    pub num_examples: u64,
    pub num_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitInfo {
    pub name: String,
    pub shards: Vec<ShardInfo>,
}

impl SplitInfo {
    pub fn num_examples(&self) -> u64 {
        self.shards.iter().map(|s| s.num_examples).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetInfo {
    /// `<date>.<language>`
    pub name: String,
    pub description: String,
    pub language: String,
    pub date: String,
    /// Version of the tool that built it
    pub version: String,
    /// Record field name to type
    pub features: BTreeMap<String, String>,
    pub supervised_keys: Option<(String, String)>,
    pub homepage: String,
    pub citation: String,
    pub license: String,
    pub splits: Vec<SplitInfo>,
    pub stats: BuildStats,
    pub created_at: DateTime<Utc>,
}

impl DatasetInfo {
    pub fn new(language: &str, date: &str, splits: Vec<SplitInfo>, stats: BuildStats) -> Self {
        let features = ["id", "title", "text"]
            .into_iter()
            .map(|f| (f.to_string(), "string".to_string()))
            .collect();

        Self {
            name: format!("{}.{}", date, language),
            description: format!(
                "Wikipedia dataset for {}, parsed from {} dump.",
                language, date
            ),
            language: language.to_string(),
            date: date.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            features,
            supervised_keys: None,
            homepage: HOMEPAGE.to_string(),
            citation: CITATION.to_string(),
            license: LICENSE.to_string(),
            splits,
            stats,
            created_at: Utc::now(),
        }
    }

    pub fn num_examples(&self) -> u64 {
        self.splits.iter().map(|s| s.num_examples()).sum()
    }

    /// Splits selected by `split`
    pub fn select(&self, split: Split) -> Result<Vec<&SplitInfo>, DatasetError> {
        let selected: Vec<&SplitInfo> = match split {
            Split::All => self.splits.iter().collect(),
            named => self
                .splits
                .iter()
                .filter(|s| s.name == named.as_str())
                .collect(),
        };

        if selected.is_empty() {
            return Err(DatasetError::SplitNotFound {
                split: split.to_string(),
                available: self
                    .splits
                    .iter()
                    .map(|s| s.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
        Ok(selected)
    }

    /// Load from a dataset directory; `Ok(None)` when it has not been built
    pub fn load(dir: &Path) -> Result<Option<Self>, DatasetError> {
        let path = dir.join(DATASET_INFO_FILE);
        match std::fs::read_to_string(&path) {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write atomically into `dir`
    pub fn save(&self, dir: &Path) -> Result<(), DatasetError> {
        let path = dir.join(DATASET_INFO_FILE);
        let tmp = dir.join(format!("{}.tmp", DATASET_INFO_FILE));
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&tmp, json).map_err(|e| DatasetError::write(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| DatasetError::write(&path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> DatasetInfo {
        DatasetInfo::new(
            "en",
            "20200220",
            vec![SplitInfo {
                name: "train".to_string(),
                shards: vec![
                    ShardInfo {
                        file: "a".to_string(),
                        num_examples: 3,
                        num_bytes: 30,
                    },
                    ShardInfo {
                        file: "b".to_string(),
                        num_examples: 2,
                        num_bytes: 20,
                    },
                ],
            }],
            BuildStats::default(),
        )
    }

    #[test]
    fn test_naming_and_counts() {
        let info = info();
        assert_eq!(info.name, "20200220.en");
        assert_eq!(info.description, "Wikipedia dataset for en, parsed from 20200220 dump.");
        assert_eq!(info.num_examples(), 5);
        assert!(info.supervised_keys.is_none());
        assert_eq!(info.features.keys().collect::<Vec<_>>(), vec!["id", "text", "title"]);
    }

    #[test]
    fn test_select_split() {
        let info = info();
        assert_eq!(info.select(Split::Train).unwrap().len(), 1);
        assert_eq!(info.select(Split::All).unwrap().len(), 1);
        let err = info.select(Split::Test).unwrap_err();
        assert!(matches!(err, DatasetError::SplitNotFound { ref available, .. } if available == "train"));
    }

    #[test]
    fn test_save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(DatasetInfo::load(tmp.path()).unwrap().is_none());

        let info = info();
        info.save(tmp.path()).unwrap();
        assert!(!tmp.path().join("dataset_info.json.tmp").exists());

        let loaded = DatasetInfo::load(tmp.path()).unwrap().unwrap();
        assert_eq!(loaded.name, info.name);
        assert_eq!(loaded.splits, info.splits);
        assert_eq!(loaded.created_at, info.created_at);
    }
}
