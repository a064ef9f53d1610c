//! Core types for turning dump pages into dataset records

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// A page pulled from a dump, before its markup is cleaned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    /// Page ID
    pub id: String,
    pub title: String,
    pub namespace: i32,
    /// Raw wikitext of the latest revision
    pub wikitext: String,
}

/// One dataset record, stored as a JSON line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub text: String,
}

impl Article {
    pub fn new(id: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            text: text.into(),
        }
    }
}

/// Pages dropped by a source before cleaning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipCounts {
    /// Outside the namespace allowlist
    pub namespace: u64,
    pub redirects: u64,
    /// No `<text>` body (deleted or suppressed revisions)
    pub missing_text: u64,
}

impl SkipCounts {
    pub fn total(&self) -> u64 {
        self.namespace + self.redirects + self.missing_text
    }

    pub fn add(&mut self, other: SkipCounts) {
        self.namespace += other.namespace;
        self.redirects += other.redirects;
        self.missing_text += other.missing_text;
    }
}

/// Anything that yields raw pages
pub trait DumpSource {
    /// Iterate over pages that passed the source's filters
    fn iter_pages(&mut self) -> Box<dyn Iterator<Item = Result<RawPage, DatasetError>> + '_>;

    /// Pages filtered so far
    fn skipped(&self) -> SkipCounts;

    /// Name for logs and progress
    fn source_name(&self) -> &str;
}

/// Counters for one dataset build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildStats {
    /// Pages handed to the cleaner
    pub extracted_examples: u64,
    /// Records written
    pub cleaned_examples: u64,
    /// Cleaned to nothing
    pub empty_clean_examples: u64,
    /// Shorter than the configured minimum after cleaning
    pub short_examples: u64,
    pub filtered_namespace: u64,
    pub filtered_redirects: u64,
    pub missing_text: u64,
    /// JSONL bytes written across shards
    pub bytes_written: u64,
    /// Compressed dump bytes consumed
    pub dump_bytes: u64,
    pub elapsed_seconds: f64,
    pub docs_per_second: f64,
}

impl BuildStats {
    /// Calculate documents per second
    pub fn update_rate(&mut self) {
        if self.elapsed_seconds > 0.0 {
            self.docs_per_second = self.extracted_examples as f64 / self.elapsed_seconds;
        }
    }

    pub fn record_skips(&mut self, skips: SkipCounts) {
        self.filtered_namespace += skips.namespace;
        self.filtered_redirects += skips.redirects;
        self.missing_text += skips.missing_text;
    }
}

/// Errors that can occur while building or reading a dataset
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML parse error in {source_name}: {message}")]
    XmlParse { source_name: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed record in {path} line {line}: {message}")]
    BadRecord {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("no dataset built at {0}")]
    NotBuilt(PathBuf),

    #[error("split '{split}' not found (available: {available})")]
    SplitNotFound { split: String, available: String },

    #[error("dump artifact lists no files")]
    EmptyArtifact,
}

impl DatasetError {
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatasetError::Write {
            path: path.into(),
            source,
        }
    }
}
