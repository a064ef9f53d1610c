//! Errors raised while resolving a dump artifact

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while fetching or reusing a dump
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no {language} dump for {date} at {url}; pick a date listed on the dump server")]
    RemoteNotFound {
        language: String,
        date: String,
        url: String,
    },

    #[error("failed to write {path}: {source}")]
    LocalWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("transfer of {url} failed: {source}")]
    Transfer {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected HTTP status {status} for {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("invalid dump status: {0}")]
    InvalidStatus(String),

    #[error("dump job '{job}' is not finished (status: {status})")]
    DumpNotReady { job: String, status: String },

    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("incomplete download of {path}: expected {expected} bytes, received {actual}")]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    /// Wrap an IO error with the path being written
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FetchError::LocalWrite {
            path: path.into(),
            source,
        }
    }

    /// True when the dump does not exist upstream
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::RemoteNotFound { .. })
    }
}
