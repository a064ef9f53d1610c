//! HTTP download configuration

use serde::{Deserialize, Serialize};

/// Default user agent for dump requests
pub const DEFAULT_USER_AGENT: &str = concat!("wikiml/", env!("CARGO_PKG_VERSION"));

/// HTTP client settings for dump retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// User agent sent to the dump server
    pub user_agent: String,
    /// Total request timeout in seconds (None = unlimited; full dumps take hours)
    pub timeout_secs: Option<u64>,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Verify each file against the SHA-1 published in dumpstatus.json
    pub verify_checksums: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: None,
            connect_timeout_secs: 30,
            verify_checksums: true,
        }
    }
}
