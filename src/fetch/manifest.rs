//! Checksum manifest marking a complete download
//!
//! One line per dump file: `<url> <size> <sha1>` (`-` when no checksum was
//! published). The manifest is renamed into place only after every listed
//! file is on disk, so its presence is the cache-hit signal.

use super::error::FetchError;
use super::status::DumpFile;
use std::path::Path;
use url::Url;

/// Placeholder for a missing checksum
const NO_SHA1: &str = "-";

/// One downloaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub url: Url,
    pub size: u64,
    pub sha1: Option<String>,
}

impl ManifestEntry {
    /// Local file name (last URL segment)
    pub fn file_name(&self) -> &str {
        self.url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .unwrap_or("dump.xml")
    }
}

impl From<&DumpFile> for ManifestEntry {
    fn from(file: &DumpFile) -> Self {
        Self {
            url: file.url.clone(),
            size: file.size,
            sha1: file.sha1.clone(),
        }
    }
}

/// Manifest of a complete artifact
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumManifest {
    pub entries: Vec<ManifestEntry>,
}

impl ChecksumManifest {
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        Self { entries }
    }

    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&format!(
                "{} {} {}\n",
                entry.url,
                entry.size,
                entry.sha1.as_deref().unwrap_or(NO_SHA1)
            ));
        }
        out
    }

    pub fn parse(content: &str) -> Result<Self, FetchError> {
        let mut entries = Vec::new();
        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            let &[url, size, sha1] = fields.as_slice() else {
                return Err(FetchError::InvalidStatus(format!(
                    "manifest line {} has {} fields, expected 3",
                    lineno + 1,
                    fields.len()
                )));
            };
            let url = Url::parse(url).map_err(|e| {
                FetchError::InvalidStatus(format!("manifest line {}: bad url: {}", lineno + 1, e))
            })?;
            let size = size.parse().map_err(|_| {
                FetchError::InvalidStatus(format!("manifest line {}: bad size '{}'", lineno + 1, size))
            })?;
            entries.push(ManifestEntry {
                url,
                size,
                sha1: (sha1 != NO_SHA1).then(|| sha1.to_string()),
            });
        }
        Ok(Self { entries })
    }

    /// Load a manifest; `Ok(None)` when the file is absent
    pub fn load(path: &Path) -> Result<Option<Self>, FetchError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FetchError::write(path, e)),
        }
    }

    /// Write via a temporary file and rename
    pub fn save(&self, path: &Path) -> Result<(), FetchError> {
        let tmp = path.with_extension("txt.tmp");
        std::fs::write(&tmp, self.render()).map_err(|e| FetchError::write(&tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| FetchError::write(path, e))
    }
}
