//! Wikimedia `dumpstatus.json` parsing and dump URL construction

use super::error::FetchError;
use super::request::{DumpDate, Language, STATUS_FILE};
use serde::Deserialize;
use std::collections::BTreeMap;
use url::Url;

/// Job that produces the multistream article dump
pub const ARTICLES_JOB: &str = "articlesmultistreamdump";

/// Builds URLs on a dump mirror
#[derive(Debug, Clone)]
pub struct DumpLocator {
    base: String,
}

impl DumpLocator {
    pub fn new(mirror_url: &str) -> Result<Self, FetchError> {
        Url::parse(mirror_url).map_err(|e| {
            FetchError::InvalidRequest(format!("invalid mirror URL '{}': {}", mirror_url, e))
        })?;
        Ok(Self {
            base: mirror_url.trim_end_matches('/').to_string(),
        })
    }

    /// Directory of one dump run: `<mirror>/enwiki/20200220/`
    pub fn dump_url(&self, language: &Language, date: DumpDate) -> Result<Url, FetchError> {
        self.parse(&format!("{}/{}/{}/", self.base, language.wiki_name(), date.stamp()))
    }

    pub fn status_url(&self, language: &Language, date: DumpDate) -> Result<Url, FetchError> {
        let dump = self.dump_url(language, date)?;
        dump.join(STATUS_FILE)
            .map_err(|e| FetchError::InvalidRequest(format!("bad status URL: {}", e)))
    }

    /// Absolute URL for a file path as listed in dumpstatus.json
    pub fn file_url(&self, path: &str) -> Result<Url, FetchError> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return self.parse(path);
        }
        self.parse(&format!("{}/{}", self.base, path.trim_start_matches('/')))
    }

    fn parse(&self, raw: &str) -> Result<Url, FetchError> {
        Url::parse(raw).map_err(|e| FetchError::InvalidRequest(format!("bad URL '{}': {}", raw, e)))
    }
}

/// Top level of dumpstatus.json
#[derive(Debug, Clone, Deserialize)]
pub struct DumpStatus {
    pub jobs: BTreeMap<String, DumpJob>,
    #[serde(default)]
    pub version: Option<String>,
}

/// One dump job
#[derive(Debug, Clone, Deserialize)]
pub struct DumpJob {
    pub status: String,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub files: BTreeMap<String, DumpFileInfo>,
}

/// One file produced by a job
#[derive(Debug, Clone, Deserialize)]
pub struct DumpFileInfo {
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub md5: Option<String>,
}

/// A dump file selected for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpFile {
    pub name: String,
    pub url: Url,
    pub size: u64,
    pub sha1: Option<String>,
}

impl DumpStatus {
    pub fn parse(bytes: &[u8]) -> Result<Self, FetchError> {
        serde_json::from_slice(bytes).map_err(|e| {
            FetchError::InvalidStatus(format!("could not parse {}: {}", STATUS_FILE, e))
        })
    }

    /// XML files of the finished article job, in name order
    pub fn article_files(&self, locator: &DumpLocator) -> Result<Vec<DumpFile>, FetchError> {
        let job = self.jobs.get(ARTICLES_JOB).ok_or_else(|| {
            FetchError::InvalidStatus(format!("job '{}' missing from {}", ARTICLES_JOB, STATUS_FILE))
        })?;

        if job.status != "done" {
            return Err(FetchError::DumpNotReady {
                job: ARTICLES_JOB.to_string(),
                status: job.status.clone(),
            });
        }

        let mut files = Vec::new();
        for (name, info) in &job.files {
            // Index files (*.txt.bz2) sit next to the XML streams
            if !name.contains(".xml") {
                continue;
            }
            let path = info.url.as_deref().ok_or_else(|| {
                FetchError::InvalidStatus(format!("file '{}' has no url", name))
            })?;
            let size = info.size.ok_or_else(|| {
                FetchError::InvalidStatus(format!("file '{}' has no size", name))
            })?;
            files.push(DumpFile {
                name: name.clone(),
                url: locator.file_url(path)?,
                size,
                sha1: info.sha1.clone(),
            });
        }

        if files.is_empty() {
            return Err(FetchError::InvalidStatus(format!(
                "job '{}' lists no XML files",
                ARTICLES_JOB
            )));
        }
        Ok(files)
    }
}
