//! In-memory fetcher for unit tests

use super::error::FetchError;
use super::http::{DumpFetcher, Downloaded};
use sha1::{Digest, Sha1};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::Path;
use url::Url;

pub(crate) fn sha1_hex(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}

/// `dumpstatus.json` listing `files` under the article job
pub(crate) fn status_json(job_status: &str, files: &[(&str, &[u8])]) -> String {
    let files: serde_json::Map<String, serde_json::Value> = files
        .iter()
        .map(|(name, body)| {
            (
                name.to_string(),
                serde_json::json!({
                    "size": body.len(),
                    "url": format!("/dump/{}", name),
                    "sha1": sha1_hex(body),
                }),
            )
        })
        .collect();
    serde_json::json!({
        "jobs": {
            "articlesmultistreamdump": { "status": job_status, "files": files }
        },
        "version": "0.8"
    })
    .to_string()
}

/// Serves a fixed dump for any language/date and counts requests
pub(crate) struct FakeFetcher {
    files: BTreeMap<String, Vec<u8>>,
    job_status: String,
    found: bool,
    corrupt: bool,
    truncate: bool,
    status_requests: Cell<usize>,
    downloads: Cell<usize>,
}

impl FakeFetcher {
    pub(crate) fn serving(files: &[(&str, &[u8])]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(name, body)| (name.to_string(), body.to_vec()))
                .collect(),
            job_status: "done".to_string(),
            found: true,
            corrupt: false,
            truncate: false,
            status_requests: Cell::new(0),
            downloads: Cell::new(0),
        }
    }

    /// Every request answers 404
    pub(crate) fn missing() -> Self {
        Self {
            found: false,
            ..Self::serving(&[])
        }
    }

    /// Flip a byte in every body so checksums no longer match
    pub(crate) fn corrupting(mut self) -> Self {
        self.corrupt = true;
        self
    }

    /// Deliver only the first half of every body
    pub(crate) fn truncating(mut self) -> Self {
        self.truncate = true;
        self
    }

    pub(crate) fn with_job_status(mut self, status: &str) -> Self {
        self.job_status = status.to_string();
        self
    }

    pub(crate) fn status_requests(&self) -> usize {
        self.status_requests.get()
    }

    pub(crate) fn downloads(&self) -> usize {
        self.downloads.get()
    }

    fn not_found(url: &Url) -> FetchError {
        FetchError::UnexpectedStatus {
            url: url.to_string(),
            status: 404,
        }
    }
}

impl DumpFetcher for FakeFetcher {
    fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        self.status_requests.set(self.status_requests.get() + 1);
        if !self.found {
            return Err(Self::not_found(url));
        }
        let listed: Vec<(&str, &[u8])> = self
            .files
            .iter()
            .map(|(name, body)| (name.as_str(), body.as_slice()))
            .collect();
        Ok(status_json(&self.job_status, &listed).into_bytes())
    }

    fn download_to(&self, url: &Url, dest: &Path) -> Result<Downloaded, FetchError> {
        self.downloads.set(self.downloads.get() + 1);
        let name = url.path_segments().and_then(|mut s| s.next_back()).unwrap_or_default();
        let mut body = self.files.get(name).cloned().ok_or_else(|| Self::not_found(url))?;
        if self.corrupt {
            if let Some(first) = body.first_mut() {
                *first ^= 0xff;
            }
        }
        if self.truncate {
            body.truncate(body.len() / 2);
        }
        std::fs::write(dest, &body).map_err(|e| FetchError::write(dest, e))?;
        Ok(Downloaded {
            bytes: body.len() as u64,
            sha1: sha1_hex(&body),
        })
    }
}
