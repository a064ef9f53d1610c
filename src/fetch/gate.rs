//! Fetch-or-reuse gate
//!
//! Decides whether a dump must be downloaded or whether the copy in the
//! cache slot can be reused. The slot is keyed by (directory, language,
//! date), so one target directory can hold several dumps side by side.
//!
//! A slot is complete once its `manifest.txt` exists and every file it
//! lists is present at the recorded size. The manifest is removed before a
//! re-download starts and written back only after the last file has been
//! verified, so a crash mid-download leaves the slot incomplete.

use super::error::FetchError;
use super::http::DumpFetcher;
use super::manifest::{ChecksumManifest, ManifestEntry};
use super::request::{CacheSlot, DownloadRequest};
use super::status::{DumpLocator, DumpStatus};
use crate::util::{format_size, sha1_file};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use url::Url;

/// Whether `resolve` touched the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Complete artifact found locally; nothing fetched
    Hit,
    /// Artifact retrieved from the mirror
    Fetched,
}

/// One dump file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    pub path: PathBuf,
    pub url: Url,
    pub size: u64,
    pub sha1: Option<String>,
}

/// A complete dump in a cache slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalArtifact {
    slot: CacheSlot,
    pub files: Vec<ArtifactFile>,
}

impl LocalArtifact {
    pub fn new(slot: CacheSlot, files: Vec<ArtifactFile>) -> Self {
        Self { slot, files }
    }

    fn from_manifest(slot: CacheSlot, manifest: &ChecksumManifest) -> Self {
        let files = manifest
            .entries
            .iter()
            .map(|entry| ArtifactFile {
                path: slot.download_path(entry.file_name()),
                url: entry.url.clone(),
                size: entry.size,
                sha1: entry.sha1.clone(),
            })
            .collect();
        Self { slot, files }
    }

    /// Slot directory holding the artifact
    pub fn path(&self) -> &Path {
        self.slot.root()
    }

    pub fn slot(&self) -> &CacheSlot {
        &self.slot
    }

    /// Sum of dump file sizes
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

/// Artifact plus how it was obtained
#[derive(Debug, Clone)]
pub struct Resolution {
    pub artifact: LocalArtifact,
    pub outcome: CacheOutcome,
}

/// The fetch-or-reuse decision
pub struct FetchGate<F> {
    fetcher: F,
    locator: DumpLocator,
    verify_checksums: bool,
}

impl<F: DumpFetcher> FetchGate<F> {
    pub fn new(fetcher: F, locator: DumpLocator) -> Self {
        Self {
            fetcher,
            locator,
            verify_checksums: true,
        }
    }

    /// Enable/disable SHA-1 verification of downloaded files
    pub fn with_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Look for a complete artifact without touching the network
    pub fn probe(&self, request: &DownloadRequest) -> Result<Option<LocalArtifact>, FetchError> {
        cached_artifact(request.slot())
    }

    /// Return the local artifact for `request`, downloading it if needed.
    ///
    /// Without `force`, a complete slot is returned as-is. With `force`, or
    /// when the slot is incomplete, the dump status is fetched and every
    /// article file is downloaded into the slot. One attempt is made;
    /// errors propagate.
    pub fn resolve(&self, request: &DownloadRequest) -> Result<Resolution, FetchError> {
        let slot = request.slot();

        if request.force {
            info!(
                "Forced download of {} dump {} into {}",
                request.language,
                request.date,
                slot.root().display()
            );
        } else if let Some(artifact) = cached_artifact(slot.clone())? {
            info!(
                "Reusing cached {} dump {} at {}",
                request.language,
                request.date,
                artifact.path().display()
            );
            return Ok(Resolution {
                artifact,
                outcome: CacheOutcome::Hit,
            });
        } else {
            debug!("Cache miss for {}", slot.root().display());
        }

        let manifest = self.retrieve(request, &slot)?;
        Ok(Resolution {
            artifact: LocalArtifact::from_manifest(slot, &manifest),
            outcome: CacheOutcome::Fetched,
        })
    }

    fn retrieve(
        &self,
        request: &DownloadRequest,
        slot: &CacheSlot,
    ) -> Result<ChecksumManifest, FetchError> {
        let downloads = slot.downloads_dir();
        std::fs::create_dir_all(&downloads).map_err(|e| FetchError::write(&downloads, e))?;

        let manifest_path = slot.manifest_path();
        match std::fs::remove_file(&manifest_path) {
            Ok(()) => debug!("Invalidated {}", manifest_path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(FetchError::write(&manifest_path, e)),
        }

        let status_url = self.locator.status_url(&request.language, request.date)?;
        info!("Fetching dump status from {}", status_url);
        let status_bytes = self
            .fetcher
            .fetch_bytes(&status_url)
            .map_err(|e| not_found_as_remote(e, request))?;

        let status_path = slot.status_path();
        std::fs::write(&status_path, &status_bytes)
            .map_err(|e| FetchError::write(&status_path, e))?;

        let files = DumpStatus::parse(&status_bytes)?.article_files(&self.locator)?;
        let manifest = ChecksumManifest::new(files.iter().map(ManifestEntry::from).collect());
        info!(
            "{} dump {}: {} file(s), {}",
            request.language,
            request.date,
            manifest.entries.len(),
            format_size(manifest.total_bytes())
        );

        for entry in &manifest.entries {
            let dest = slot.download_path(entry.file_name());

            if !request.force && self.is_reusable(&dest, entry)? {
                debug!("Keeping already downloaded {}", dest.display());
                continue;
            }

            let downloaded = self
                .fetcher
                .download_to(&entry.url, &dest)
                .map_err(|e| not_found_as_remote(e, request))?;

            if downloaded.bytes != entry.size {
                discard(&dest);
                return Err(FetchError::SizeMismatch {
                    path: dest,
                    expected: entry.size,
                    actual: downloaded.bytes,
                });
            }

            if self.verify_checksums {
                if let Some(expected) = &entry.sha1 {
                    if !downloaded.sha1.eq_ignore_ascii_case(expected) {
                        discard(&dest);
                        return Err(FetchError::ChecksumMismatch {
                            path: dest,
                            expected: expected.clone(),
                            actual: downloaded.sha1,
                        });
                    }
                }
            }
        }

        manifest.save(&manifest_path)?;
        Ok(manifest)
    }

    /// A leftover file from an interrupted run can be kept if it matches
    fn is_reusable(&self, path: &Path, entry: &ManifestEntry) -> Result<bool, FetchError> {
        if !has_size(path, entry.size) {
            return Ok(false);
        }
        match (&entry.sha1, self.verify_checksums) {
            (Some(expected), true) => {
                let actual = sha1_file(path).map_err(|e| FetchError::write(path, e))?;
                Ok(actual.eq_ignore_ascii_case(expected))
            }
            _ => Ok(true),
        }
    }
}

/// Complete artifact in `slot`, if any
fn cached_artifact(slot: CacheSlot) -> Result<Option<LocalArtifact>, FetchError> {
    let manifest = match ChecksumManifest::load(&slot.manifest_path()) {
        Ok(Some(manifest)) => manifest,
        Ok(None) => return Ok(None),
        Err(FetchError::InvalidStatus(reason)) => {
            warn!("Ignoring unreadable manifest in {}: {}", slot.root().display(), reason);
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    if manifest.entries.is_empty() {
        return Ok(None);
    }

    let artifact = LocalArtifact::from_manifest(slot, &manifest);
    if let Some(missing) = artifact.files.iter().find(|f| !has_size(&f.path, f.size)) {
        debug!("Cached file {} is missing or truncated", missing.path.display());
        return Ok(None);
    }
    Ok(Some(artifact))
}

/// Best-effort removal of a download that failed verification
fn discard(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        warn!("Failed to remove {}: {}", path.display(), e);
    }
}

fn has_size(path: &Path, size: u64) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.len() == size)
        .unwrap_or(false)
}

fn not_found_as_remote(err: FetchError, request: &DownloadRequest) -> FetchError {
    match err {
        FetchError::UnexpectedStatus { url, status: 404 } => FetchError::RemoteNotFound {
            language: request.language.to_string(),
            date: request.date.to_string(),
            url,
        },
        other => other,
    }
}
