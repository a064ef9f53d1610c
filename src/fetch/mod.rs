//! Dump retrieval
//!
//! Resolves a (language, date, directory) request into a complete local
//! copy of the Wikipedia article dump, downloading only when the cache slot
//! is missing, incomplete, or a re-download is forced.

mod error;
mod gate;
mod http;
mod manifest;
mod request;
mod status;

#[cfg(test)]
pub(crate) mod testing;

pub use error::FetchError;
pub use gate::{ArtifactFile, CacheOutcome, FetchGate, LocalArtifact, Resolution};
pub use http::{DumpFetcher, Downloaded, HttpFetcher};
pub use manifest::{ChecksumManifest, ManifestEntry};
pub use request::{
    CacheSlot, DownloadRequest, DumpDate, Language, DATASET_DIR, DOWNLOADS_DIR, MANIFEST_FILE,
    STATUS_FILE,
};
pub use status::{DumpFile, DumpLocator, DumpStatus, ARTICLES_JOB};
