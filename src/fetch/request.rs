//! Download requests and the cache slots they map to

use super::error::FetchError;
use chrono::NaiveDate;
use std::fmt;
use std::path::{Path, PathBuf};

/// Dump status file name, as published by Wikimedia
pub const STATUS_FILE: &str = "dumpstatus.json";
/// Checksum manifest; present only once every dump file is on disk
pub const MANIFEST_FILE: &str = "manifest.txt";
/// Sub-directory holding downloaded dump files
pub const DOWNLOADS_DIR: &str = "downloads";
/// Sub-directory holding the built dataset
pub const DATASET_DIR: &str = "dataset";

/// Wikipedia language code ("en", "simple", "zh_yue", ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Language(String);

impl Language {
    pub fn new(code: impl Into<String>) -> Result<Self, FetchError> {
        let code = code.into();
        let mut chars = code.chars();
        let valid = matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
            && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
        if !valid {
            return Err(FetchError::InvalidRequest(format!(
                "invalid language code '{}' (expected lowercase letters, digits, '_' or '-')",
                code
            )));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Database name used by the dump server ("enwiki")
    pub fn wiki_name(&self) -> String {
        format!("{}wiki", self.0)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Dump date stamp (YYYYMMDD)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DumpDate(NaiveDate);

impl DumpDate {
    pub fn from_yyyymmdd(stamp: u32) -> Result<Self, FetchError> {
        NaiveDate::parse_from_str(&format!("{:08}", stamp), "%Y%m%d")
            .map(Self)
            .map_err(|_| {
                FetchError::InvalidRequest(format!(
                    "invalid dump date {} (expected a calendar date as YYYYMMDD)",
                    stamp
                ))
            })
    }

    /// Stamp as used in dump URLs ("20200220")
    pub fn stamp(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for DumpDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stamp())
    }
}

/// One request to resolve a dump into a local artifact
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub language: Language,
    pub date: DumpDate,
    pub target_directory: PathBuf,
    pub force: bool,
}

impl DownloadRequest {
    pub fn new(
        language: &str,
        date: u32,
        target_directory: impl AsRef<Path>,
        force: bool,
    ) -> Result<Self, FetchError> {
        let target_directory = target_directory.as_ref().to_path_buf();
        if target_directory.as_os_str().is_empty() {
            return Err(FetchError::InvalidRequest(
                "target directory must not be empty".to_string(),
            ));
        }
        Ok(Self {
            language: Language::new(language)?,
            date: DumpDate::from_yyyymmdd(date)?,
            target_directory,
            force,
        })
    }

    /// Cache slot keyed by (directory, language, date)
    pub fn slot(&self) -> CacheSlot {
        CacheSlot::new(&self.target_directory, &self.language, self.date)
    }
}

/// On-disk location of one (language, date) dump inside a target directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSlot {
    root: PathBuf,
}

impl CacheSlot {
    pub fn new(target_directory: &Path, language: &Language, date: DumpDate) -> Self {
        Self {
            root: target_directory.join(format!("{}-{}", language.wiki_name(), date.stamp())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn status_path(&self) -> PathBuf {
        self.root.join(STATUS_FILE)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.root.join(DOWNLOADS_DIR)
    }

    pub fn dataset_dir(&self) -> PathBuf {
        self.root.join(DATASET_DIR)
    }

    /// Local path for a dump file name
    pub fn download_path(&self, file_name: &str) -> PathBuf {
        self.downloads_dir().join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_accepts_wiki_codes() {
        for code in ["en", "simple", "zh_yue", "be-tarask", "nds2"] {
            assert!(Language::new(code).is_ok(), "{} should be valid", code);
        }
    }

    #[test]
    fn language_rejects_bad_codes() {
        for code in ["", "EN", "1en", "en wiki", "en/../fr"] {
            assert!(Language::new(code).is_err(), "{:?} should be invalid", code);
        }
    }

    #[test]
    fn dump_date_requires_calendar_date() {
        assert_eq!(DumpDate::from_yyyymmdd(20200220).unwrap().stamp(), "20200220");
        assert!(DumpDate::from_yyyymmdd(20200230).is_err());
        assert!(DumpDate::from_yyyymmdd(2020022).is_err());
        assert!(DumpDate::from_yyyymmdd(0).is_err());
    }

    #[test]
    fn slot_is_keyed_by_language_and_date() {
        let en = DownloadRequest::new("en", 20200101, "data", false).unwrap();
        let fr = DownloadRequest::new("fr", 20200101, "data", false).unwrap();
        let en_later = DownloadRequest::new("en", 20200201, "data", false).unwrap();

        assert_eq!(en.slot().root(), Path::new("data/enwiki-20200101"));
        assert_ne!(en.slot(), fr.slot());
        assert_ne!(en.slot(), en_later.slot());
    }

    #[test]
    fn slot_layout() {
        let req = DownloadRequest::new("en", 20200220, "data/en_wikipedia", false).unwrap();
        let slot = req.slot();
        assert_eq!(
            slot.status_path(),
            Path::new("data/en_wikipedia/enwiki-20200220/dumpstatus.json")
        );
        assert_eq!(
            slot.download_path("a.xml.bz2"),
            Path::new("data/en_wikipedia/enwiki-20200220/downloads/a.xml.bz2")
        );
    }

    #[test]
    fn request_rejects_empty_directory() {
        assert!(DownloadRequest::new("en", 20200220, "", false).is_err());
    }
}
