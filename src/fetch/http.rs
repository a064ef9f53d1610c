//! HTTP retrieval of dump files
//!
//! Downloads stream into `<dest>.part` and are renamed into place once the
//! body has been fully written, so an interrupted transfer never looks like
//! a finished file.

use super::error::FetchError;
use crate::config::DownloadConfig;
use crate::util::{format_size, partial_path};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::{Client, Response};
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Result of a completed download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloaded {
    /// Bytes written
    pub bytes: u64,
    /// Hex SHA-1 of the body
    pub sha1: String,
}

/// Source of remote dump data
///
/// A 404 must surface as `FetchError::UnexpectedStatus { status: 404, .. }`
/// so the gate can report it as a missing dump.
pub trait DumpFetcher {
    /// Fetch a small resource into memory
    fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, FetchError>;

    /// Stream a resource to `dest`, replacing any existing file
    fn download_to(&self, url: &Url, dest: &Path) -> Result<Downloaded, FetchError>;
}

/// Blocking reqwest-based fetcher
pub struct HttpFetcher {
    client: Client,
    show_progress: bool,
}

impl HttpFetcher {
    pub fn new(config: &DownloadConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(config.timeout_secs.map(Duration::from_secs))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            show_progress: false,
        })
    }

    /// Show a byte progress bar while downloading
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    fn get(&self, url: &Url) -> Result<Response, FetchError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    fn progress_bar(&self, total: Option<u64>, name: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let pb = match total {
            Some(total) => ProgressBar::new(total),
            None => ProgressBar::new_spinner(),
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(name.to_string());
        Some(pb)
    }
}

impl DumpFetcher for HttpFetcher {
    fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let response = self.get(url)?;
        let body = response.bytes().map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })?;
        Ok(body.to_vec())
    }

    fn download_to(&self, url: &Url, dest: &Path) -> Result<Downloaded, FetchError> {
        let mut response = self.get(url)?;

        let part = partial_path(dest);
        let file = File::create(&part).map_err(|e| FetchError::write(&part, e))?;
        let mut writer = BufWriter::with_capacity(1024 * 1024, file);

        let name = dest
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let progress = self.progress_bar(response.content_length(), &name);

        let mut hasher = Sha1::new();
        let mut buf = vec![0u8; 256 * 1024];
        let mut written = 0u64;

        loop {
            let n = response.read(&mut buf).map_err(|source| FetchError::Transfer {
                url: url.to_string(),
                source,
            })?;
            if n == 0 {
                break;
            }
            writer
                .write_all(&buf[..n])
                .map_err(|e| FetchError::write(&part, e))?;
            hasher.update(&buf[..n]);
            written += n as u64;
            if let Some(ref pb) = progress {
                pb.set_position(written);
            }
        }

        writer.flush().map_err(|e| FetchError::write(&part, e))?;
        drop(writer);
        std::fs::rename(&part, dest).map_err(|e| FetchError::write(dest, e))?;

        if let Some(pb) = progress {
            pb.finish_with_message(format!("{} ({})", name, format_size(written)));
        }
        info!("Downloaded {} ({})", url, format_size(written));

        Ok(Downloaded {
            bytes: written,
            sha1: hex::encode(hasher.finalize()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&DownloadConfig::default()).unwrap()
    }

    #[test]
    fn download_streams_body_and_hashes_it() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/enwiki/20200220/a.xml")
            .with_status(200)
            .with_body("hello world")
            .create();

        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("a.xml");
        let url = Url::parse(&format!("{}/enwiki/20200220/a.xml", server.url())).unwrap();

        let downloaded = fetcher().download_to(&url, &dest).unwrap();

        mock.assert();
        assert_eq!(downloaded.bytes, 11);
        assert_eq!(downloaded.sha1, "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "hello world");
        assert!(!partial_path(&dest).exists());
    }

    #[test]
    fn missing_resource_reports_404() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/frwiki/19990101/dumpstatus.json")
            .with_status(404)
            .create();

        let url = Url::parse(&format!("{}/frwiki/19990101/dumpstatus.json", server.url())).unwrap();
        let err = fetcher().fetch_bytes(&url).unwrap_err();
        assert!(matches!(err, FetchError::UnexpectedStatus { status: 404, .. }));
    }

    #[test]
    fn failed_download_leaves_no_file() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/a.xml").with_status(500).create();

        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("a.xml");
        let url = Url::parse(&format!("{}/a.xml", server.url())).unwrap();

        assert!(fetcher().download_to(&url, &dest).is_err());
        assert!(!dest.exists());
        assert!(!partial_path(&dest).exists());
    }

    #[test]
    fn invalid_user_agent_is_a_client_error() {
        let config = DownloadConfig {
            user_agent: "wikiml\nbroken".to_string(),
            ..Default::default()
        };
        let err = HttpFetcher::new(&config).err().unwrap();
        assert!(matches!(err, FetchError::Client(_)));
        assert!(err.to_string().starts_with("failed to build HTTP client"));
    }

    #[test]
    fn fetch_bytes_returns_body() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/status.json")
            .with_status(200)
            .with_body("{}")
            .create();

        let url = Url::parse(&format!("{}/status.json", server.url())).unwrap();
        assert_eq!(fetcher().fetch_bytes(&url).unwrap(), b"{}");
    }
}
