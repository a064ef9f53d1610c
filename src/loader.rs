//! One-call dataset loading
//!
//! Ties the fetch gate and the dataset builder together under the
//! configured cache mode:
//!
//! - `reuse-dataset-if-exists`: a complete build in the slot is opened
//!   without touching the network or the dump files.
//! - `reuse-cache-if-exists`: downloads are reused, the dataset is rebuilt.
//! - `force-redownload` (or `force_download = true`): everything is fetched
//!   and rebuilt.

use crate::config::{CacheMode, Config};
use crate::dataset::{
    DatasetBuilder, DatasetError, DatasetInfo, DatasetReader, WikipediaDatasetBuilder,
};
use crate::fetch::{
    DownloadRequest, DumpFetcher, DumpLocator, FetchError, FetchGate, HttpFetcher, LocalArtifact,
    Resolution,
};
use crate::util::format_minutes;
use std::time::Instant;
use thiserror::Error;
use tracing::info;

/// Errors surfaced by [`WikipediaLoader`]
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// A dataset ready to iterate
#[derive(Debug)]
pub struct LoadedDataset {
    pub reader: DatasetReader,
    /// How the dump was obtained; None when an existing build was reused
    pub resolution: Option<Resolution>,
}

impl LoadedDataset {
    pub fn info(&self) -> &DatasetInfo {
        self.reader.info()
    }

    /// True when nothing was downloaded or built
    pub fn reused_dataset(&self) -> bool {
        self.resolution.is_none()
    }
}

/// What is on disk for the configured dump
#[derive(Debug)]
pub struct CacheStatus {
    pub request: DownloadRequest,
    pub artifact: Option<LocalArtifact>,
    pub dataset: Option<DatasetInfo>,
}

/// Loads a Wikipedia dataset for one (language, date)
pub struct WikipediaLoader<F = HttpFetcher, B = WikipediaDatasetBuilder> {
    config: Config,
    request: DownloadRequest,
    gate: FetchGate<F>,
    builder: B,
}

impl WikipediaLoader {
    /// Validate `config` and wire up the HTTP fetcher and dump builder
    pub fn new(config: &Config) -> Result<Self, LoadError> {
        config
            .validate()
            .map_err(|e| LoadError::Config(format!("{:#}", e)))?;
        let verbose = config.logging.verbose;
        let fetcher = HttpFetcher::new(&config.download)?.with_progress(verbose);
        let builder = WikipediaDatasetBuilder::new(&config.dataset).with_progress(verbose);
        Self::with_parts(config, fetcher, builder)
    }
}

impl<F: DumpFetcher, B: DatasetBuilder> WikipediaLoader<F, B> {
    /// Use custom collaborators
    pub fn with_parts(config: &Config, fetcher: F, builder: B) -> Result<Self, LoadError> {
        config
            .validate()
            .map_err(|e| LoadError::Config(format!("{:#}", e)))?;

        let (Some(language), Some(date)) = (config.dump.language.as_deref(), config.dump.date) else {
            return Err(LoadError::Config("dump.language and dump.date must be set".to_string()));
        };
        let request = DownloadRequest::new(
            language,
            date,
            &config.dump.data_dir,
            config.dump.forces_download(),
        )?;

        let locator = DumpLocator::new(&config.dump.mirror_url)?;
        let gate = FetchGate::new(fetcher, locator).with_checksums(config.download.verify_checksums);

        Ok(Self {
            config: config.clone(),
            request,
            gate,
            builder,
        })
    }

    pub fn request(&self) -> &DownloadRequest {
        &self.request
    }

    pub fn gate(&self) -> &FetchGate<F> {
        &self.gate
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    /// Resolve the dump without building a dataset
    pub fn fetch(&self) -> Result<Resolution, LoadError> {
        Ok(self.gate.resolve(&self.request)?)
    }

    /// Inspect the cache slot without network access
    pub fn status(&self) -> Result<CacheStatus, LoadError> {
        let artifact = self.gate.probe(&self.request)?;
        let dataset = DatasetInfo::load(&self.request.slot().dataset_dir())?;
        Ok(CacheStatus {
            request: self.request.clone(),
            artifact,
            dataset,
        })
    }

    /// Fetch (or reuse), build (or reuse) and open the configured split
    pub fn load(&self) -> Result<LoadedDataset, LoadError> {
        let dataset_dir = self.request.slot().dataset_dir();

        if !self.request.force && self.config.dump.cache_mode == CacheMode::ReuseDatasetIfExists {
            if let Some(existing) = DatasetInfo::load(&dataset_dir)? {
                info!(
                    "Reusing dataset {} ({} examples) at {}",
                    existing.name,
                    existing.num_examples(),
                    dataset_dir.display()
                );
                return Ok(LoadedDataset {
                    reader: self.open_reader()?,
                    resolution: None,
                });
            }
        }

        info!(
            "Loading {} Wikipedia dump from {}. This could take a while...",
            self.request.language, self.request.date
        );
        let prep_start = Instant::now();

        let resolution = self.gate.resolve(&self.request)?;
        self.builder.build(&self.request, &resolution.artifact)?;

        info!("...done. Data prep took {}.", format_minutes(prep_start.elapsed()));

        Ok(LoadedDataset {
            reader: self.open_reader()?,
            resolution: Some(resolution),
        })
    }

    fn open_reader(&self) -> Result<DatasetReader, LoadError> {
        let start = Instant::now();
        let dataset = &self.config.dataset;
        let reader = DatasetReader::open(
            &self.request.slot().dataset_dir(),
            dataset.split,
            dataset.batch_size,
            dataset.shuffle_files,
        )?;
        info!(
            "Opened split '{}' ({} shard(s)) in {}",
            reader.split(),
            reader.shard_paths().len(),
            format_minutes(start.elapsed())
        );
        Ok(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Split;
    use crate::fetch::testing::FakeFetcher;
    use crate::fetch::CacheOutcome;
    use bzip2::write::BzEncoder;
    use bzip2::Compression;
    use std::cell::Cell;
    use std::io::Write;
    use std::path::Path;

    const DUMP_FILE: &str = "enwiki-20200220-pages-articles-multistream.xml.bz2";

    fn dump_bytes() -> Vec<u8> {
        let xml = r#"<mediawiki>
  <page><title>Anarchism</title><ns>0</ns><id>12</id>
    <revision><id>1</id><text>'''Anarchism''' is a [[political philosophy]].</text></revision>
  </page>
  <page><title>Autism</title><ns>0</ns><id>25</id>
    <revision><id>2</id><text>'''Autism''' is a condition.</text></revision>
  </page>
</mediawiki>"#;
        let mut enc = BzEncoder::new(Vec::new(), Compression::fast());
        enc.write_all(xml.as_bytes()).unwrap();
        enc.finish().unwrap()
    }

    /// Counts builds and delegates to the real builder
    struct CountingBuilder {
        inner: WikipediaDatasetBuilder,
        builds: Cell<usize>,
    }

    impl DatasetBuilder for CountingBuilder {
        fn build(
            &self,
            request: &DownloadRequest,
            artifact: &LocalArtifact,
        ) -> Result<DatasetInfo, DatasetError> {
            self.builds.set(self.builds.get() + 1);
            self.inner.build(request, artifact)
        }
    }

    fn config(dir: &Path, mode: CacheMode) -> Config {
        let mut config = Config::default();
        config.dump.language = Some("en".to_string());
        config.dump.date = Some(20200220);
        config.dump.data_dir = dir.to_path_buf();
        config.dump.cache_mode = mode;
        config.dataset.batch_size = 2;
        config
    }

    fn loader(config: &Config) -> WikipediaLoader<FakeFetcher, CountingBuilder> {
        let dump = dump_bytes();
        let builder = CountingBuilder {
            inner: WikipediaDatasetBuilder::new(&config.dataset),
            builds: Cell::new(0),
        };
        WikipediaLoader::with_parts(config, FakeFetcher::serving(&[(DUMP_FILE, &dump)]), builder)
            .unwrap()
    }

    fn counts(loader: &WikipediaLoader<FakeFetcher, CountingBuilder>) -> (usize, usize, usize) {
        (
            loader.gate().fetcher().status_requests(),
            loader.gate().fetcher().downloads(),
            loader.builder().builds.get(),
        )
    }

    #[test]
    fn first_load_fetches_builds_and_reads() {
        let tmp = tempfile::tempdir().unwrap();
        let loader = loader(&config(tmp.path(), CacheMode::ReuseDatasetIfExists));

        let loaded = loader.load().unwrap();

        assert_eq!(counts(&loader), (1, 1, 1));
        assert!(!loaded.reused_dataset());
        assert_eq!(loaded.resolution.as_ref().unwrap().outcome, CacheOutcome::Fetched);
        assert_eq!(loaded.info().name, "20200220.en");

        let batches: Vec<_> = loaded.reader.batches().collect::<Result<_, _>>().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0][0].title, "Anarchism");
        assert_eq!(batches[0][1].text, "Autism is a condition.");
    }

    #[test]
    fn reuse_dataset_skips_network_and_build() {
        let tmp = tempfile::tempdir().unwrap();
        let loader = loader(&config(tmp.path(), CacheMode::ReuseDatasetIfExists));

        loader.load().unwrap();
        // dump files are not needed once the dataset exists
        std::fs::remove_dir_all(loader.request().slot().downloads_dir()).unwrap();
        let again = loader.load().unwrap();

        assert!(again.reused_dataset());
        assert_eq!(counts(&loader), (1, 1, 1));
        assert_eq!(again.reader.records().count(), 2);
    }

    #[test]
    fn reuse_cache_rebuilds_from_downloads() {
        let tmp = tempfile::tempdir().unwrap();
        let loader = loader(&config(tmp.path(), CacheMode::ReuseCacheIfExists));

        loader.load().unwrap();
        let again = loader.load().unwrap();

        assert_eq!(again.resolution.unwrap().outcome, CacheOutcome::Hit);
        assert_eq!(counts(&loader), (1, 1, 2));
    }

    #[test]
    fn force_redownload_fetches_again() {
        let tmp = tempfile::tempdir().unwrap();
        let loader = loader(&config(tmp.path(), CacheMode::ForceRedownload));

        loader.load().unwrap();
        loader.load().unwrap();

        assert!(loader.request().force);
        assert_eq!(counts(&loader), (2, 2, 2));
    }

    #[test]
    fn force_download_flag_overrides_reuse() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = config(tmp.path(), CacheMode::ReuseDatasetIfExists);
        cfg.dump.force_download = true;
        let loader = loader(&cfg);

        loader.load().unwrap();
        let again = loader.load().unwrap();

        assert!(!again.reused_dataset());
        assert_eq!(counts(&loader), (2, 2, 2));
    }

    #[test]
    fn status_reports_cache_without_network() {
        let tmp = tempfile::tempdir().unwrap();
        let loader = loader(&config(tmp.path(), CacheMode::ReuseDatasetIfExists));

        let before = loader.status().unwrap();
        assert!(before.artifact.is_none());
        assert!(before.dataset.is_none());

        loader.load().unwrap();
        let after = loader.status().unwrap();
        assert!(after.artifact.is_some());
        assert_eq!(after.dataset.unwrap().num_examples(), 2);
        assert_eq!(counts(&loader).0, 1);
    }

    #[test]
    fn fetch_only_does_not_build() {
        let tmp = tempfile::tempdir().unwrap();
        let loader = loader(&config(tmp.path(), CacheMode::ReuseDatasetIfExists));

        let resolution = loader.fetch().unwrap();
        assert_eq!(resolution.outcome, CacheOutcome::Fetched);
        assert_eq!(counts(&loader), (1, 1, 0));
    }

    #[test]
    fn missing_language_is_a_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = config(tmp.path(), CacheMode::ReuseDatasetIfExists);
        cfg.dump.language = None;
        let builder = CountingBuilder {
            inner: WikipediaDatasetBuilder::new(&cfg.dataset),
            builds: Cell::new(0),
        };

        let err = WikipediaLoader::with_parts(&cfg, FakeFetcher::serving(&[]), builder)
            .err()
            .unwrap();
        assert!(matches!(err, LoadError::Config(ref msg) if msg.contains("dump.language")));
    }

    #[test]
    fn unknown_split_fails_after_build() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = config(tmp.path(), CacheMode::ReuseDatasetIfExists);
        cfg.dataset.split = Split::Test;
        let loader = loader(&cfg);

        let err = loader.load().unwrap_err();
        assert!(matches!(err, LoadError::Dataset(DatasetError::SplitNotFound { .. })));
    }

    #[test]
    fn missing_dump_surfaces_remote_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(tmp.path(), CacheMode::ReuseDatasetIfExists);
        let builder = CountingBuilder {
            inner: WikipediaDatasetBuilder::new(&cfg.dataset),
            builds: Cell::new(0),
        };
        let loader = WikipediaLoader::with_parts(&cfg, FakeFetcher::missing(), builder).unwrap();

        let err = loader.load().unwrap_err();
        assert!(matches!(err, LoadError::Fetch(ref e) if e.is_not_found()));
        assert_eq!(loader.builder().builds.get(), 0);
    }
}
