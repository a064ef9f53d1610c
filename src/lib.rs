//! wikiml: Wikipedia dumps as machine-learning datasets
//!
//! Downloads a dated, per-language Wikimedia XML dump, cleans the article
//! markup and writes sharded JSON-lines records that a training pipeline
//! can read in batches.
//!
//! - **fetch**: the fetch-or-reuse gate. A dump lives in a cache slot keyed by
//!   (directory, language, date) and is only downloaded when the slot is
//!   incomplete or a re-download is forced.
//! - **dataset**: streaming XML reader, wikitext cleaner, shard writer and
//!   batch reader.
//! - **loader**: applies the configured cache mode on top of both.
//!
//! ```no_run
//! use wikiml::{Config, WikipediaLoader};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = Config::default();
//! config.dump.language = Some("en".to_string());
//! config.dump.date = Some(20200220);
//! config.dump.data_dir = "data/en_wikipedia".into();
//!
//! let loaded = WikipediaLoader::new(&config)?.load()?;
//! for batch in loaded.reader.batches() {
//!     for article in batch? {
//!         println!("{}: {} chars", article.title, article.text.len());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dataset;
pub mod fetch;
pub mod loader;
pub mod util;

pub use config::Config;
pub use dataset::{Article, DatasetInfo, DatasetReader};
pub use fetch::{DownloadRequest, FetchGate, LocalArtifact};
pub use loader::{LoadError, LoadedDataset, WikipediaLoader};
