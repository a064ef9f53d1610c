//! Dataset generation from Wikimedia dumps
//!
//! Turns the article files of a downloaded dump into a sharded JSON-lines
//! dataset and reads it back in batches.
//!
//! # Layout
//!
//! ```text
//! <data_dir>/enwiki-20200220/dataset/
//!   enwiki-20200220-train.jsonl-00000-of-00133
//!   ...
//!   dataset_info.json      written last; marks a complete build
//! ```
//!
//! Each line is one article: `{"id": "...", "title": "...", "text": "..."}`.

pub mod builder;
pub mod info;
pub mod progress;
pub mod reader;
pub mod source;
pub mod wikimedia;
pub mod wikitext;
pub mod writer;

pub use builder::{DatasetBuilder, WikipediaDatasetBuilder, TRAIN_SPLIT};
pub use info::{DatasetInfo, ShardInfo, SplitInfo, DATASET_INFO_FILE};
pub use progress::{BuildProgress, PageOutcome};
pub use reader::{Batches, DatasetReader, Records};
pub use source::{Article, BuildStats, DatasetError, DumpSource, RawPage, SkipCounts};
pub use wikimedia::WikimediaSource;
pub use wikitext::WikiTextParser;
pub use writer::{shard_count, shard_file_name, ShardWriter};
