//! Dump-to-dataset conversion

use super::info::{DatasetInfo, SplitInfo};
use super::progress::{BuildProgress, PageOutcome};
use super::source::{Article, DatasetError, DumpSource};
use super::wikimedia::WikimediaSource;
use super::wikitext::WikiTextParser;
use super::writer::{shard_count, ShardWriter};
use crate::config::DatasetConfig;
use crate::fetch::{DownloadRequest, LocalArtifact};
use crate::util::format_size;
use tracing::{debug, info};

/// Name of the only split a Wikipedia dump produces
pub const TRAIN_SPLIT: &str = "train";

/// Turns a downloaded dump into a dataset inside its cache slot
pub trait DatasetBuilder {
    /// Build into `artifact.slot().dataset_dir()`, replacing any previous build
    fn build(
        &self,
        request: &DownloadRequest,
        artifact: &LocalArtifact,
    ) -> Result<DatasetInfo, DatasetError>;
}

/// Streams every article file through the wikitext cleaner into JSONL shards
pub struct WikipediaDatasetBuilder {
    parser: WikiTextParser,
    namespaces: Vec<i32>,
    min_content_length: usize,
    shard_max_bytes: u64,
    show_progress: bool,
}

impl WikipediaDatasetBuilder {
    pub fn new(config: &DatasetConfig) -> Self {
        Self {
            parser: WikiTextParser::new(),
            namespaces: config.namespaces.clone(),
            min_content_length: config.min_content_length,
            shard_max_bytes: config.shard_max_bytes,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Clean every page of `source` and append the survivors to `writer`
    fn convert(
        &self,
        source: &mut dyn DumpSource,
        writer: &mut ShardWriter,
        progress: &BuildProgress,
    ) -> Result<(), DatasetError> {
        for page in source.iter_pages() {
            let page = page?;
            let text = self.parser.parse(&page.wikitext);

            let outcome = if text.is_empty() {
                PageOutcome::Empty
            } else if text.chars().count() < self.min_content_length {
                PageOutcome::TooShort
            } else {
                let article = Article::new(page.id, page.title.clone(), text);
                PageOutcome::Written(writer.write(&article)?)
            };
            progress.page_processed(&page.title, outcome);
        }
        Ok(())
    }
}

impl DatasetBuilder for WikipediaDatasetBuilder {
    fn build(
        &self,
        request: &DownloadRequest,
        artifact: &LocalArtifact,
    ) -> Result<DatasetInfo, DatasetError> {
        if artifact.files.is_empty() {
            return Err(DatasetError::EmptyArtifact);
        }

        let dir = artifact.slot().dataset_dir();
        if dir.exists() {
            debug!("Removing previous build in {}", dir.display());
            std::fs::remove_dir_all(&dir).map_err(|e| DatasetError::write(&dir, e))?;
        }
        std::fs::create_dir_all(&dir).map_err(|e| DatasetError::write(&dir, e))?;

        let prefix = format!("{}-{}", request.language.wiki_name(), request.date.stamp());
        let shards = shard_count(artifact.total_bytes(), self.shard_max_bytes);
        info!(
            "Building {} dataset from {} file(s) ({}) into {} shard(s)",
            prefix,
            artifact.files.len(),
            format_size(artifact.total_bytes()),
            shards
        );

        let mut writer = ShardWriter::create(&dir, &prefix, TRAIN_SPLIT, shards)?;
        let progress = BuildProgress::new(!self.show_progress);

        for file in &artifact.files {
            let mut source = WikimediaSource::open(&file.path)?.with_namespaces(&self.namespaces);
            debug!("Reading {}", source.source_name());
            self.convert(&mut source, &mut writer, &progress)?;
            progress.file_finished(file.size, source.skipped());
        }

        let shard_infos = writer.finish()?;
        progress.finish();

        let stats = progress.get_stats();
        info!(
            "Wrote {} records ({}); {} empty after cleaning, {} redirects and {} other-namespace pages skipped",
            stats.cleaned_examples,
            format_size(stats.bytes_written),
            stats.empty_clean_examples,
            stats.filtered_redirects,
            stats.filtered_namespace
        );

        let info = DatasetInfo::new(
            request.language.as_str(),
            &request.date.stamp(),
            vec![SplitInfo {
                name: TRAIN_SPLIT.to_string(),
                shards: shard_infos,
            }],
            stats,
        );
        info.save(&dir)?;
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Split;
    use crate::dataset::reader::DatasetReader;
    use crate::fetch::ArtifactFile;
    use bzip2::write::BzEncoder;
    use bzip2::Compression;
    use std::io::Write;
    use std::path::Path;
    use url::Url;

    const DUMP_XML: &str = r#"<mediawiki xmlns="http://www.mediawiki.org/xml/export-0.10/">
  <page>
    <title>Anarchism</title>
    <ns>0</ns>
    <id>12</id>
    <revision><id>1</id><text xml:space="preserve">'''Anarchism''' is a [[political philosophy]].{{Infobox}}
== Etymology ==
From Greek.&lt;ref&gt;Source&lt;/ref&gt;</text></revision>
  </page>
  <page>
    <title>AccessibleComputing</title>
    <ns>0</ns>
    <id>10</id>
    <redirect title="Computer accessibility" />
    <revision><id>2</id><text xml:space="preserve">#REDIRECT [[Computer accessibility]]</text></revision>
  </page>
  <page>
    <title>Stub</title>
    <ns>0</ns>
    <id>13</id>
    <revision><id>3</id><text xml:space="preserve">{{Only a template}}</text></revision>
  </page>
  <page>
    <title>Talk:Anarchism</title>
    <ns>1</ns>
    <id>14</id>
    <revision><id>4</id><text xml:space="preserve">Discussion.</text></revision>
  </page>
  <page>
    <title>Autism</title>
    <ns>0</ns>
    <id>25</id>
    <revision><id>5</id><text xml:space="preserve">'''Autism''' is a condition.</text></revision>
  </page>
</mediawiki>"#;

    fn artifact(root: &Path) -> (DownloadRequest, LocalArtifact) {
        let request = DownloadRequest::new("en", 20200220, root, false).unwrap();
        let slot = request.slot();
        std::fs::create_dir_all(slot.downloads_dir()).unwrap();

        let path = slot.download_path("enwiki-20200220-pages-articles-multistream.xml.bz2");
        let mut enc = BzEncoder::new(Vec::new(), Compression::fast());
        enc.write_all(DUMP_XML.as_bytes()).unwrap();
        let bytes = enc.finish().unwrap();
        std::fs::write(&path, &bytes).unwrap();

        let file = ArtifactFile {
            path,
            url: Url::parse("https://dumps.wikimedia.org/enwiki/20200220/x.xml.bz2").unwrap(),
            size: bytes.len() as u64,
            sha1: None,
        };
        (request, LocalArtifact::new(slot, vec![file]))
    }

    #[test]
    fn test_build_writes_records_and_info() {
        let tmp = tempfile::tempdir().unwrap();
        let (request, artifact) = artifact(tmp.path());

        let info = WikipediaDatasetBuilder::new(&DatasetConfig::default())
            .build(&request, &artifact)
            .unwrap();

        assert_eq!(info.name, "20200220.en");
        assert_eq!(info.num_examples(), 2);
        assert_eq!(info.splits[0].shards.len(), 1);
        assert_eq!(
            info.splits[0].shards[0].file,
            "enwiki-20200220-train.jsonl-00000-of-00001"
        );
        assert_eq!(info.stats.extracted_examples, 3);
        assert_eq!(info.stats.empty_clean_examples, 1);
        assert_eq!(info.stats.filtered_redirects, 1);
        assert_eq!(info.stats.filtered_namespace, 1);

        let reader = DatasetReader::open(&artifact.slot().dataset_dir(), Split::Train, 10, false).unwrap();
        let records: Vec<Article> = reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(records[0].id, "12");
        assert_eq!(records[0].title, "Anarchism");
        assert_eq!(
            records[0].text,
            "Anarchism is a political philosophy.\n\nEtymology\nFrom Greek."
        );
        assert_eq!(records[1].text, "Autism is a condition.");
    }

    #[test]
    fn test_min_content_length_and_sharding() {
        let tmp = tempfile::tempdir().unwrap();
        let (request, artifact) = artifact(tmp.path());
        let config = DatasetConfig {
            min_content_length: 25,
            shard_max_bytes: 64,
            ..Default::default()
        };

        let info = WikipediaDatasetBuilder::new(&config)
            .build(&request, &artifact)
            .unwrap();

        let expected_shards = shard_count(artifact.total_bytes(), 64);
        assert!(expected_shards > 1);
        assert_eq!(info.splits[0].shards.len(), expected_shards);
        assert_eq!(info.num_examples(), 1);
        assert_eq!(info.stats.short_examples, 1);
    }

    #[test]
    fn test_rebuild_replaces_previous_output() {
        let tmp = tempfile::tempdir().unwrap();
        let (request, artifact) = artifact(tmp.path());
        let dir = artifact.slot().dataset_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("stale-train.jsonl-00000-of-00009"), "old").unwrap();

        WikipediaDatasetBuilder::new(&DatasetConfig::default())
            .build(&request, &artifact)
            .unwrap();

        assert!(!dir.join("stale-train.jsonl-00000-of-00009").exists());
    }

    #[test]
    fn test_empty_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let request = DownloadRequest::new("en", 20200220, tmp.path(), false).unwrap();
        let artifact = LocalArtifact::new(request.slot(), Vec::new());
        let err = WikipediaDatasetBuilder::new(&DatasetConfig::default())
            .build(&request, &artifact)
            .unwrap_err();
        assert!(matches!(err, DatasetError::EmptyArtifact));
    }
}
