//! Sharded JSON-lines output

use super::info::ShardInfo;
use super::source::{Article, DatasetError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Number of shards for a dump of `total_bytes`: one per `max_bytes`, at least one
pub fn shard_count(total_bytes: u64, max_bytes: u64) -> usize {
    let max_bytes = max_bytes.max(1);
    total_bytes.div_ceil(max_bytes).max(1) as usize
}

/// `<prefix>-<split>.jsonl-00002-of-00016`
pub fn shard_file_name(prefix: &str, split: &str, index: usize, count: usize) -> String {
    format!("{}-{}.jsonl-{:05}-of-{:05}", prefix, split, index, count)
}

struct Shard {
    path: PathBuf,
    writer: BufWriter<File>,
    info: ShardInfo,
}

/// Writes records round-robin across a fixed number of shards
pub struct ShardWriter {
    shards: Vec<Shard>,
    next: usize,
}

impl ShardWriter {
    pub fn create(dir: &Path, prefix: &str, split: &str, count: usize) -> Result<Self, DatasetError> {
        let count = count.max(1);
        let mut shards = Vec::with_capacity(count);
        for index in 0..count {
            let file = shard_file_name(prefix, split, index, count);
            let path = dir.join(&file);
            let handle = File::create(&path).map_err(|e| DatasetError::write(&path, e))?;
            shards.push(Shard {
                path,
                writer: BufWriter::new(handle),
                info: ShardInfo {
                    file,
                    num_examples: 0,
                    num_bytes: 0,
                },
            });
        }
        Ok(Self { shards, next: 0 })
    }

    /// Append one record; returns the bytes written
    pub fn write(&mut self, article: &Article) -> Result<u64, DatasetError> {
        let mut line = serde_json::to_vec(article)?;
        line.push(b'\n');

        let shard = &mut self.shards[self.next];
        shard
            .writer
            .write_all(&line)
            .map_err(|e| DatasetError::write(&shard.path, e))?;
        shard.info.num_examples += 1;
        shard.info.num_bytes += line.len() as u64;

        self.next = (self.next + 1) % self.shards.len();
        Ok(line.len() as u64)
    }

    /// Flush every shard and describe them
    pub fn finish(self) -> Result<Vec<ShardInfo>, DatasetError> {
        let mut infos = Vec::with_capacity(self.shards.len());
        for mut shard in self.shards {
            shard
                .writer
                .flush()
                .map_err(|e| DatasetError::write(&shard.path, e))?;
            infos.push(shard.info);
        }
        Ok(infos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_count() {
        const MIB: u64 = 1024 * 1024;
        assert_eq!(shard_count(0, 128 * MIB), 1);
        assert_eq!(shard_count(10, 128 * MIB), 1);
        assert_eq!(shard_count(128 * MIB, 128 * MIB), 1);
        assert_eq!(shard_count(128 * MIB + 1, 128 * MIB), 2);
        assert_eq!(shard_count(17_000 * MIB, 128 * MIB), 133);
    }

    #[test]
    fn test_shard_file_name() {
        assert_eq!(
            shard_file_name("enwiki-20200220", "train", 2, 16),
            "enwiki-20200220-train.jsonl-00002-of-00016"
        );
    }

    #[test]
    fn test_round_robin() {
        let tmp = tempfile::tempdir().unwrap();
        let mut writer = ShardWriter::create(tmp.path(), "enwiki-20200220", "train", 2).unwrap();
        for i in 0..5 {
            writer
                .write(&Article::new(i.to_string(), format!("T{}", i), "text"))
                .unwrap();
        }
        let shards = writer.finish().unwrap();

        assert_eq!(shards.len(), 2);
        assert_eq!(shards[0].num_examples, 3);
        assert_eq!(shards[1].num_examples, 2);

        let first = std::fs::read_to_string(tmp.path().join(&shards[0].file)).unwrap();
        let ids: Vec<String> = first
            .lines()
            .map(|l| serde_json::from_str::<Article>(l).unwrap().id)
            .collect();
        assert_eq!(ids, vec!["0", "2", "4"]);
        assert_eq!(shards[0].num_bytes, first.len() as u64);
    }
}
