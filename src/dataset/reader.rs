//! Reading a built dataset back as batches of records

use super::info::DatasetInfo;
use super::source::{Article, DatasetError};
use crate::config::Split;
use rand::seq::SliceRandom;
use rand::Rng;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

/// Handle on one split of a built dataset
#[derive(Debug, Clone)]
pub struct DatasetReader {
    dir: PathBuf,
    info: DatasetInfo,
    split: Split,
    shards: Vec<PathBuf>,
    batch_size: usize,
}

impl DatasetReader {
    /// Open `split` of the dataset in `dir`. With `shuffle_files`, shard
    /// order is randomized; records inside a shard keep their order.
    pub fn open(
        dir: &Path,
        split: Split,
        batch_size: usize,
        shuffle_files: bool,
    ) -> Result<Self, DatasetError> {
        let mut reader = Self::open_ordered(dir, split, batch_size)?;
        if shuffle_files {
            reader.shuffle_shards(&mut rand::thread_rng());
        }
        Ok(reader)
    }

    fn open_ordered(dir: &Path, split: Split, batch_size: usize) -> Result<Self, DatasetError> {
        let info = DatasetInfo::load(dir)?.ok_or_else(|| DatasetError::NotBuilt(dir.to_path_buf()))?;
        let shards = info
            .select(split)?
            .into_iter()
            .flat_map(|s| s.shards.iter().map(|shard| dir.join(&shard.file)))
            .collect();

        Ok(Self {
            dir: dir.to_path_buf(),
            info,
            split,
            shards,
            batch_size: batch_size.max(1),
        })
    }

    pub fn shuffle_shards<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.shards.shuffle(rng);
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn info(&self) -> &DatasetInfo {
        &self.info
    }

    pub fn split(&self) -> Split {
        self.split
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Shard files in read order
    pub fn shard_paths(&self) -> &[PathBuf] {
        &self.shards
    }

    /// Examples in the selected split(s)
    pub fn num_examples(&self) -> u64 {
        self.info
            .select(self.split)
            .map(|splits| splits.iter().map(|s| s.num_examples()).sum())
            .unwrap_or(0)
    }

    pub fn records(&self) -> Records {
        Records {
            pending: self.shards.iter().rev().cloned().collect(),
            current: None,
            failed: false,
        }
    }

    pub fn batches(&self) -> Batches {
        Batches {
            records: self.records(),
            batch_size: self.batch_size,
        }
    }
}

/// Records of every selected shard, in shard order
pub struct Records {
    /// Remaining shards, last one first
    pending: Vec<PathBuf>,
    current: Option<(PathBuf, Lines<BufReader<File>>, usize)>,
    failed: bool,
}

impl Iterator for Records {
    type Item = Result<Article, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some((path, lines, lineno)) = self.current.as_mut() {
                match lines.next() {
                    Some(Ok(line)) => {
                        *lineno += 1;
                        if line.trim().is_empty() {
                            continue;
                        }
                        let record = serde_json::from_str(&line).map_err(|e| DatasetError::BadRecord {
                            path: path.clone(),
                            line: *lineno,
                            message: e.to_string(),
                        });
                        self.failed = record.is_err();
                        return Some(record);
                    }
                    Some(Err(e)) => {
                        self.failed = true;
                        return Some(Err(e.into()));
                    }
                    None => self.current = None,
                }
            }

            let path = self.pending.pop()?;
            match File::open(&path) {
                Ok(file) => self.current = Some((path, BufReader::new(file).lines(), 0)),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e.into()));
                }
            }
        }
    }
}

/// Fixed-size batches; the last one may be short
pub struct Batches {
    records: Records,
    batch_size: usize,
}

impl Iterator for Batches {
    type Item = Result<Vec<Article>, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut batch = Vec::with_capacity(self.batch_size);
        for record in self.records.by_ref() {
            match record {
                Ok(article) => batch.push(article),
                Err(e) => return Some(Err(e)),
            }
            if batch.len() == self.batch_size {
                break;
            }
        }
        (!batch.is_empty()).then_some(Ok(batch))
    }
}
