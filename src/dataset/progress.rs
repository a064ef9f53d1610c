//! Progress tracking for dataset builds

use super::source::{BuildStats, SkipCounts};
use crate::util::truncate_str;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Outcome of cleaning one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Written as a record of this many bytes
    Written(u64),
    /// Cleaned to nothing
    Empty,
    /// Under the minimum content length
    TooShort,
}

/// Progress tracker for dataset builds
pub struct BuildProgress {
    /// Progress bar (None if running in quiet mode)
    progress_bar: Option<ProgressBar>,
    start_time: Instant,
    extracted: AtomicU64,
    cleaned: AtomicU64,
    empty: AtomicU64,
    too_short: AtomicU64,
    bytes_written: AtomicU64,
    dump_bytes: AtomicU64,
    skipped_namespace: AtomicU64,
    skipped_redirects: AtomicU64,
    missing_text: AtomicU64,
}

impl BuildProgress {
    pub fn new(quiet: bool) -> Self {
        let progress_bar = if !quiet {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {pos} articles {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            Some(pb)
        } else {
            None
        };

        Self {
            progress_bar,
            start_time: Instant::now(),
            extracted: AtomicU64::new(0),
            cleaned: AtomicU64::new(0),
            empty: AtomicU64::new(0),
            too_short: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            dump_bytes: AtomicU64::new(0),
            skipped_namespace: AtomicU64::new(0),
            skipped_redirects: AtomicU64::new(0),
            missing_text: AtomicU64::new(0),
        }
    }

    /// Update progress after cleaning a page
    pub fn page_processed(&self, title: &str, outcome: PageOutcome) {
        let extracted = self.extracted.fetch_add(1, Ordering::Relaxed) + 1;

        match outcome {
            PageOutcome::Written(bytes) => {
                self.cleaned.fetch_add(1, Ordering::Relaxed);
                self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
            }
            PageOutcome::Empty => {
                self.empty.fetch_add(1, Ordering::Relaxed);
            }
            PageOutcome::TooShort => {
                self.too_short.fetch_add(1, Ordering::Relaxed);
            }
        }

        if let Some(ref pb) = self.progress_bar {
            pb.set_position(extracted);
            let elapsed = self.start_time.elapsed().as_secs_f64();
            let rate = if elapsed > 0.0 {
                extracted as f64 / elapsed
            } else {
                0.0
            };
            pb.set_message(format!("{:.1} docs/s | {}", rate, truncate_str(title, 30)));
        }
    }

    /// Account for a finished dump file
    pub fn file_finished(&self, compressed_bytes: u64, skipped: SkipCounts) {
        self.dump_bytes.fetch_add(compressed_bytes, Ordering::Relaxed);
        self.skipped_namespace.fetch_add(skipped.namespace, Ordering::Relaxed);
        self.skipped_redirects.fetch_add(skipped.redirects, Ordering::Relaxed);
        self.missing_text.fetch_add(skipped.missing_text, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> BuildStats {
        let mut stats = BuildStats {
            extracted_examples: self.extracted.load(Ordering::Relaxed),
            cleaned_examples: self.cleaned.load(Ordering::Relaxed),
            empty_clean_examples: self.empty.load(Ordering::Relaxed),
            short_examples: self.too_short.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            dump_bytes: self.dump_bytes.load(Ordering::Relaxed),
            elapsed_seconds: self.start_time.elapsed().as_secs_f64(),
            ..Default::default()
        };
        stats.record_skips(SkipCounts {
            namespace: self.skipped_namespace.load(Ordering::Relaxed),
            redirects: self.skipped_redirects.load(Ordering::Relaxed),
            missing_text: self.missing_text.load(Ordering::Relaxed),
        });
        stats.update_rate();
        stats
    }

    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            let stats = self.get_stats();
            pb.finish_with_message(format!(
                "Done! {} written, {} empty, {} redirects skipped, {:.1} docs/s",
                stats.cleaned_examples,
                stats.empty_clean_examples,
                stats.filtered_redirects,
                stats.docs_per_second
            ));
        }
    }
}
