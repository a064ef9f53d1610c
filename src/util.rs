//! Shared utility functions

use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Truncate a string to a maximum length, appending "..." if truncated.
/// Handles multi-byte characters by finding a valid char boundary.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let suffix = "...";
    let target = max_len.saturating_sub(suffix.len());
    // Find a valid char boundary at or before target
    let mut end = target;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &s[..end], suffix)
}

/// Format bytes in human-readable form
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Whole minutes elapsed, as shown after a long data preparation
pub fn format_minutes(elapsed: Duration) -> String {
    let mins = elapsed.as_secs() / 60;
    if mins == 1 {
        "~1 min".to_string()
    } else {
        format!("~{} mins", mins)
    }
}

/// Sibling path a download is streamed into before being renamed
pub fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

/// Hex SHA-1 of a file's contents
pub fn sha1_file(path: &Path) -> io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; 256 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("a longer title", 8), "a lon...");
        // multi-byte boundary
        assert_eq!(truncate_str("ééééé", 6), "é...");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(128 * 1024 * 1024), "128.00 MB");
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(Duration::from_secs(20)), "~0 mins");
        assert_eq!(format_minutes(Duration::from_secs(119)), "~1 min");
        assert_eq!(format_minutes(Duration::from_secs(600)), "~10 mins");
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("d/enwiki.xml.bz2")),
            Path::new("d/enwiki.xml.bz2.part")
        );
    }

    #[test]
    fn test_sha1_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("f");
        std::fs::write(&path, "hello world").unwrap();
        assert_eq!(
            sha1_file(&path).unwrap(),
            "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"
        );
    }
}
