//! Shared utilities.
//!
//! - [`encoding`] - Fixed-width little-endian integer I/O
//! - [`progress`] - Progress bars with a no-op fallback

pub mod encoding;
pub mod progress;

use std::path::{Path, PathBuf};

/// Append `.{ext}` to a base path without going through lossy string
/// conversion.
///
/// Index files are addressed by prefix, not by directory: the prefix
/// `corpora/europarl` and the extension `lemma.corpus` name the file
/// `corpora/europarl.lemma.corpus`.
pub fn suffixed_path(base: &Path, ext: &str) -> PathBuf {
    let mut os = base.as_os_str().to_os_string();
    os.push(".");
    os.push(ext);
    PathBuf::from(os)
}

/// Format byte size to human readable
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
