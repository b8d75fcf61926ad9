//! Small helpers for logging and file system checks.
//!
//! - String truncation for log previews and error messages
//! - Output path validation before any crawling starts

use crate::error::CrawlError;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut after `max` characters and get an ellipsis plus the
/// number of bytes left out.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Ensure the output file can be written before the crawl starts.
///
/// Creates the parent directory if needed, then writes and removes a probe
/// file next to the output. An existing output file is left untouched.
///
/// # Errors
///
/// [`CrawlError::Output`] if the directory cannot be created or is not writable.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_output(path: &Path) -> Result<(), CrawlError> {
    let output_error = |source: std::io::Error| CrawlError::Output {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    fs::create_dir_all(&dir).await.map_err(output_error)?;

    let probe_path = dir.join("..__probe_write__");
    stdfs::File::create(&probe_path).map_err(output_error)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
