//! JSON output for the crawled archive.
//!
//! The whole event list is written once, after the crawl has finished. The
//! same document is echoed to stdout so the run can be piped elsewhere.
//!
//! # Output Shape
//!
//! ```text
//! [
//!   {
//!     "date": "02/28/2024",
//!     "venue": "Club X",
//!     "genre": "Concert",
//!     "title": "Sommer Nacht",
//!     "text": "Doorsopenat8",
//!     "link": "https://morgengrau.net/cgi-bin/morgengrau/show_event.pl?sts=det&id=42"
//!   }
//! ]
//! ```

use crate::error::CrawlError;
use crate::models::Event;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, instrument};

/// Render events as two-space indented JSON.
pub fn render(events: &[Event]) -> Result<String, CrawlError> {
    Ok(serde_json::to_string_pretty(events)?)
}

/// Write the events to `path` and echo them to stdout.
///
/// Creates the parent directory if it is missing.
///
/// # Errors
///
/// [`CrawlError::Serialize`] if rendering fails, [`CrawlError::Write`] if
/// the file or stdout cannot be written.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = events.len()))]
pub async fn write_events(events: &[Event], path: &Path) -> Result<(), CrawlError> {
    let json = render(events)?;
    let write_error = |source: std::io::Error| CrawlError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).await.map_err(write_error)?;
    }

    info!("Writing JSON");
    if let Err(e) = fs::write(path, &json).await {
        error!(error = %e, "Failed to write JSON");
        return Err(write_error(e));
    }
    info!("Wrote events file");

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(json.as_bytes())
        .await
        .map_err(write_error)?;
    stdout.write_all(b"\n").await.map_err(write_error)?;
    stdout.flush().await.map_err(write_error)?;

    Ok(())
}
