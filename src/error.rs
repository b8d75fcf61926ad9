//! Error types for the crawl pipeline.
//!
//! Every failure is a value that travels up to `main`, which logs it and
//! exits with a non-zero status. Nothing in the pipeline recovers locally
//! except malformed pages under [`MalformedPolicy::Skip`](crate::crawl::MalformedPolicy).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error returned by every fallible crawl operation.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The search endpoint could not be parsed or is not an absolute http(s) URL.
    #[error("invalid search endpoint {url:?}: {reason}")]
    Endpoint { url: String, reason: String },

    #[error("invalid crawl range: origin year {origin} is after final year {through}")]
    Range { origin: i32, through: i32 },

    #[error("invalid configuration: {0}")]
    Config(String),

    /// More requests were enumerated than the scheduler queue can hold.
    #[error("{requested} requests exceed the queue capacity of {capacity}")]
    QueueOverflow { requested: usize, capacity: usize },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("output path {path} is not writable: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request to {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("malformed page at {url}: {source}")]
    Extract {
        url: String,
        #[source]
        source: ExtractError,
    },

    #[error("failed to serialize events: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("event collector stopped unexpectedly: {0}")]
    Collector(String),
}

impl From<tokio::task::JoinError> for CrawlError {
    fn from(value: tokio::task::JoinError) -> Self {
        CrawlError::Collector(value.to_string())
    }
}

/// Failure of a single page request.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS, body or timeout failure.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("server answered with status {0}")]
    Status(reqwest::StatusCode),
}

/// A page whose markup does not match the expected layout.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unexpected venue/genre format: expected `venue | genre`, got {preview:?}")]
    VenueGenreFormat { preview: String },
}
