//! # Morgengrau Events
//!
//! Crawls the morgengrau.net event calendar one day at a time, from 2004
//! through the current year, and exports every listing as JSON.
//!
//! ## Usage
//!
//! ```sh
//! morgengrau_events -o data/events.json
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Enumeration**: walk every calendar day and build its search URL
//! 2. **Fetching**: request the pages, 16 at a time by default
//! 3. **Extraction**: parse each page into an event, repairing mangled text
//! 4. **Output**: write the collected events as one JSON document
//!
//! Logs go to stderr; stdout carries the JSON document.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod accumulator;
mod cli;
mod crawl;
mod dates;
mod error;
mod extract;
mod models;
mod outputs;
mod scheduler;
mod search;
mod text;
mod utils;

use cli::Cli;
use error::CrawlError;
use outputs::json;
use scheduler::HttpFetcher;
use utils::ensure_writable_output;

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Crawl aborted");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> Result<(), CrawlError> {
    info!(version = env!("CARGO_PKG_VERSION"), "morgengrau_events starting up");

    // ---- Setup: everything that can fail before the first request ----
    let config = args.to_config()?;
    ensure_writable_output(&args.output).await?;
    let fetcher = HttpFetcher::new(config.timeout)?;
    info!(
        first = %config.days.start(),
        last = %config.days.end(),
        parallelism = config.parallelism,
        timeout_secs = config.timeout.as_secs(),
        on_malformed = ?config.on_malformed,
        "Configuration loaded"
    );

    // ---- Crawl ----
    let mut result = crawl::crawl(&config, fetcher).await?;
    if args.sort_by_date {
        result.events.sort_by_key(|event| event.day);
    }

    // ---- Output ----
    json::write_events(&result.events, &args.output).await?;

    crawl::log_stats(&result.stats);
    Ok(())
}
