//! Command-line interface definitions for the morgengrau crawler.
//!
//! Every option can be given as a flag, and the ones that vary between
//! deployments can also come from environment variables.

use crate::crawl::{CrawlConfig, MalformedPolicy};
use crate::dates::{ORIGIN_YEAR, year_span};
use crate::error::CrawlError;
use crate::search::{DEFAULT_SEARCH_URL, SearchEndpoint};
use chrono::{Datelike, Local};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Crawl the morgengrau.net event calendar one day at a time.
///
/// # Examples
///
/// ```sh
/// # Whole archive with the defaults
/// morgengrau_events
///
/// # A single year, gentler on the server, sorted output
/// morgengrau_events --from-year 2023 --to-year 2023 -p 4 --sort-by-date
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// JSON file receiving the crawled events
    #[arg(short, long, env = "EVENTS_OUTPUT", default_value = "data/events.json")]
    pub output: PathBuf,

    /// Search endpoint, queried once per calendar day
    #[arg(long, env = "SEARCH_URL", default_value = DEFAULT_SEARCH_URL)]
    pub search_url: String,

    /// First year to crawl
    #[arg(long, default_value_t = ORIGIN_YEAR)]
    pub from_year: i32,

    /// Last year to crawl (defaults to the current year)
    #[arg(long)]
    pub to_year: Option<i32>,

    /// Maximum number of requests in flight
    #[arg(short, long, env = "CRAWL_PARALLELISM", default_value_t = 16)]
    pub parallelism: usize,

    /// Per-request timeout in seconds
    #[arg(long, env = "CRAWL_TIMEOUT_SECS", default_value_t = 120)]
    pub timeout_secs: u64,

    /// Maximum number of requests a single crawl may enqueue
    #[arg(long, default_value_t = 10_000)]
    pub queue_capacity: usize,

    /// What to do with pages whose venue/genre line is malformed
    #[arg(long, value_enum, default_value_t = MalformedPolicy::Abort)]
    pub on_malformed: MalformedPolicy,

    /// Sort events by date before writing instead of keeping completion order
    #[arg(long)]
    pub sort_by_date: bool,
}

impl Cli {
    /// Validate the arguments into a [`CrawlConfig`].
    pub fn to_config(&self) -> Result<CrawlConfig, CrawlError> {
        let through = self.to_year.unwrap_or_else(|| Local::now().year());
        if self.parallelism == 0 {
            return Err(CrawlError::Config("parallelism must be at least 1".into()));
        }
        if self.timeout_secs == 0 {
            return Err(CrawlError::Config("timeout must be at least 1 second".into()));
        }
        Ok(CrawlConfig {
            endpoint: SearchEndpoint::parse(&self.search_url)?,
            days: year_span(self.from_year, through)?,
            parallelism: self.parallelism,
            timeout: Duration::from_secs(self.timeout_secs),
            queue_capacity: self.queue_capacity,
            on_malformed: self.on_malformed,
        })
    }
}
