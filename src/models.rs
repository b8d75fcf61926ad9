//! Data models for crawled listings and run statistics.
//!
//! - [`Event`]: one listing extracted from a day's search page
//! - [`CrawlStats`]: counters reported once the crawl finishes

use chrono::NaiveDate;
use serde::Serialize;
use std::time::Duration;

/// One listing extracted from a day's search page.
///
/// Serialized field order is fixed: `date`, `venue`, `genre`, `title`,
/// `text`, `link`. Fields whose source element is missing stay empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Listing date as `MM/DD/YYYY`.
    pub date: String,
    /// Location, first segment of the `venue | genre` line.
    pub venue: String,
    /// Style or category, second segment of the `venue | genre` line.
    pub genre: String,
    /// Title-cased event name.
    pub title: String,
    /// Description with every whitespace character removed.
    pub text: String,
    /// Absolute URL of the event detail page.
    pub link: String,
    /// Calendar day the page was requested for. Only used for sorting.
    #[serde(skip)]
    pub day: NaiveDate,
}

impl Event {
    /// An empty event for the requested `day`.
    pub fn new(day: NaiveDate) -> Self {
        Self {
            date: String::new(),
            venue: String::new(),
            genre: String::new(),
            title: String::new(),
            text: String::new(),
            link: String::new(),
            day,
        }
    }
}

/// Counters reported at the end of a crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub elapsed: Duration,
    /// Requests started, successful or not.
    pub requests: usize,
    /// Events accumulated.
    pub events: usize,
    /// Pages dropped by [`MalformedPolicy::Skip`](crate::crawl::MalformedPolicy::Skip).
    pub skipped: usize,
}
