//! The crawl pipeline, end to end.
//!
//! ```text
//! DateCursor → SearchEndpoint → Scheduler ─┬─ worker: fetch → extract_event ─┐
//!                                          ├─ worker: fetch → extract_event ─┼→ Accumulator
//!                                          └─ ...                            ┘
//! ```
//!
//! Every error stops the crawl, except malformed pages when the
//! [`MalformedPolicy`] says to skip them.

use crate::accumulator::{Accumulator, EventSink};
use crate::dates::DateCursor;
use crate::error::CrawlError;
use crate::extract::extract_event;
use crate::models::{CrawlStats, Event};
use crate::scheduler::{Page, PageFetcher, Scheduler};
use crate::search::SearchEndpoint;
use crate::text::REPAIRS;
use chrono::NaiveDate;
use clap::ValueEnum;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// What to do with a page whose markup does not match the expected layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum MalformedPolicy {
    /// Fail the whole crawl.
    #[default]
    Abort,
    /// Log a warning and drop the page.
    Skip,
}

/// Everything a crawl run needs.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub endpoint: SearchEndpoint,
    pub days: RangeInclusive<NaiveDate>,
    pub parallelism: usize,
    /// Applied to each request, not to the crawl as a whole.
    pub timeout: Duration,
    pub queue_capacity: usize,
    pub on_malformed: MalformedPolicy,
}

/// Result of a finished crawl.
#[derive(Debug)]
pub struct Crawl {
    /// Events in completion order.
    pub events: Vec<Event>,
    pub stats: CrawlStats,
}

/// Crawl every day in `config.days` through `fetcher`.
///
/// # Errors
///
/// Setup errors before the first request, then the first fetch error, or
/// the first malformed page under [`MalformedPolicy::Abort`].
#[instrument(level = "info", skip_all, fields(first = %config.days.start(), last = %config.days.end()))]
pub async fn crawl<F: PageFetcher>(config: &CrawlConfig, fetcher: F) -> Result<Crawl, CrawlError> {
    let t0 = Instant::now();
    info!(repair_table = REPAIRS.version, "Starting crawl");
    let scheduler = Scheduler::new(fetcher, config.parallelism, config.queue_capacity)?;
    let requests = config.endpoint.requests(DateCursor::new(&config.days));

    let accumulator = Accumulator::spawn(config.parallelism.saturating_mul(2));
    let sink = accumulator.sink();
    let skipped = AtomicUsize::new(0);
    let policy = config.on_malformed;

    let outcome = scheduler
        .run(requests, |page| handle_page(page, policy, &sink, &skipped))
        .await;
    drop(sink);

    let requests = outcome?;
    let events = accumulator.finish().await?;

    let stats = CrawlStats {
        elapsed: t0.elapsed(),
        requests,
        events: events.len(),
        skipped: skipped.into_inner(),
    };
    Ok(Crawl { events, stats })
}

async fn handle_page(
    page: Page,
    policy: MalformedPolicy,
    sink: &EventSink,
    skipped: &AtomicUsize,
) -> Result<(), CrawlError> {
    let extracted = extract_event(&page.body, page.day);
    match (extracted, policy) {
        (Ok(Some(event)), _) => sink.push(event).await,
        (Ok(None), _) => {
            debug!(url = %page.url, "Nothing found");
            Ok(())
        }
        (Err(source), MalformedPolicy::Abort) => Err(CrawlError::Extract {
            url: page.url.to_string(),
            source,
        }),
        (Err(e), MalformedPolicy::Skip) => {
            skipped.fetch_add(1, Ordering::Relaxed);
            warn!(url = %page.url, error = %e, "Skipping malformed page");
            Ok(())
        }
    }
}

/// Log the closing statistics of a run.
pub fn log_stats(stats: &CrawlStats) {
    let elapsed = stats.elapsed;
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        requests = stats.requests,
        events = stats.events,
        skipped = stats.skipped,
        "Crawl complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::search::DEFAULT_SEARCH_URL;
    use std::collections::HashMap;
    use url::Url;

    const LISTING: &str = r#"<html><body>
        <font>Events am 28.02.2024:</font>
        <a class="event_title" href="/termine">sommer nacht</a>
        <span class="event_dates">Club X | Concert</span>
        <table><tr><td class="event_text">Doors  open at 8</td></tr></table>
        <a class="event" href="show_event.pl?sts=det&amp;id=42">mehr</a>
    </body></html>"#;

    const NOTHING: &str =
        "<html><body><font>Zu diesem Datum wurde nichts gefunden.</font></body></html>";

    const MALFORMED: &str = r#"<html><body>
        <font>Events am 27.02.2024:</font>
        <span class="event_dates">Club X without genre</span>
    </body></html>"#;

    /// In-memory site keyed by the `day` query parameter.
    struct StaticSite {
        pages: HashMap<u32, &'static str>,
        broken_day: Option<u32>,
    }

    impl StaticSite {
        fn new(pages: &[(u32, &'static str)]) -> Self {
            Self {
                pages: pages.iter().copied().collect(),
                broken_day: None,
            }
        }
    }

    impl PageFetcher for StaticSite {
        async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
            let day: u32 = url
                .query_pairs()
                .find(|(key, _)| key == "day")
                .and_then(|(_, value)| value.parse().ok())
                .unwrap_or_default();
            if self.broken_day == Some(day) {
                return Err(FetchError::Status(reqwest::StatusCode::BAD_GATEWAY));
            }
            match self.pages.get(&day) {
                Some(body) => Ok(body.to_string()),
                None => Err(FetchError::Status(reqwest::StatusCode::NOT_FOUND)),
            }
        }
    }

    fn config(first: u32, last: u32, on_malformed: MalformedPolicy) -> CrawlConfig {
        CrawlConfig {
            endpoint: SearchEndpoint::parse(DEFAULT_SEARCH_URL).unwrap(),
            days: NaiveDate::from_ymd_opt(2024, 2, first).unwrap()
                ..=NaiveDate::from_ymd_opt(2024, 2, last).unwrap(),
            parallelism: 4,
            timeout: Duration::from_secs(5),
            queue_capacity: 100,
            on_malformed,
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_one_result_day_and_one_empty_day() {
        let site = StaticSite::new(&[(28, LISTING), (29, NOTHING)]);

        let crawl = crawl(&config(28, 29, MalformedPolicy::Abort), site)
            .await
            .unwrap();

        assert_eq!(crawl.events.len(), 1);
        assert_eq!(crawl.stats.requests, 2);
        assert_eq!(crawl.stats.events, 1);
        assert_eq!(crawl.stats.skipped, 0);

        let event = &crawl.events[0];
        for field in [
            &event.date,
            &event.venue,
            &event.genre,
            &event.title,
            &event.text,
            &event.link,
        ] {
            assert!(!field.is_empty());
        }
        assert_eq!(event.date, "02/28/2024");
        assert_eq!(event.text, "Doorsopenat8");
    }

    #[test_log::test(tokio::test)]
    async fn test_fetch_failure_aborts_crawl() {
        let mut site = StaticSite::new(&[(27, LISTING), (28, LISTING), (29, NOTHING)]);
        site.broken_day = Some(28);

        let err = crawl(&config(27, 29, MalformedPolicy::Abort), site)
            .await
            .unwrap_err();

        assert!(matches!(err, CrawlError::Fetch { .. }));
    }

    #[test_log::test(tokio::test)]
    async fn test_malformed_page_aborts_by_default() {
        let site = StaticSite::new(&[(27, MALFORMED), (28, LISTING)]);

        let err = crawl(&config(27, 28, MalformedPolicy::default()), site)
            .await
            .unwrap_err();

        assert!(matches!(err, CrawlError::Extract { ref url, .. } if url.contains("day=27")));
    }

    #[test_log::test(tokio::test)]
    async fn test_malformed_page_is_skipped_when_asked() {
        let site = StaticSite::new(&[(27, MALFORMED), (28, LISTING), (29, NOTHING)]);

        let crawl = crawl(&config(27, 29, MalformedPolicy::Skip), site)
            .await
            .unwrap();

        assert_eq!(crawl.events.len(), 1);
        assert_eq!(crawl.stats.requests, 3);
        assert_eq!(crawl.stats.skipped, 1);
    }

    #[tokio::test]
    async fn test_queue_overflow_is_a_setup_error() {
        let site = StaticSite::new(&[(28, LISTING), (29, NOTHING)]);
        let mut config = config(28, 29, MalformedPolicy::Abort);
        config.queue_capacity = 1;

        let err = crawl(&config, site).await.unwrap_err();

        assert!(matches!(err, CrawlError::QueueOverflow { requested: 2, capacity: 1 }));
    }
}
