//! Bounded-concurrency page fetching.
//!
//! # Architecture
//!
//! - [`PageFetcher`]: trait for fetching one page body
//! - [`HttpFetcher`]: `reqwest` implementation with a per-request timeout
//! - [`Scheduler`]: drives a request sequence through a fetcher with at most
//!   `parallelism` requests in flight
//!
//! # Failure Model
//!
//! There are no retries. The first fetch or handler error stops the run and
//! drops every request still in flight.

use crate::error::{CrawlError, FetchError};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};
use url::Url;

/// Trait for fetching a page body.
///
/// This is the seam between scheduling and transport; tests plug in
/// in-memory sites here.
pub trait PageFetcher {
    /// Fetch `url` and return its body as text.
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

/// [`PageFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a client whose requests each time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(CrawlError::HttpClient)?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        Ok(response.text().await?)
    }
}

/// A fetched page, tagged with the day it was requested for.
#[derive(Debug, Clone)]
pub struct Page {
    pub day: NaiveDate,
    pub url: Url,
    pub body: String,
}

/// Fetches a finite request sequence with bounded parallelism.
#[derive(Debug)]
pub struct Scheduler<F> {
    fetcher: F,
    parallelism: usize,
    queue_capacity: usize,
}

impl<F: PageFetcher> Scheduler<F> {
    /// # Errors
    ///
    /// [`CrawlError::Config`] if `parallelism` or `queue_capacity` is zero.
    pub fn new(fetcher: F, parallelism: usize, queue_capacity: usize) -> Result<Self, CrawlError> {
        if parallelism == 0 {
            return Err(CrawlError::Config("parallelism must be at least 1".into()));
        }
        if queue_capacity == 0 {
            return Err(CrawlError::Config("queue capacity must be at least 1".into()));
        }
        Ok(Self {
            fetcher,
            parallelism,
            queue_capacity,
        })
    }

    /// Fetch every request once and hand each page to `handler`.
    ///
    /// The handler runs inside the worker that fetched the page, so handlers
    /// for different pages run concurrently. Blocks until every request has
    /// been handled or the first error occurs.
    ///
    /// # Returns
    ///
    /// The number of requests started.
    ///
    /// # Errors
    ///
    /// - [`CrawlError::QueueOverflow`] before any request if the sequence is
    ///   longer than the queue capacity
    /// - [`CrawlError::Fetch`] for the first failed request
    /// - whatever the handler returns
    #[instrument(level = "info", skip_all, fields(parallelism = self.parallelism))]
    pub async fn run<I, H, Fut>(&self, requests: I, handler: H) -> Result<usize, CrawlError>
    where
        I: IntoIterator<Item = (NaiveDate, Url)>,
        I::IntoIter: ExactSizeIterator,
        H: Fn(Page) -> Fut,
        Fut: Future<Output = Result<(), CrawlError>>,
    {
        let requests = requests.into_iter();
        let queued = requests.len();
        if queued > self.queue_capacity {
            return Err(CrawlError::QueueOverflow {
                requested: queued,
                capacity: self.queue_capacity,
            });
        }
        info!(queued, "Starting scheduler");

        let started = AtomicUsize::new(0);
        let fetcher = &self.fetcher;
        let handler = &handler;
        let started_ref = &started;

        let mut pending = stream::iter(requests)
            .map(|(day, url)| async move {
                info!(url = %url, "visiting");
                started_ref.fetch_add(1, Ordering::Relaxed);

                let t0 = Instant::now();
                let body = fetcher
                    .fetch(&url)
                    .await
                    .map_err(|source| CrawlError::Fetch {
                        url: url.to_string(),
                        source,
                    })?;
                info!(
                    url = %url,
                    bytes = body.len(),
                    elapsed_ms = t0.elapsed().as_millis(),
                    "response from"
                );

                handler(Page { day, url, body }).await
            })
            .buffer_unordered(self.parallelism);

        while let Some(outcome) = pending.next().await {
            outcome?;
        }
        drop(pending);

        let started = started.into_inner();
        debug!(started, "Scheduler drained");
        Ok(started)
    }
}
