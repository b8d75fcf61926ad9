//! Single-owner collection of extracted events.
//!
//! Workers never touch the event list directly. Each holds an [`EventSink`]
//! and sends finished events over a bounded channel to one collector task,
//! which is the only owner of the `Vec`.

use crate::error::CrawlError;
use crate::models::Event;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Upper bound on queued events, whatever buffer is requested.
const MAX_BUFFER: usize = 4096;

/// Sending half handed to crawl workers.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<Event>,
}

impl EventSink {
    /// Queue an event for the collector, waiting while its buffer is full.
    pub async fn push(&self, event: Event) -> Result<(), CrawlError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| CrawlError::Collector("event channel closed".into()))
    }
}

/// Collector task plus the sink it listens on.
#[derive(Debug)]
pub struct Accumulator {
    sink: EventSink,
    handle: JoinHandle<Vec<Event>>,
}

impl Accumulator {
    /// Spawn the collector with room for `buffer` queued events, clamped to
    /// `1..=MAX_BUFFER`.
    pub fn spawn(buffer: usize) -> Self {
        let (tx, rx) = mpsc::channel(buffer.clamp(1, MAX_BUFFER));
        let handle = tokio::spawn(collect_events(rx));
        Self {
            sink: EventSink { tx },
            handle,
        }
    }

    /// A new sending handle for a worker.
    pub fn sink(&self) -> EventSink {
        self.sink.clone()
    }

    /// Close the channel and return everything collected, in arrival order.
    ///
    /// Only completes once every [`EventSink`] handed out has been dropped.
    pub async fn finish(self) -> Result<Vec<Event>, CrawlError> {
        drop(self.sink);
        Ok(self.handle.await?)
    }
}

async fn collect_events(mut rx: mpsc::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
        debug!(count = events.len(), "Collected event");
    }
    info!(count = events.len(), "Event collector finished");
    events
}
