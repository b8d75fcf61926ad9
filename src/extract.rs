//! Turns one day's search result page into an [`Event`].
//!
//! # Page layout
//!
//! | Selector | Field |
//! |----------|-------|
//! | `font` | info line: `Events am <date>:` or the "nichts gefunden" notice |
//! | `a.event_title` | `title` |
//! | `span.event_dates` | `venue \| genre` |
//! | `td.event_text` | `text` |
//! | `a[href].event` | `link` |
//!
//! A page yields at most one event. When a selector matches several
//! elements the last one wins, mirroring how the archive has always been
//! exported.

use crate::error::ExtractError;
use crate::models::Event;
use crate::text;
use crate::utils::truncate_for_log;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

/// Notice shown instead of listings when a day has no events.
pub const NOTHING_FOUND: &str = "nichts gefunden";

const LABEL_PREFIX: &str = "Events am ";
const LABEL_SUFFIX: &str = ":";

/// Base that relative detail links resolve against.
const SITE_BASE: &str = "https://morgengrau.net/cgi-bin/morgengrau/";

const GERMAN_MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "mai", "jun", "jul", "aug", "sep", "okt", "nov", "dez",
];

static INFO: Lazy<Selector> = Lazy::new(|| Selector::parse("font").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("a.event_title").unwrap());
static VENUE_GENRE: Lazy<Selector> = Lazy::new(|| Selector::parse("span.event_dates").unwrap());
static DESCRIPTION: Lazy<Selector> = Lazy::new(|| Selector::parse("td.event_text").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href].event").unwrap());

/// Extract the event listed on a search result page.
///
/// # Arguments
///
/// * `html` - Page body as fetched
/// * `day` - Calendar day the page was requested for, kept as the sort key
///
/// # Returns
///
/// `Ok(None)` when the page carries the [`NOTHING_FOUND`] notice, otherwise
/// the event with absent fields left empty.
///
/// # Errors
///
/// [`ExtractError::VenueGenreFormat`] when the venue/genre line has no `|`.
#[instrument(level = "debug", skip_all, fields(%day))]
pub fn extract_event(html: &str, day: NaiveDate) -> Result<Option<Event>, ExtractError> {
    let document = Html::parse_document(html);

    let info = text::trim(&text::normalize(&collect_text(&document, &INFO)));
    if info.contains(NOTHING_FOUND) {
        return Ok(None);
    }

    let mut event = Event::new(day);

    let label = info.strip_prefix(LABEL_PREFIX).unwrap_or(&info);
    let label = label.strip_suffix(LABEL_SUFFIX).unwrap_or(label);
    event.date = match parse_date_label(label) {
        Some(date) => date.format("%m/%d/%Y").to_string(),
        None => label.to_string(),
    };

    let mut titles: Vec<String> = document
        .select(&TITLE)
        .map(|el| text::title(&element_text(el)))
        .collect();
    if titles.len() > 1 {
        debug!(count = titles.len(), "Several titles on one page; keeping the last");
    }
    if let Some(title) = titles.pop() {
        event.title = title;
    }

    for el in document.select(&VENUE_GENRE) {
        let (venue, genre) = split_venue_genre(&element_text(el))?;
        event.venue = venue;
        event.genre = genre;
    }

    event.text = text::strip_whitespace(&collect_text(&document, &DESCRIPTION));

    if let Some(href) = document
        .select(&LINK)
        .filter_map(|el| el.value().attr("href"))
        .last()
    {
        event.link = resolve_link(href);
    }

    Ok(Some(event))
}

/// Split a `venue | genre` line into its trimmed, repaired halves.
///
/// Segments past the second are ignored.
pub fn split_venue_genre(raw: &str) -> Result<(String, String), ExtractError> {
    let decoded = text::normalize(raw);
    let mut segments = decoded.split('|');
    match (segments.next(), segments.next()) {
        (Some(venue), Some(genre)) => Ok((text::trim(venue), text::trim(genre))),
        _ => Err(ExtractError::VenueGenreFormat {
            preview: truncate_for_log(raw.trim(), 80),
        }),
    }
}

/// Parse labels such as `28.02.2024` or `Freitag, 17. März 2023`.
fn parse_date_label(label: &str) -> Option<NaiveDate> {
    let date_part = label.rsplit(',').next()?.trim();
    if let Ok(date) = NaiveDate::parse_from_str(date_part, "%d.%m.%Y") {
        return Some(date);
    }

    let mut parts = date_part.split_whitespace();
    let day: u32 = parts.next()?.trim_end_matches('.').parse().ok()?;
    let month = german_month(parts.next()?)?;
    let year: i32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

fn german_month(name: &str) -> Option<u32> {
    let name = text::decode(name).to_lowercase();
    if name == "mrz" {
        return Some(3);
    }
    GERMAN_MONTHS
        .iter()
        .position(|prefix| name.starts_with(prefix))
        .and_then(|i| u32::try_from(i + 1).ok())
}

/// Make a detail link absolute.
///
/// Absolute links are kept untouched so the repair table cannot prefix them twice.
fn resolve_link(href: &str) -> String {
    if Url::parse(href).is_ok() {
        return href.to_string();
    }
    let repaired = text::repair(href);
    if Url::parse(&repaired).is_ok() {
        return repaired;
    }
    Url::parse(SITE_BASE)
        .and_then(|base| base.join(&repaired))
        .map(|url| url.to_string())
        .unwrap_or(repaired)
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Text of every element matching `selector`, concatenated and trimmed.
fn collect_text(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .flat_map(|el| el.text())
        .collect::<String>()
        .trim()
        .to_string()
}
