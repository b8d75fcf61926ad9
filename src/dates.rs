//! Calendar enumeration for the crawl.
//!
//! The crawl visits every day from January 1st of the origin year through
//! December 31st of the final year, walking year → month → day.

use crate::error::CrawlError;
use chrono::{Datelike, NaiveDate};
use std::ops::RangeInclusive;

/// First year the event archive has listings for.
pub const ORIGIN_YEAR: i32 = 2004;

/// Number of days in `month` of `year`, leap years included.
///
/// Returns `0` for a month outside `1..=12`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .filter(|last| last.month() == month)
        .map_or(0, |last| last.day())
}

/// Inclusive day range covering whole years `origin..=through`.
pub fn year_span(origin: i32, through: i32) -> Result<RangeInclusive<NaiveDate>, CrawlError> {
    let range_error = || CrawlError::Range { origin, through };
    if origin > through {
        return Err(range_error());
    }
    let first = NaiveDate::from_ymd_opt(origin, 1, 1).ok_or_else(range_error)?;
    let last = NaiveDate::from_ymd_opt(through, 12, 31).ok_or_else(range_error)?;
    Ok(first..=last)
}

/// Lazy, one-shot iterator over every day of a range.
///
/// An inverted range yields nothing.
#[derive(Debug, Clone)]
pub struct DateCursor {
    year: i32,
    month: u32,
    day: u32,
    last: NaiveDate,
    done: bool,
}

impl DateCursor {
    pub fn new(days: &RangeInclusive<NaiveDate>) -> Self {
        let first = *days.start();
        Self {
            year: first.year(),
            month: first.month(),
            day: first.day(),
            last: *days.end(),
            done: first > *days.end(),
        }
    }

    fn current(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }

    fn advance(&mut self) {
        if self.day < days_in_month(self.year, self.month) {
            self.day += 1;
            return;
        }
        self.day = 1;
        if self.month == 12 {
            self.month = 1;
            self.year += 1;
        } else {
            self.month += 1;
        }
    }
}

impl Iterator for DateCursor {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if self.done {
            return None;
        }
        let Some(date) = self.current() else {
            self.done = true;
            return None;
        };
        if date >= self.last {
            self.done = true;
        } else {
            self.advance();
        }
        Some(date)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match (self.done, self.current()) {
            (false, Some(date)) => usize::try_from((self.last - date).num_days() + 1).unwrap_or(0),
            _ => 0,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DateCursor {}
