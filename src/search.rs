//! Builds the per-day search URLs.

use crate::dates::DateCursor;
use crate::error::CrawlError;
use chrono::{Datelike, NaiveDate};
use url::Url;

/// Date search endpoint, with the static form parameters already attached.
pub const DEFAULT_SEARCH_URL: &str = "https://www.morgengrau.net/cgi-bin/morgengrau/event_suche_action.pl?datumundzeit=event_such_form.pl&query=date&datesearch=1";

const DATE_PARAMS: [&str; 3] = ["year", "month", "day"];

/// A validated search endpoint that stamps a calendar day onto its query.
#[derive(Debug, Clone)]
pub struct SearchEndpoint {
    base: Url,
}

impl SearchEndpoint {
    /// Parse and validate the base endpoint.
    ///
    /// The URL must be absolute and use `http` or `https`. Any `year`,
    /// `month` or `day` parameters already on it are discarded.
    pub fn parse(base: &str) -> Result<Self, CrawlError> {
        let invalid = |reason: String| CrawlError::Endpoint {
            url: base.to_string(),
            reason,
        };

        let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }

        let static_params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !DATE_PARAMS.contains(&&**key))
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        url.set_query(None);
        if !static_params.is_empty() {
            url.query_pairs_mut().extend_pairs(static_params);
        }

        Ok(Self { base: url })
    }

    /// The search URL for a single day.
    pub fn for_day(&self, date: NaiveDate) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("year", &date.year().to_string())
            .append_pair("month", &date.month().to_string())
            .append_pair("day", &date.day().to_string());
        url
    }

    /// Pair every day of `cursor` with its search URL.
    pub fn requests(
        &self,
        cursor: DateCursor,
    ) -> impl ExactSizeIterator<Item = (NaiveDate, Url)> + '_ {
        cursor.map(move |date| (date, self.for_day(date)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::year_span;

    fn pairs(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_for_day_sets_date_params() {
        let endpoint = SearchEndpoint::parse(DEFAULT_SEARCH_URL).unwrap();
        let url = endpoint.for_day(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        assert_eq!(url.host_str(), Some("www.morgengrau.net"));
        assert_eq!(url.path(), "/cgi-bin/morgengrau/event_suche_action.pl");
        let expected: Vec<(String, String)> = [
            ("datumundzeit", "event_such_form.pl"),
            ("query", "date"),
            ("datesearch", "1"),
            ("year", "2024"),
            ("month", "2"),
            ("day", "29"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(pairs(&url), expected);
    }

    #[test]
    fn test_stale_date_params_are_replaced() {
        let endpoint =
            SearchEndpoint::parse("http://localhost/search?query=date&day=3&year=1999").unwrap();
        let url = endpoint.for_day(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());

        let days: Vec<_> = pairs(&url).into_iter().filter(|(k, _)| k == "day").collect();
        assert_eq!(days, [("day".to_string(), "31".to_string())]);
        assert!(url.as_str().contains("year=2023"));
        assert!(!url.as_str().contains("1999"));
    }

    #[test]
    fn test_rejects_bad_endpoints() {
        assert!(matches!(
            SearchEndpoint::parse("not a url"),
            Err(CrawlError::Endpoint { .. })
        ));
        assert!(matches!(
            SearchEndpoint::parse("ftp://example.com/search"),
            Err(CrawlError::Endpoint { .. })
        ));
    }

    #[test]
    fn test_requests_cover_the_cursor() {
        let endpoint = SearchEndpoint::parse(DEFAULT_SEARCH_URL).unwrap();
        let requests = endpoint.requests(DateCursor::new(&year_span(2023, 2024).unwrap()));

        assert_eq!(requests.len(), 365 + 366);
        let urls: std::collections::HashSet<String> =
            requests.map(|(_, url)| url.to_string()).collect();
        assert_eq!(urls.len(), 365 + 366);
    }
}
