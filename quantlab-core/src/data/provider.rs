//! Bar data providers: URL building and response parsing per vendor.
//!
//! A provider knows two things about its vendor: how to build the aggregate
//! bars URL and how to turn the JSON body into `Bar`s. Transport and caching
//! live in `fetch` and `cache`; providers never touch the network.

use crate::domain::{Bar, Money};
use serde::Deserialize;
use thiserror::Error;

/// Structured errors from the data layer.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("http request failed: {0}")]
    Http(String),

    #[error("provider returned status {status} for {url}")]
    BadStatus { status: u16, url: String },

    #[error("failed to parse response for {symbol}: {detail}")]
    ResponseFormat { symbol: String, detail: String },

    #[error("no results for symbol '{symbol}'")]
    EmptyResults { symbol: String },

    #[error("cache error: {0}")]
    Cache(String),
}

/// Parameters for an aggregate-bars request.
#[derive(Debug, Clone)]
pub struct AggregateBarsRequest {
    pub symbol: String,
    pub timespan: u32,
    pub timespan_unit: String,
    /// ISO-8601 date, inclusive.
    pub from: String,
    /// ISO-8601 date, inclusive.
    pub to: String,
}

/// A bar-data vendor.
pub trait BarProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Full request URL for an aggregate-bars query.
    fn aggregate_bars_url(&self, request: &AggregateBarsRequest) -> String;

    /// Extra request headers, typically authorization.
    fn headers(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Parse a response body into chronological bars.
    fn parse_aggregate_bars(&self, symbol: &str, body: &str) -> Result<Vec<Bar>, DataError>;
}

/// Polygon.io aggregates endpoint.
pub struct PolygonProvider {
    base_url: String,
    api_key: String,
}

impl PolygonProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: "https://api.polygon.io".into(),
            api_key: api_key.into(),
        }
    }

    /// Point at a non-production host (tests).
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PolygonAggsResponse {
    #[serde(default)]
    results: Vec<PolygonAggBar>,
}

#[derive(Debug, Deserialize)]
struct PolygonAggBar {
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: f64,
    /// Bar start, unix milliseconds.
    t: i64,
}

impl BarProvider for PolygonProvider {
    fn name(&self) -> &str {
        "polygon"
    }

    fn aggregate_bars_url(&self, request: &AggregateBarsRequest) -> String {
        format!(
            "{}/v2/aggs/ticker/{}/range/{}/{}/{}/{}",
            self.base_url,
            request.symbol,
            request.timespan,
            request.timespan_unit,
            request.from,
            request.to
        )
    }

    fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("Authorization".into(), format!("Bearer {}", self.api_key)),
            ("Accept".into(), "application/json".into()),
        ]
    }

    fn parse_aggregate_bars(&self, symbol: &str, body: &str) -> Result<Vec<Bar>, DataError> {
        let parsed: PolygonAggsResponse =
            serde_json::from_str(body).map_err(|e| DataError::ResponseFormat {
                symbol: symbol.to_string(),
                detail: e.to_string(),
            })?;
        if parsed.results.is_empty() {
            return Err(DataError::EmptyResults {
                symbol: symbol.to_string(),
            });
        }

        Ok(parsed
            .results
            .into_iter()
            .map(|raw| Bar {
                symbol: symbol.to_string(),
                unix_ts_ns: raw.t * 1_000_000,
                open: Money::from_f64(raw.o),
                high: Money::from_f64(raw.h),
                low: Money::from_f64(raw.l),
                close: Money::from_f64(raw.c),
                volume: raw.v,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encodes_range_parameters() {
        let provider = PolygonProvider::new("key");
        let url = provider.aggregate_bars_url(&AggregateBarsRequest {
            symbol: "SPY".into(),
            timespan: 1,
            timespan_unit: "day".into(),
            from: "2024-01-01".into(),
            to: "2024-06-30".into(),
        });
        assert_eq!(
            url,
            "https://api.polygon.io/v2/aggs/ticker/SPY/range/1/day/2024-01-01/2024-06-30"
        );
    }

    #[test]
    fn parses_aggregate_response() {
        let provider = PolygonProvider::new("key");
        let body = r#"{
            "ticker": "SPY",
            "resultsCount": 2,
            "results": [
                {"o": 100.5, "h": 101.0, "l": 99.5, "c": 100.75, "v": 12345.0, "t": 1704067200000},
                {"o": 100.75, "h": 102.0, "l": 100.0, "c": 101.5, "v": 23456.0, "t": 1704153600000}
            ]
        }"#;
        let bars = provider.parse_aggregate_bars("SPY", body).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, Money::from_f64(100.75));
        assert_eq!(bars[0].unix_ts_ns, 1_704_067_200_000_000_000);
        assert_eq!(bars[1].volume, 23456.0);
    }

    #[test]
    fn empty_results_is_an_error() {
        let provider = PolygonProvider::new("key");
        let err = provider
            .parse_aggregate_bars("SPY", r#"{"results": []}"#)
            .unwrap_err();
        assert!(matches!(err, DataError::EmptyResults { .. }));
    }

    #[test]
    fn malformed_body_is_a_format_error() {
        let provider = PolygonProvider::new("key");
        let err = provider.parse_aggregate_bars("SPY", "not json").unwrap_err();
        assert!(matches!(err, DataError::ResponseFormat { .. }));
    }
}
