//! Cached bar fetching: cache probe, HTTP GET on miss, parse.

use super::cache::ResponseCache;
use super::provider::{AggregateBarsRequest, BarProvider, DataError};
use crate::domain::Bar;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches aggregate bars through the response cache.
pub struct BarFetcher<'a> {
    client: reqwest::blocking::Client,
    provider: &'a dyn BarProvider,
    cache: &'a ResponseCache,
}

impl<'a> BarFetcher<'a> {
    pub fn new(provider: &'a dyn BarProvider, cache: &'a ResponseCache) -> Self {
        Self {
            client: reqwest::blocking::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("default client config"),
            provider,
            cache,
        }
    }

    /// Fetch bars for one request, preferring the cache. Network responses
    /// are cached before parsing so a parse failure can be retried offline.
    pub fn fetch(&self, request: &AggregateBarsRequest) -> Result<Vec<Bar>, DataError> {
        let url = self.provider.aggregate_bars_url(request);

        if let Some(body) = self.cache.probe(&url) {
            tracing::debug!(symbol = %request.symbol, "cache hit");
            return self.provider.parse_aggregate_bars(&request.symbol, &body);
        }

        tracing::info!(symbol = %request.symbol, provider = %self.provider.name(), "fetching bars");
        let mut http_request = self.client.get(&url);
        for (name, value) in self.provider.headers() {
            http_request = http_request.header(&name, &value);
        }
        let response = http_request
            .send()
            .map_err(|e| DataError::Http(e.to_string()))?;

        let status = response.status();
        let body = response.text().map_err(|e| DataError::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(DataError::BadStatus {
                status: status.as_u16(),
                url,
            });
        }

        self.cache.store(&url, status.as_u16(), &body)?;
        self.provider.parse_aggregate_bars(&request.symbol, &body)
    }
}
