//! Data ingestion: providers, response cache, cached fetch.

pub mod cache;
pub mod fetch;
pub mod provider;

pub use cache::ResponseCache;
pub use fetch::BarFetcher;
pub use provider::{AggregateBarsRequest, BarProvider, DataError, PolygonProvider};
