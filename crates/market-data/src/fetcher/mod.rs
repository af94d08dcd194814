//! Upstream market data acquisition.
//!
//! The [`MarketDataFetcher`] trait is the seam between the coordinator and
//! the outside world: one implementation talks HTTP to the real sources,
//! tests substitute their own. The HTML-scraping fallback lives behind the
//! same seam so it can be swapped or removed without touching the
//! coordinator.

mod http;
mod traits;

pub use http::{FetcherConfig, HttpFetcher};
pub use traits::MarketDataFetcher;
