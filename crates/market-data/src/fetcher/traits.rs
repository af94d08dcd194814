//! Fetcher trait definition.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::models::SecondaryMetrics;

/// Trait for per-symbol market data acquisition.
///
/// Implement this trait to add a new upstream stack. The coordinator calls
/// both methods concurrently for each symbol and treats any `Err` as a
/// retryable failure of the whole attempt.
#[async_trait]
pub trait MarketDataFetcher: Send + Sync {
    /// Fetch the current market price for `symbol`.
    ///
    /// Returns `Ok(None)` when the source answered but the payload carried
    /// no price. Non-success statuses, transport errors, timeouts and
    /// undecodable payloads fail with a [`MarketDataError`].
    async fn fetch_price(&self, symbol: &str) -> Result<Option<Decimal>, MarketDataError>;

    /// Fetch secondary valuation metrics for `symbol`.
    ///
    /// Absence of a metric after all sources were consulted is not an
    /// error: implementations return empty [`SecondaryMetrics`] instead.
    async fn fetch_secondary_metrics(
        &self,
        symbol: &str,
    ) -> Result<SecondaryMetrics, MarketDataError>;
}
