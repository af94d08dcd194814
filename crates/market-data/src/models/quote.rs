//! Quote models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Secondary valuation metrics for a symbol.
///
/// Produced by the secondary-metrics path of the fetcher. Both fields are
/// independently optional: absence after all sources have been consulted
/// is a valid value, not a failure.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SecondaryMetrics {
    /// Price-to-earnings ratio, if any source had one.
    pub pe_ratio: Option<Decimal>,
    /// Latest earnings date as reported, e.g. "Jul 24, 2025".
    pub latest_earnings: Option<String>,
}

/// Market data for a single symbol, immutable once produced.
///
/// Fields are independently nullable: a quote with `error` set may still
/// carry partial data, and a quote without `error` may be missing metrics
/// that no source could provide.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockQuote {
    /// Uppercase ticker symbol, the lookup key.
    pub symbol: String,
    /// Current market price. Absent when the price source failed or the
    /// payload lacked one.
    pub price: Option<Decimal>,
    /// Price-to-earnings ratio from the secondary sources.
    pub pe_ratio: Option<Decimal>,
    /// Latest earnings date text from the secondary sources.
    pub latest_earnings: Option<String>,
    /// When this value was produced.
    pub fetched_at: DateTime<Utc>,
    /// Last failure reason, set once the retry budget is exhausted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StockQuote {
    /// Build a quote from a resolved fetch.
    pub fn new(symbol: String, price: Option<Decimal>, metrics: SecondaryMetrics) -> Self {
        Self {
            symbol,
            price,
            pe_ratio: metrics.pe_ratio,
            latest_earnings: metrics.latest_earnings,
            fetched_at: Utc::now(),
            error: None,
        }
    }

    /// Build the all-null quote recorded after retries are exhausted.
    pub fn failed(symbol: String, error: String) -> Self {
        Self {
            symbol,
            price: None,
            pe_ratio: None,
            latest_earnings: None,
            fetched_at: Utc::now(),
            error: Some(error),
        }
    }

    /// Whether this quote records an exhausted fetch rather than data.
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}
