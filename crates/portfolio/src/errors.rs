//! Error types for portfolio operations.

use folioview_market_data::MarketDataError;
use thiserror::Error;

/// Errors that can occur while reading or assembling the portfolio.
#[derive(Error, Debug)]
pub enum PortfolioError {
    /// No holding exists under the requested id.
    #[error("Holding not found: {0}")]
    NotFound(String),

    /// The caller supplied an invalid holding.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The market data layer rejected the symbol batch.
    #[error(transparent)]
    MarketData(#[from] MarketDataError),
}
