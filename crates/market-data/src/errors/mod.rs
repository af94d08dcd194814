//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all market data operations
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur during market data operations.
///
/// Each variant is classified into a [`RetryClass`] via the
/// [`retry_class`](Self::retry_class) method, which determines how the
/// coordinator should handle the error.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The request to an upstream source timed out.
    /// The in-flight call is cancelled and the attempt retried with backoff.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The upstream source that timed out
        provider: String,
    },

    /// An upstream source answered with a non-success HTTP status.
    #[error("Upstream {provider} returned status {status}")]
    UpstreamStatus {
        /// The upstream source that returned the status
        provider: String,
        /// The HTTP status code
        status: u16,
    },

    /// An upstream source answered with a body that could not be decoded.
    #[error("Malformed payload from {provider}: {message}")]
    MalformedPayload {
        /// The upstream source that returned the payload
        provider: String,
        /// Description of the decode failure
        message: String,
    },

    /// A transport error occurred while communicating with an upstream source.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The caller supplied a malformed symbol batch.
    /// Surfaced immediately, before any fetch starts.
    #[error("Invalid symbol batch: {message}")]
    InvalidSymbolBatch {
        /// Description of the validation failure
        message: String,
    },
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// Upstream failures are transient by assumption and retried with
    /// exponential backoff; validation failures are terminal.
    ///
    /// # Examples
    ///
    /// ```
    /// use folioview_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::Timeout { provider: "YAHOO_CHART".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = MarketDataError::InvalidSymbolBatch { message: "empty batch".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            // Transient upstream failures - retry with backoff
            Self::Timeout { .. }
            | Self::UpstreamStatus { .. }
            | Self::MalformedPayload { .. }
            | Self::Network(_) => RetryClass::WithBackoff,

            // Malformed caller input - never retry
            Self::InvalidSymbolBatch { .. } => RetryClass::Never,
        }
    }
}
