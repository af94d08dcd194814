//! API error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;

use folioview_market_data::MarketDataError;
use folioview_portfolio::PortfolioError;

/// Handler result alias.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors a handler can surface to the client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
            "timestamp": Utc::now().timestamp_millis(),
        }));
        (status, body).into_response()
    }
}

impl From<MarketDataError> for ApiError {
    fn from(err: MarketDataError) -> Self {
        match err {
            MarketDataError::InvalidSymbolBatch { message } => Self::BadRequest(message),
            // Upstream failures are reported in-band per quote; one
            // reaching here is a server-side fault.
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<PortfolioError> for ApiError {
    fn from(err: PortfolioError) -> Self {
        match err {
            PortfolioError::NotFound(id) => Self::NotFound(format!("Holding not found: {}", id)),
            PortfolioError::Validation(message) => Self::BadRequest(message),
            PortfolioError::MarketData(inner) => inner.into(),
        }
    }
}
