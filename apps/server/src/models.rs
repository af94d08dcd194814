//! Response envelope shared by every endpoint.

use chrono::Utc;
use serde::Serialize;

/// The `{ success, data, cached?, timestamp }` envelope the dashboard
/// consumes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    /// Epoch milliseconds of the response.
    pub timestamp: i64,
}

impl<T> ApiResponse<T> {
    /// Envelope without a cache flag.
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            cached: None,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Envelope reporting whether the data was served from cache.
    pub fn with_cached(data: T, cached: bool) -> Self {
        Self {
            cached: Some(cached),
            ..Self::new(data)
        }
    }
}
