use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use folioview_market_data::CacheStats;
use folioview_portfolio::PortfolioCacheStats;

use crate::error::ApiResult;
use crate::main_lib::AppState;
use crate::models::ApiResponse;

#[derive(Serialize)]
struct CacheOverview {
    quotes: CacheStats,
    portfolio: PortfolioCacheStats,
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    timestamp: i64,
    cache: CacheOverview,
}

fn cache_overview(state: &AppState) -> CacheOverview {
    CacheOverview {
        quotes: state.stock_service.cache_stats(),
        portfolio: state.portfolio_service.cache_stats(),
    }
}

/// Liveness plus cache visibility.
async fn health_status(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        timestamp: Utc::now().timestamp_millis(),
        cache: cache_overview(&state),
    })
}

/// Cache statistics alone.
async fn cache_stats(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ApiResponse<CacheOverview>>> {
    Ok(Json(ApiResponse::new(cache_overview(&state))))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_status))
        .route("/health/cache-stats", get(cache_stats))
}
