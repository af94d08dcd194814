//! HTTP API surface.

mod health;
mod holdings;
mod portfolio;
mod stock_data;

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::GlobalKeyExtractor;
use tower_governor::GovernorLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::main_lib::AppState;

/// Assemble the full application router.
pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let api = Router::new()
        .merge(stock_data::router())
        .merge(holdings::router())
        .merge(portfolio::router());

    let mut router = Router::new()
        .merge(health::router())
        .nest("/api", api)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config));

    if config.rate_limit_burst > 0 {
        let governor_conf = Arc::new(
            GovernorConfigBuilder::default()
                .key_extractor(GlobalKeyExtractor)
                .per_millisecond(config.rate_limit_replenish_ms)
                .burst_size(config.rate_limit_burst)
                .finish()
                .expect("valid rate limit configuration"),
        );
        router = router.layer(GovernorLayer::new(governor_conf));
    }

    router.with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origin = match config.cors_origin.as_str() {
        "*" => AllowOrigin::any(),
        configured => match HeaderValue::from_str(configured) {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                tracing::warn!(origin = configured, "invalid CORS origin, allowing any");
                AllowOrigin::any()
            }
        },
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "error": "Route not found",
            "timestamp": Utc::now().timestamp_millis(),
        })),
    )
}
