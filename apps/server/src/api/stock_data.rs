use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use folioview_market_data::StockQuote;

use crate::error::{ApiError, ApiResult};
use crate::main_lib::AppState;
use crate::models::ApiResponse;

#[derive(Deserialize)]
struct StockDataQuery {
    symbols: Option<String>,
}

/// GET /api/stock-data?symbols=INFY,TCS,RELIANCE
async fn get_stock_data(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StockDataQuery>,
) -> ApiResult<Json<ApiResponse<Vec<StockQuote>>>> {
    let raw = query.symbols.unwrap_or_default();
    let symbols: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if symbols.is_empty() {
        return Err(ApiError::BadRequest(
            "symbols query parameter is required".to_string(),
        ));
    }

    let quotes = state.stock_service.get_stock_data(&symbols).await?;
    Ok(Json(ApiResponse::new(quotes)))
}

#[derive(Deserialize)]
struct BatchRequest {
    symbols: Vec<String>,
}

/// POST /api/stock-data/batch
async fn batch_stock_data(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BatchRequest>,
) -> ApiResult<Json<ApiResponse<Vec<StockQuote>>>> {
    if body.symbols.is_empty() {
        return Err(ApiError::BadRequest(
            "symbols array is required and must not be empty".to_string(),
        ));
    }

    let quotes = state.stock_service.get_stock_data(&body.symbols).await?;
    Ok(Json(ApiResponse::new(quotes)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stock-data", get(get_stock_data))
        .route("/stock-data/batch", post(batch_stock_data))
}
