use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use folioview_portfolio::PortfolioSnapshot;

use crate::error::ApiResult;
use crate::main_lib::AppState;
use crate::models::ApiResponse;

/// GET /api/portfolio
async fn get_portfolio(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ApiResponse<PortfolioSnapshot>>> {
    let (snapshot, cached) = state.portfolio_service.get_portfolio().await?;
    Ok(Json(ApiResponse::with_cached(snapshot, cached)))
}

/// POST /api/portfolio/refresh
async fn refresh_portfolio(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ApiResponse<PortfolioSnapshot>>> {
    let snapshot = state.portfolio_service.refresh().await?;
    Ok(Json(ApiResponse::new(snapshot)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/portfolio", get(get_portfolio))
        .route("/portfolio/refresh", post(refresh_portfolio))
}
