use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use folioview_portfolio::{Holding, NewHolding};

use crate::error::ApiResult;
use crate::main_lib::AppState;
use crate::models::ApiResponse;

/// GET /api/holdings
async fn get_holdings(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ApiResponse<Vec<Holding>>>> {
    let (holdings, cached) = state.portfolio_service.get_holdings().await;
    Ok(Json(ApiResponse::with_cached(holdings, cached)))
}

/// GET /api/holdings/{id}
async fn get_holding(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Holding>>> {
    let holding = state.portfolio_service.get_holding(&id).await?;
    Ok(Json(ApiResponse::new(holding)))
}

/// POST /api/holdings
async fn create_holding(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewHolding>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Holding>>)> {
    let holding = state.portfolio_service.add_holding(body).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(holding))))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/holdings", get(get_holdings).post(create_holding))
        .route("/holdings/{id}", get(get_holding))
}
