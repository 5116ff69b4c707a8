use axum::{extract::State, routing::get, Json, Router};
use wayfare_order::DashboardSummary;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/dashboard", get(summary))
}

/// GET /v1/dashboard
async fn summary(State(state): State<AppState>) -> Result<Json<DashboardSummary>, AppError> {
    Ok(Json(state.dashboard.summary().await?))
}
