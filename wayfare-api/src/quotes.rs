use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use wayfare_core::crm::{Booking, NewQuote, Quote, QuoteStatus};
use wayfare_core::CoreError;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ClientFilter {
    pub client_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/quotes", get(list_quotes).post(create_quote))
        .route("/v1/quotes/{id}", get(get_quote))
        .route("/v1/quotes/{id}/status", patch(update_quote_status))
        .route("/v1/quotes/{id}/convert", post(convert_quote))
        .route("/v1/bookings", get(list_bookings))
        .route("/v1/bookings/{id}", get(get_booking))
}

// ============================================================================
// Quote Handlers
// ============================================================================

/// POST /v1/quotes
async fn create_quote(
    State(state): State<AppState>,
    Json(req): Json<NewQuote>,
) -> Result<(StatusCode, Json<Quote>), AppError> {
    let quote = state.quotes.create_quote(req).await?;
    Ok((StatusCode::CREATED, Json(quote)))
}

/// GET /v1/quotes?client_id=
async fn list_quotes(
    State(state): State<AppState>,
    Query(filter): Query<ClientFilter>,
) -> Result<Json<Vec<Quote>>, AppError> {
    Ok(Json(state.quotes.list_quotes(filter.client_id).await?))
}

/// GET /v1/quotes/{id}
async fn get_quote(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Quote>, AppError> {
    Ok(Json(state.quotes.get_quote(id).await?))
}

/// PATCH /v1/quotes/{id}/status
async fn update_quote_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdate>,
) -> Result<Json<Quote>, AppError> {
    let status = QuoteStatus::parse(&req.status)
        .ok_or_else(|| CoreError::validation(format!("unknown quote status {}", req.status)))?;
    Ok(Json(state.quotes.update_status(id, status).await?))
}

/// POST /v1/quotes/{id}/convert
/// Issues the next TRQ deal ID and books the quote.
async fn convert_quote(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state.quotes.convert(id).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

// ============================================================================
// Booking Handlers
// ============================================================================

/// GET /v1/bookings
async fn list_bookings(State(state): State<AppState>) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.quotes.list_bookings().await?))
}

/// GET /v1/bookings/{id}
async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.quotes.get_booking(id).await?))
}
