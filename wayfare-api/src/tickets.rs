use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;
use wayfare_core::crm::{NewTicket, Ticket, TicketStatus};
use wayfare_core::CoreError;

use crate::error::AppError;
use crate::quotes::{ClientFilter, StatusUpdate};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/tickets", get(list_tickets).post(open_ticket))
        .route("/v1/tickets/{id}", get(get_ticket))
        .route("/v1/tickets/{id}/status", patch(update_ticket_status))
}

/// POST /v1/tickets
async fn open_ticket(
    State(state): State<AppState>,
    Json(req): Json<NewTicket>,
) -> Result<(StatusCode, Json<Ticket>), AppError> {
    let ticket = state.tickets.open_ticket(req).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// GET /v1/tickets?client_id=
async fn list_tickets(
    State(state): State<AppState>,
    Query(filter): Query<ClientFilter>,
) -> Result<Json<Vec<Ticket>>, AppError> {
    Ok(Json(state.tickets.list_tickets(filter.client_id).await?))
}

/// GET /v1/tickets/{id}
async fn get_ticket(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Ticket>, AppError> {
    Ok(Json(state.tickets.get_ticket(id).await?))
}

/// PATCH /v1/tickets/{id}/status
async fn update_ticket_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdate>,
) -> Result<Json<Ticket>, AppError> {
    let status = TicketStatus::parse(&req.status)
        .ok_or_else(|| CoreError::validation(format!("unknown ticket status {}", req.status)))?;
    Ok(Json(state.tickets.update_status(id, status).await?))
}
