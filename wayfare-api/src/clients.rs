use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use tracing::info;
use uuid::Uuid;
use wayfare_core::crm::{Client, NewClient};
use wayfare_core::CoreError;

use crate::error::AppError;
use crate::middleware::{require_admin, StaffClaims};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/clients", get(list_clients).post(create_client))
        .route(
            "/v1/clients/{id}",
            get(get_client).put(update_client).delete(delete_client),
        )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/clients
async fn create_client(
    State(state): State<AppState>,
    Json(req): Json<NewClient>,
) -> Result<(StatusCode, Json<Client>), AppError> {
    let client = req.into_client()?;
    state.clients.create_client(&client).await?;
    // email and phone are masked in Debug output
    info!(client_id = %client.id, email = ?client.email, "Client created");
    Ok((StatusCode::CREATED, Json(client)))
}

/// GET /v1/clients
async fn list_clients(State(state): State<AppState>) -> Result<Json<Vec<Client>>, AppError> {
    Ok(Json(state.clients.list_clients().await?))
}

/// GET /v1/clients/{id}
async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Client>, AppError> {
    let client = state
        .clients
        .get_client(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Client", id))?;
    Ok(Json(client))
}

/// PUT /v1/clients/{id}
/// Only the fields present in the body change.
async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<NewClient>,
) -> Result<Json<Client>, AppError> {
    let mut client = state
        .clients
        .get_client(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Client", id))?;

    req.apply_to(&mut client)?;
    state.clients.update_client(&client).await?;
    Ok(Json(client))
}

/// DELETE /v1/clients/{id}
/// Admin only.
async fn delete_client(
    State(state): State<AppState>,
    Extension(claims): Extension<StaffClaims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require_admin(&claims)?;

    if !state.clients.delete_client(id).await? {
        return Err(CoreError::not_found("Client", id).into());
    }
    info!(client_id = %id, deleted_by = %claims.sub, "Client deleted");
    Ok(StatusCode::NO_CONTENT)
}
