use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use wayfare_core::crm::{NewReferral, Referral};

use crate::error::AppError;
use crate::middleware::{require_admin, StaffClaims};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AttachBookingRequest {
    pub booking_id: Uuid,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/referrals", get(list_referrals).post(create_referral))
        .route("/v1/referrals/{id}", get(get_referral))
        .route("/v1/referrals/{id}/booking", post(attach_booking))
        .route("/v1/referrals/{id}/paid", post(mark_paid))
}

/// POST /v1/referrals
async fn create_referral(
    State(state): State<AppState>,
    Json(req): Json<NewReferral>,
) -> Result<(StatusCode, Json<Referral>), AppError> {
    let referral = state.commissions.create_referral(req).await?;
    Ok((StatusCode::CREATED, Json(referral)))
}

/// GET /v1/referrals
async fn list_referrals(State(state): State<AppState>) -> Result<Json<Vec<Referral>>, AppError> {
    Ok(Json(state.commissions.list_referrals().await?))
}

/// GET /v1/referrals/{id}
async fn get_referral(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Referral>, AppError> {
    Ok(Json(state.commissions.get_referral(id).await?))
}

/// POST /v1/referrals/{id}/booking
/// Commission is worked out from the booking total at this point.
async fn attach_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AttachBookingRequest>,
) -> Result<Json<Referral>, AppError> {
    Ok(Json(state.commissions.attach_booking(id, req.booking_id).await?))
}

/// POST /v1/referrals/{id}/paid
/// Admin only.
async fn mark_paid(
    State(state): State<AppState>,
    Extension(claims): Extension<StaffClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Referral>, AppError> {
    require_admin(&claims)?;
    let referral = state.commissions.mark_paid(id).await?;
    info!(referral_id = %id, paid_by = %claims.sub, "Commission payout recorded");
    Ok(Json(referral))
}
