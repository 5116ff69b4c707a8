use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wayfare_core::deal::{MediaId, TravelDealRecord};
use wayfare_core::social::MediaUpload;
use wayfare_deal::{render_html, DealFields, TravelDeal};
use wayfare_order::{DealInput, DeleteOutcome, ScheduleRequest};

use crate::error::AppError;
use crate::state::AppState;

/// Upper bound for a schedule request including its files.
const SCHEDULE_BODY_LIMIT: usize = 25 * 1024 * 1024;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Either free `key: value` text or structured fields.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DealRequest {
    Text { text: String },
    Fields { deal: DealFields },
}

impl From<DealRequest> for DealInput {
    fn from(req: DealRequest) -> Self {
        match req {
            DealRequest::Text { text } => DealInput::Text(text),
            DealRequest::Fields { deal } => DealInput::Fields(deal),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub deal_id: Uuid,
    pub post_text: String,
    pub html: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/deals", get(list_deals))
        .route("/v1/deals/parse", post(parse_deal))
        .route("/v1/deals/{id}", get(get_deal).delete(delete_deal))
        .route("/v1/deals/{id}/preview", get(preview_deal))
        .route(
            "/v1/deals/{id}/schedule",
            post(schedule_deal).layer(DefaultBodyLimit::max(SCHEDULE_BODY_LIMIT)),
        )
        .route(
            "/v1/quotes/{id}/deal",
            get(get_deal_for_quote).post(generate_deal),
        )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/deals/parse
/// Parse and validate without generating anything.
async fn parse_deal(Json(req): Json<DealRequest>) -> Result<Json<TravelDeal>, AppError> {
    let deal = DealInput::from(req).into_deal()?;
    Ok(Json(deal))
}

/// POST /v1/quotes/{id}/deal
/// Generate (or regenerate) the travel deal post for a quote.
async fn generate_deal(
    State(state): State<AppState>,
    Path(quote_id): Path<Uuid>,
    Json(req): Json<DealRequest>,
) -> Result<(StatusCode, Json<TravelDealRecord>), AppError> {
    let record = state.deals.generate_deal(quote_id, req.into()).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /v1/quotes/{id}/deal
async fn get_deal_for_quote(
    State(state): State<AppState>,
    Path(quote_id): Path<Uuid>,
) -> Result<Json<TravelDealRecord>, AppError> {
    Ok(Json(state.deals.deal_for_quote(quote_id).await?))
}

/// GET /v1/deals
async fn list_deals(State(state): State<AppState>) -> Result<Json<Vec<TravelDealRecord>>, AppError> {
    Ok(Json(state.deals.list_deals().await?))
}

/// GET /v1/deals/{id}
async fn get_deal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TravelDealRecord>, AppError> {
    Ok(Json(state.deals.get_deal(id).await?))
}

/// GET /v1/deals/{id}/preview
async fn preview_deal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PreviewResponse>, AppError> {
    let record = state.deals.get_deal(id).await?;
    Ok(Json(PreviewResponse {
        deal_id: record.id,
        html: render_html(&record.post_text),
        post_text: record.post_text,
    }))
}

/// POST /v1/deals/{id}/schedule
/// multipart/form-data: `scheduled_at`, optional `media_ids` (JSON array), `post_text`,
/// `alt_text` and any number of `file` parts.
async fn schedule_deal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<TravelDealRecord>, AppError> {
    let request = read_schedule_form(multipart).await?;
    Ok(Json(state.deals.schedule_deal(id, request).await?))
}

/// DELETE /v1/deals/{id}
async fn delete_deal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteOutcome>, AppError> {
    Ok(Json(state.deals.delete_deal(id).await?))
}

// ============================================================================
// Multipart Parsing
// ============================================================================

async fn read_schedule_form(mut multipart: Multipart) -> Result<ScheduleRequest, AppError> {
    let mut scheduled_at = None;
    let mut media_ids = None;
    let mut post_text = None;
    let mut alt_text = None;
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "scheduled_at" => scheduled_at = non_blank(field.text().await?),
            "media_ids" => media_ids = non_blank(field.text().await?),
            "post_text" => post_text = non_blank(field.text().await?),
            "alt_text" => alt_text = non_blank(field.text().await?),
            "file" | "files" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    files.push(MediaUpload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                        alt_text: None,
                    });
                }
            }
            _ => {}
        }
    }

    let scheduled_at = scheduled_at
        .ok_or_else(|| AppError::BadRequest("scheduled_at is required".to_string()))?;
    let scheduled_at = parse_schedule_time(&scheduled_at)?;

    let media_ids = media_ids
        .map(|raw| {
            serde_json::from_str::<Vec<MediaId>>(&raw)
                .map_err(|e| AppError::BadRequest(format!("media_ids must be a JSON array: {}", e)))
        })
        .transpose()?;

    for file in &mut files {
        file.alt_text = alt_text.clone();
    }

    Ok(ScheduleRequest {
        scheduled_at,
        media_ids,
        files,
        post_text,
    })
}

/// `YYYY-MM-DDTHH:MM`, seconds tolerated.
fn parse_schedule_time(raw: &str) -> Result<NaiveDateTime, AppError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| {
            AppError::BadRequest(format!(
                "scheduled_at must look like 2026-06-01T09:30, got {}",
                raw
            ))
        })
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn test_schedule_time_formats() {
        let t = parse_schedule_time("2026-06-01T09:30").unwrap();
        assert_eq!(t.date(), NaiveDate::from_ymd_opt(2026, 6, 1).unwrap());
        assert_eq!((t.hour(), t.minute()), (9, 30));
        assert!(parse_schedule_time("2026-06-01T09:30:15").is_ok());
        assert!(parse_schedule_time("01/06/2026 09:30").is_err());
    }

    #[test]
    fn test_deal_request_shapes() {
        let text: DealRequest = serde_json::from_str(r#"{"text":"Title: X"}"#).unwrap();
        assert!(matches!(DealInput::from(text), DealInput::Text(t) if t == "Title: X"));

        let fields: DealRequest =
            serde_json::from_str(r#"{"deal":{"title":"X","nights":"7"}}"#).unwrap();
        match DealInput::from(fields) {
            DealInput::Fields(f) => assert_eq!(f.nights.as_deref(), Some("7")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
