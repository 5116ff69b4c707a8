use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use wayfare_core::CoreError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    BadRequest(String),
    Core(CoreError),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Core(err) => core_error_body(err),
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

fn core_error_body(err: CoreError) -> (StatusCode, serde_json::Value) {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = err.to_string();

    let body = match err {
        CoreError::ValidationError(problems) => json!({ "error": message, "details": problems }),
        CoreError::ExternalError { service, status: upstream_status, payload } => {
            tracing::warn!(service = %service, upstream_status = ?upstream_status, "Upstream request failed");
            json!({
                "error": message,
                "upstream_status": upstream_status,
                "upstream": payload,
            })
        }
        CoreError::InternalError(detail) => {
            tracing::error!("Internal Server Error: {}", detail);
            json!({ "error": "Internal Server Error" })
        }
        CoreError::NotFound(_) | CoreError::Conflict(_) => json!({ "error": message }),
    };

    (status, body)
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        Self::BadRequest(format!("invalid multipart body: {}", err.body_text()))
    }
}
