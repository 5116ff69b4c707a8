pub mod crm;
pub mod deal;
pub mod deal_id;
pub mod repository;
pub mod social;
pub mod text;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {}", .0.join("; "))]
    ValidationError(Vec<String>),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("{service} request failed{}", .status.map(|s| format!(" with status {}", s)).unwrap_or_default())]
    ExternalError {
        service: String,
        status: Option<u16>,
        payload: serde_json::Value,
    },
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl CoreError {
    pub fn validation(problem: impl Into<String>) -> Self {
        CoreError::ValidationError(vec![problem.into()])
    }

    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        CoreError::NotFound(format!("{} {} not found", entity, id))
    }

    /// Expected failures that callers map to a response. Only `InternalError` is a defect.
    pub fn is_operational(&self) -> bool {
        !matches!(self, CoreError::InternalError(_))
    }

    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::ValidationError(_) => 400,
            CoreError::NotFound(_) => 404,
            CoreError::Conflict(_) => 409,
            CoreError::ExternalError { .. } => 502,
            CoreError::InternalError(_) => 500,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(CoreError::validation("title is required").status_code(), 400);
        assert_eq!(CoreError::not_found("Quote", "abc").status_code(), 404);
        assert_eq!(CoreError::Conflict("dup".into()).status_code(), 409);
        assert_eq!(CoreError::InternalError("boom".into()).status_code(), 500);

        let external = CoreError::ExternalError {
            service: "social".into(),
            status: Some(422),
            payload: serde_json::json!({"message": "bad date"}),
        };
        assert_eq!(external.status_code(), 502);
        assert_eq!(external.to_string(), "social request failed with status 422");
    }

    #[test]
    fn test_only_internal_errors_are_defects() {
        assert!(CoreError::validation("x").is_operational());
        assert!(CoreError::Conflict("x".into()).is_operational());
        assert!(!CoreError::InternalError("x".into()).is_operational());
    }

    #[test]
    fn test_validation_message_lists_every_problem() {
        let err = CoreError::ValidationError(vec![
            "client_id is required".into(),
            "holiday_type is required".into(),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: client_id is required; holiday_type is required"
        );
    }
}
