//! Error types for outbound HTTP adapters.

use thiserror::Error;
use wayfare_core::CoreError;

pub type Result<T> = std::result::Result<T, ConnectError>;

#[derive(Debug, Error)]
pub enum ConnectError {
    /// Missing credentials or an HTTP client that could not be built
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection failure or timeout
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response. `payload` is the response body, as JSON when it parses.
    #[error("API error {status}")]
    Api {
        status: u16,
        payload: serde_json::Value,
    },

    /// Response body did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ConnectError {
    /// Build an `Api` error from a raw response body.
    pub fn api(status: u16, body: String) -> Self {
        let payload = serde_json::from_str(&body).unwrap_or(serde_json::Value::String(body));
        ConnectError::Api { status, payload }
    }

    /// Lift into the domain taxonomy, tagging the upstream `service`.
    pub fn into_core(self, service: &str) -> CoreError {
        match self {
            ConnectError::Config(message) => {
                CoreError::InternalError(format!("{} client misconfigured: {}", service, message))
            }
            ConnectError::Api { status, payload } => CoreError::ExternalError {
                service: service.to_string(),
                status: Some(status),
                payload,
            },
            ConnectError::Network(message) | ConnectError::Parse(message) => CoreError::ExternalError {
                service: service.to_string(),
                status: None,
                payload: serde_json::json!({ "message": message }),
            },
        }
    }
}

impl From<reqwest::Error> for ConnectError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ConnectError::Parse(e.to_string())
        } else {
            ConnectError::Network(e.to_string())
        }
    }
}
