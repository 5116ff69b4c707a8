use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::CoreResult;

/// One chat-style generation call against a single model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Text of the first choice. Implementations return an error rather than an empty string
    /// when the backend produced nothing.
    async fn complete(&self, request: &CompletionRequest) -> CoreResult<String>;
}
