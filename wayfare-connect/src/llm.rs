use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wayfare_core::text::{CompletionRequest, TextGenerator};
use wayfare_core::CoreResult;

use crate::error::{ConnectError, Result};

const SERVICE: &str = "ai";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client. One request per call, no retries; model fallback lives in the
/// content generator.
pub struct ChatCompletionClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ChatCompletionClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConnectError::Config(e.to_string()))?;
        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub async fn chat_completion(&self, request: &CompletionRequest) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(ConnectError::Config("ai api_key is empty".into()));
        }
        let start = Instant::now();

        let body = ChatRequest {
            model: &request.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            max_tokens: request.max_tokens,
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(model = %request.model, error = %e, "Chat completion request failed");
                ConnectError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(model = %request.model, status = %status, "Chat completion API error");
            return Err(ConnectError::api(status.as_u16(), error_text));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ConnectError::Parse(e.to_string()))?;

        let content = first_choice(chat)
            .ok_or_else(|| ConnectError::Parse("response had no content".into()))?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            "Chat completion"
        );
        Ok(content)
    }
}

fn first_choice(chat: ChatResponse) -> Option<String> {
    chat.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

#[async_trait]
impl TextGenerator for ChatCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> CoreResult<String> {
        self.chat_completion(request)
            .await
            .map_err(|e| e.into_core(SERVICE))
    }
}
