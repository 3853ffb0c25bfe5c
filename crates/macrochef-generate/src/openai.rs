//! OpenAI chat-completions client.

use std::time::Duration;

use async_trait::async_trait;
use macrochef_core::{RecipeError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{compose_messages, ChatMessage, GenerationClient};
use crate::config::ModelConfig;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
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
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

impl OpenAiClient {
    /// Create a client against the public OpenAI API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against an OpenAI-compatible endpoint.
    pub fn with_base_url(api_key: impl Into<String>, base_url: &str) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl GenerationClient for OpenAiClient {
    async fn generate(
        &self,
        prompt: &str,
        format_instructions: &str,
        config: &ModelConfig,
    ) -> Result<String> {
        let request = ChatRequest {
            model: &config.model,
            messages: compose_messages(prompt, format_instructions, config.instruction_mode),
            max_tokens: config.max_output_tokens,
            temperature: config.temperature,
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!("Calling {} with model {}", url, config.model);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_millis(config.timeout_ms))
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(e, config.timeout_ms))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(e, config.timeout_ms))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|r| r.error.message)
                .unwrap_or(body);
            return Err(RecipeError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| RecipeError::Serialization("response contained no choices".to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

fn transport_error(err: reqwest::Error, timeout_ms: u64) -> RecipeError {
    if err.is_timeout() {
        RecipeError::Timeout {
            duration_ms: timeout_ms,
            message: err.to_string(),
        }
    } else {
        RecipeError::Connection(err.to_string())
    }
}
