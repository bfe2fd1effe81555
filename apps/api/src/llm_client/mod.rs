//! LLM client: the single point of entry for all generative-model calls.
//!
//! ARCHITECTURAL RULE: No other module may call the completion API directly.
//! All model interactions go through `CompletionService`.
//!
//! The client never retries on its own. The extraction pipeline owns the one
//! optional fallback attempt so that retries stay visible to callers.
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use crate::normalizer::SourcePayload;

pub mod prompts;
pub mod types;

use types::{
    ApiErrorEnvelope, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    InlineData, Part,
};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
const JSON_MIME: &str = "application/json";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Prompt blocked by the service: {reason}")]
    Blocked { reason: String },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Completion did not finish within {0:?}")]
    DeadlineExceeded(Duration),
}

/// Everything the service needs for one structured completion.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub instruction: &'a str,
    pub payload: &'a SourcePayload,
    pub response_schema: &'a serde_json::Value,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// The seam between the pipeline and the remote generative service.
/// Returns the raw response text; interpreting it is the caller's job.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError>;
}

/// `generateContent` client for the hosted Gemini API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_base: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String, api_base: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.api_base)
    }
}

#[async_trait]
impl CompletionService for GeminiClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError> {
        let body = build_request_body(&request);

        let response = self
            .client
            .post(self.endpoint(request.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Completion API returned {}: {}", status, body);
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        response_text(parsed)
    }
}

/// Builds the request body. The payload union is matched exhaustively here,
/// the one place it crosses into the transport.
fn build_request_body<'a>(request: &CompletionRequest<'a>) -> GenerateContentRequest<'a> {
    let payload_part = match request.payload {
        SourcePayload::Inline { data, mime_type } => Part::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.as_str(),
                data: data.as_str(),
            },
        },
        SourcePayload::PlainText { content } => Part::Text {
            text: content.as_str(),
        },
    };

    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![
                payload_part,
                Part::Text {
                    text: request.instruction,
                },
            ],
        }],
        generation_config: GenerationConfig {
            response_mime_type: JSON_MIME,
            response_schema: request.response_schema,
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
        },
    }
}

fn response_text(response: GenerateContentResponse) -> Result<String, LlmError> {
    if let Some(usage) = &response.usage_metadata {
        debug!(
            "Completion succeeded: prompt_tokens={}, output_tokens={}",
            usage.prompt_token_count, usage.candidates_token_count
        );
    }

    if let Some(text) = response.text() {
        return Ok(text);
    }

    let block_reason = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.clone());
    if let Some(reason) = block_reason {
        return Err(LlmError::Blocked { reason });
    }

    let finish_reason = response
        .candidates
        .first()
        .and_then(|c| c.finish_reason.as_deref())
        .unwrap_or("none");
    warn!("Completion returned no text (finish_reason={finish_reason})");
    Err(LlmError::EmptyContent)
}
