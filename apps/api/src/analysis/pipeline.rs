//! Structured extraction pipeline: payload and context in, `AnalysisResult` or `ExtractionFailure` out.
//!
//! Flow: preconditions → build instruction → completion call (with the optional
//! single fallback) → sanitize → decode → score normalization.
//!
//! One configurable pipeline covers every model/temperature/schema combination;
//! there are no per-model variants. The pipeline holds no mutable state, so one
//! instance can serve concurrent requests. Dropping the future returned by
//! `extract` cancels the in-flight HTTP call and yields nothing.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::analysis::failure::ExtractionFailure;
use crate::analysis::models::AnalysisResult;
use crate::analysis::prompts::{build_instruction, render_preamble};
use crate::analysis::request::RequestContext;
use crate::analysis::sanitize::sanitize_response;
use crate::analysis::schema::{ExtractionSchema, SchemaVariant};
use crate::config::Config;
use crate::llm_client::{CompletionRequest, CompletionService, GeminiClient, LlmError};
use crate::normalizer::SourcePayload;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;

/// Tunables selected through configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub model: String,
    /// Lower-capability model tried once, sequentially, if the primary call fails.
    pub fallback_model: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub schema_variant: SchemaVariant,
    pub current_date: NaiveDate,
    /// Bounds both attempts together. Only applied when a fallback model is set.
    pub overall_deadline: Option<Duration>,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.analysis_model.clone(),
            fallback_model: config.fallback_model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            schema_variant: config.schema_variant,
            current_date: config.current_date,
            overall_deadline: config.overall_deadline,
        }
    }
}

pub struct ExtractionPipeline {
    /// `None` when no credential was configured.
    completion: Option<Arc<dyn CompletionService>>,
    settings: PipelineSettings,
    schema: ExtractionSchema,
    preamble: String,
}

impl ExtractionPipeline {
    pub fn new(completion: Option<Arc<dyn CompletionService>>, settings: PipelineSettings) -> Self {
        let schema = ExtractionSchema::for_variant(settings.schema_variant);
        let preamble = render_preamble(settings.current_date);
        Self {
            completion,
            settings,
            schema,
            preamble,
        }
    }

    /// Reads the credential once. A missing key is logged here and surfaced as
    /// `MissingCredential` on every `extract`, never as a crash.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let completion: Option<Arc<dyn CompletionService>> = match &config.gemini_api_key {
            Some(key) => Some(Arc::new(GeminiClient::new(
                key.clone(),
                config.gemini_api_base.clone(),
                config.http_timeout,
            )?)),
            None => {
                warn!("GEMINI_API_KEY is not set; every analysis will fail with MissingCredential");
                None
            }
        };
        Ok(Self::new(completion, PipelineSettings::from_config(config)))
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn is_configured(&self) -> bool {
        self.completion.is_some()
    }

    /// Runs one analysis. Yields exactly one of a result or a failure.
    pub async fn extract(
        &self,
        payload: &SourcePayload,
        ctx: &RequestContext,
    ) -> Result<AnalysisResult, ExtractionFailure> {
        let span = info_span!(
            "extract",
            analysis_id = %Uuid::new_v4(),
            model = %self.settings.model,
            payload = payload.kind(),
        );
        self.run(payload, ctx).instrument(span).await
    }

    async fn run(
        &self,
        payload: &SourcePayload,
        ctx: &RequestContext,
    ) -> Result<AnalysisResult, ExtractionFailure> {
        let completion = self
            .completion
            .as_deref()
            .ok_or(ExtractionFailure::MissingCredential)?;

        if payload.is_empty() {
            return Err(ExtractionFailure::EmptyPayload);
        }

        let instruction = build_instruction(&self.preamble, ctx);
        info!(target_role = %ctx.target_role(), "Requesting CV analysis");

        let raw = match self.complete(completion, &instruction, payload).await {
            Ok(text) => text,
            // A reply without text is a response problem, not a transport one.
            Err(LlmError::EmptyContent) => String::new(),
            Err(e) => {
                warn!("Completion failed: {e}");
                return Err(ExtractionFailure::TransportError {
                    detail: e.to_string(),
                });
            }
        };

        let result = decode_analysis(&raw)?;
        info!(match_score = result.match_score.value(), "CV analysis complete");
        Ok(result)
    }

    /// Primary call, then at most one sequential fallback call.
    async fn complete(
        &self,
        completion: &dyn CompletionService,
        instruction: &str,
        payload: &SourcePayload,
    ) -> Result<String, LlmError> {
        let primary = self.request(&self.settings.model, instruction, payload);

        let Some(fallback_model) = self.settings.fallback_model.as_deref() else {
            return completion.complete(primary).await;
        };

        let attempts = async {
            match completion.complete(primary).await {
                Ok(text) => Ok(text),
                Err(e) => {
                    warn!(fallback = %fallback_model, "Primary model failed ({e}); trying fallback once");
                    let fallback = self.request(fallback_model, instruction, payload);
                    completion.complete(fallback).await
                }
            }
        };

        match self.settings.overall_deadline {
            Some(deadline) => tokio::time::timeout(deadline, attempts)
                .await
                .map_err(|_| LlmError::DeadlineExceeded(deadline))?,
            None => attempts.await,
        }
    }

    fn request<'a>(
        &'a self,
        model: &'a str,
        instruction: &'a str,
        payload: &'a SourcePayload,
    ) -> CompletionRequest<'a> {
        CompletionRequest {
            model,
            instruction,
            payload,
            response_schema: self.schema.as_json(),
            temperature: self.settings.temperature,
            max_output_tokens: self.settings.max_output_tokens,
        }
    }
}

/// Sanitizes, decodes and normalizes raw model text.
/// On failure the original, pre-sanitization text is kept for diagnostics.
pub fn decode_analysis(raw: &str) -> Result<AnalysisResult, ExtractionFailure> {
    let candidate = sanitize_response(raw);
    match serde_json::from_str::<AnalysisResult>(candidate) {
        Ok(mut result) => {
            result.normalize_scores();
            Ok(result)
        }
        Err(e) => {
            warn!(raw_len = raw.len(), "Model response is not a valid analysis: {e}");
            debug!(raw_text = %raw, "Unparsable model response");
            Err(ExtractionFailure::UnparsableResponse {
                raw_text: raw.to_string(),
            })
        }
    }
}
