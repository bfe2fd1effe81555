use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;

use crate::analysis::pipeline::{DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use crate::analysis::prompts::DEFAULT_CURRENT_DATE;
use crate::analysis::schema::SchemaVariant;
use crate::llm_client::DEFAULT_API_BASE;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Every key has a default; the API key may be absent (analyses then fail with
/// `MissingCredential`). Malformed values fail startup.
#[derive(Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_api_base: String,
    pub analysis_model: String,
    pub fallback_model: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub schema_variant: SchemaVariant,
    pub current_date: NaiveDate,
    pub overall_deadline: Option<Duration>,
    pub http_timeout: Duration,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

// Hand-written so the API key never reaches logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<redacted>"))
            .field("gemini_api_base", &self.gemini_api_base)
            .field("analysis_model", &self.analysis_model)
            .field("fallback_model", &self.fallback_model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("schema_variant", &self.schema_variant)
            .field("current_date", &self.current_date)
            .field("overall_deadline", &self.overall_deadline)
            .field("http_timeout", &self.http_timeout)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_api_base: get("GEMINI_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            analysis_model: get("ANALYSIS_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            fallback_model: get("ANALYSIS_FALLBACK_MODEL"),
            temperature: check_temperature(parse_or(&get, "ANALYSIS_TEMPERATURE", DEFAULT_TEMPERATURE)?)?,
            max_output_tokens: parse_or(&get, "ANALYSIS_MAX_OUTPUT_TOKENS", DEFAULT_MAX_OUTPUT_TOKENS)?,
            schema_variant: match get("ANALYSIS_SCHEMA") {
                Some(v) => v
                    .parse()
                    .map_err(|e: String| anyhow!(e))
                    .context("ANALYSIS_SCHEMA is invalid")?,
                None => SchemaVariant::default(),
            },
            current_date: {
                let raw = get("ANALYSIS_CURRENT_DATE").unwrap_or_else(|| DEFAULT_CURRENT_DATE.to_string());
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .with_context(|| format!("ANALYSIS_CURRENT_DATE must be YYYY-MM-DD, got '{raw}'"))?
            },
            overall_deadline: get("ANALYSIS_DEADLINE_SECS")
                .map(|v| parse_value::<u64>("ANALYSIS_DEADLINE_SECS", &v))
                .transpose()?
                .map(|secs| positive_secs("ANALYSIS_DEADLINE_SECS", secs))
                .transpose()?,
            http_timeout: positive_secs(
                "HTTP_TIMEOUT_SECS",
                parse_or(&get, "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
            )?,
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            port: parse_or(&get, "PORT", DEFAULT_PORT)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// The service accepts temperatures in [0, 2].
fn check_temperature(value: f32) -> Result<f32> {
    if (0.0..=2.0).contains(&value) {
        Ok(value)
    } else {
        bail!("ANALYSIS_TEMPERATURE must be between 0 and 2, got '{value}'")
    }
}

fn positive_secs(key: &str, secs: u64) -> Result<Duration> {
    if secs == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(value) => parse_value(key, &value),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse::<T>()
        .with_context(|| format!("{key} must be a valid value, got '{value}'"))
}
