use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::ModelTier;

const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 120;
const DEFAULT_PORT: u16 = 8080;

/// Application configuration loaded from environment variables.
/// Built once at startup and injected into `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    pub google_api_key: String,
    pub model_tier: ModelTier,
    pub gemini_api_base: String,
    pub model_timeout: Duration,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

/// Shown when the API key is missing; the server exits before binding.
pub const MISSING_KEY_DIAGNOSTIC: &str =
    "API key error: set GOOGLE_API_KEY (environment or .env) before starting the server";

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            google_api_key: optional("GOOGLE_API_KEY").context(MISSING_KEY_DIAGNOSTIC)?,
            model_tier: optional("GEMINI_MODEL_TIER")
                .map(|v| v.parse::<ModelTier>())
                .transpose()?
                .unwrap_or_default(),
            gemini_api_base: optional("GEMINI_API_BASE")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
            model_timeout: Duration::from_secs(
                optional("MODEL_TIMEOUT_SECS")
                    .map(|v| v.parse::<u64>())
                    .transpose()
                    .context("MODEL_TIMEOUT_SECS must be a whole number of seconds")?
                    .unwrap_or(DEFAULT_MODEL_TIMEOUT_SECS),
            ),
            max_upload_bytes: optional("MAX_UPLOAD_BYTES")
                .map(|v| v.parse::<usize>())
                .transpose()
                .context("MAX_UPLOAD_BYTES must be a byte count")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            port: optional("PORT")
                .map(|v| v.parse::<u16>())
                .transpose()
                .context("PORT must be a valid port number")?
                .unwrap_or(DEFAULT_PORT),
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

#[cfg(test)]
impl Config {
    /// Config pointing at a local mock endpoint, used by handler and gateway tests.
    pub fn for_tests(api_base: &str) -> Self {
        Config {
            google_api_key: "test-key".to_string(),
            model_tier: ModelTier::Flash,
            gemini_api_base: api_base.to_string(),
            model_timeout: Duration::from_secs(5),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}
