/// LLM Client: the single point of entry for all Gemini API calls in JobMatch.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// All model interactions go through a `ModelGateway`, carried in `AppState`
/// as `Arc<dyn ModelGateway>`.
///
/// There are no retries: a failed call surfaces as an `LlmError` immediately.
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub mod gemini;
pub mod prompts;

#[cfg(test)]
pub mod fake;

pub use gemini::GeminiClient;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Prompt blocked by the model: {0}")]
    Blocked(String),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Model call timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Model call was cancelled")]
    Cancelled,
}

/// Which hosted model answers. A cost/quality choice only; the protocol is identical.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModelTier {
    /// Faster, cheaper general model.
    #[default]
    Flash,
    /// Higher-quality model.
    Pro,
}

impl ModelTier {
    pub fn model_id(&self) -> &'static str {
        match self {
            ModelTier::Flash => "gemini-1.5-flash",
            ModelTier::Pro => "gemini-1.5-pro",
        }
    }
}

impl FromStr for ModelTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flash" | "gemini-1.5-flash" => Ok(ModelTier::Flash),
            "pro" | "gemini-1.5-pro" => Ok(ModelTier::Pro),
            other => Err(anyhow::anyhow!(
                "Unknown model tier '{other}' (expected 'flash' or 'pro')"
            )),
        }
    }
}

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

/// An image sent inline alongside a prompt. Only PNG and JPEG are accepted,
/// identified by their leading bytes rather than the uploader's declared type.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    bytes: Bytes,
    mime_type: &'static str,
}

impl ImagePayload {
    /// Returns `None` when the bytes are neither PNG nor JPEG.
    pub fn from_bytes(bytes: Bytes) -> Option<Self> {
        let mime_type = if bytes.starts_with(PNG_MAGIC) {
            "image/png"
        } else if bytes.starts_with(JPEG_MAGIC) {
            "image/jpeg"
        } else {
            return None;
        };
        Some(Self { bytes, mime_type })
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

/// The model gateway trait. Implement this to swap the hosted model backend
/// without touching the pipeline or handlers.
///
/// A call is idle → in-flight → `Ok(text)` | `Err(LlmError)`. Implementations
/// must bound the call by a timeout and stop waiting once `cancel` fires.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        image: Option<&ImagePayload>,
        cancel: &CancellationToken,
    ) -> Result<String, LlmError>;

    /// Identifier of the model answering calls, reported back to clients.
    fn model_id(&self) -> &str;
}
