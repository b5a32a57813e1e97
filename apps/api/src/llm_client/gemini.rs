//! Gemini `generateContent` client, the production `ModelGateway`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::Config;
use crate::llm_client::{ImagePayload, LlmError, ModelGateway};

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    pub prompt_token_count: Option<u32>,
    pub candidates_token_count: Option<u32>,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate, in order.
    /// A blocked prompt or a safety stop with no text maps to `Blocked`.
    pub fn into_text(self) -> Result<String, LlmError> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(match block_reason {
                Some(reason) => LlmError::Blocked(reason),
                None => LlmError::EmptyContent,
            });
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if !text.is_empty() {
            return Ok(text);
        }

        match candidate.finish_reason.as_deref() {
            Some("SAFETY") | Some("RECITATION") | Some("BLOCKLIST") => Err(LlmError::Blocked(
                candidate.finish_reason.unwrap_or_default(),
            )),
            _ => Err(LlmError::EmptyContent),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// Wraps the Gemini REST API. Cheap to clone; the inner `reqwest::Client` is shared.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: &'static str,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self, LlmError> {
        let model = config.model_tier.model_id();
        Ok(Self {
            client: Client::builder().build()?,
            api_key: config.google_api_key.clone(),
            endpoint: format!(
                "{}/models/{}:generateContent",
                config.gemini_api_base.trim_end_matches('/'),
                model
            ),
            model,
            timeout: config.model_timeout,
        })
    }

    async fn send(&self, prompt: &str, image: Option<&ImagePayload>) -> Result<String, LlmError> {
        let mut parts = vec![Part::Text { text: prompt }];
        if let Some(image) = image {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type(),
                    data: image.to_base64(),
                },
            });
        }
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Gemini API returned {}: {}", status, body);
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "Gemini call succeeded: prompt_tokens={:?}, output_tokens={:?}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }
        parsed.into_text()
    }
}

#[async_trait]
impl ModelGateway for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        image: Option<&ImagePayload>,
        cancel: &CancellationToken,
    ) -> Result<String, LlmError> {
        if cancel.is_cancelled() {
            return Err(LlmError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Gemini call cancelled while in flight");
                Err(LlmError::Cancelled)
            }
            outcome = tokio::time::timeout(self.timeout, self.send(prompt, image)) => {
                outcome.unwrap_or(Err(LlmError::Timeout(self.timeout)))
            }
        }
    }

    fn model_id(&self) -> &str {
        self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use mockito::Matcher;

    const FLASH_PATH: &str = "/models/gemini-1.5-flash:generateContent";

    fn client_for(base: &str) -> GeminiClient {
        GeminiClient::new(&Config::for_tests(base)).unwrap()
    }

    /// Accepts connections and never answers, so calls hang until timed out or cancelled.
    async fn silent_server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_generate_returns_joined_candidate_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", FLASH_PATH)
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::Regex("Compare these".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates":[{"content":{"parts":[{"text":"SEC1|||"},{"text":"SEC2|||SEC3"}]},"finishReason":"STOP"}],
                    "usageMetadata":{"promptTokenCount":12,"candidatesTokenCount":7}}"#,
            )
            .create_async()
            .await;

        let text = client_for(&server.url())
            .generate("Compare these", None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(text, "SEC1|||SEC2|||SEC3");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_sends_inline_image() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", FLASH_PATH)
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#""mime_type":"image/jpeg""#.to_string()),
                Matcher::Regex(r#""data":"/9j/""#.to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"Senior Rust Engineer"}]}}]}"#)
            .create_async()
            .await;

        let image = ImagePayload::from_bytes(Bytes::from_static(&[0xFF, 0xD8, 0xFF])).unwrap();
        let text = client_for(&server.url())
            .generate("Transcribe", Some(&image), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(text, "Senior Rust Engineer");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_message_is_extracted() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", FLASH_PATH)
            .with_status(400)
            .with_body(r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#)
            .create_async()
            .await;

        let err = client_for(&server.url())
            .generate("prompt", None, &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_keeps_raw_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", FLASH_PATH)
            .with_status(503)
            .with_body("upstream overloaded")
            .create_async()
            .await;

        let err = client_for(&server.url())
            .generate("prompt", None, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Api { status: 503, ref message } if message == "upstream overloaded"));
    }

    #[tokio::test]
    async fn test_blocked_prompt_maps_to_blocked() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", FLASH_PATH)
            .with_status(200)
            .with_body(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
            .create_async()
            .await;

        let err = client_for(&server.url())
            .generate("prompt", None, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Blocked(ref r) if r == "SAFETY"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", FLASH_PATH)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let err = client_for(&server.url())
            .generate("prompt", None, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Parse(_)));
    }

    #[tokio::test]
    async fn test_call_is_bounded_by_timeout() {
        let base = silent_server().await;
        let mut config = Config::for_tests(&base);
        config.model_timeout = Duration::from_millis(100);
        let client = GeminiClient::new(&config).unwrap();

        let err = client
            .generate("prompt", None, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_in_flight_call_observes_cancellation() {
        let base = silent_server().await;
        let client = client_for(&base);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = client.generate("prompt", None, &cancel).await.unwrap_err();
        assert!(matches!(err, LlmError::Cancelled));
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_skips_the_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", FLASH_PATH)
            .expect(0)
            .create_async()
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = client_for(&server.url())
            .generate("prompt", None, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Cancelled));
        mock.assert_async().await;
    }

    #[test]
    fn test_empty_candidate_is_empty_content() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[]},"finishReason":"STOP"}]}"#)
                .unwrap();
        assert!(matches!(response.into_text(), Err(LlmError::EmptyContent)));
    }

    #[test]
    fn test_safety_stop_without_text_is_blocked() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(matches!(response.into_text(), Err(LlmError::Blocked(ref r)) if r == "SAFETY"));
    }

    #[test]
    fn test_model_id_follows_tier() {
        let mut config = Config::for_tests("http://localhost");
        config.model_tier = crate::llm_client::ModelTier::Pro;
        let client = GeminiClient::new(&config).unwrap();
        assert_eq!(client.model_id(), "gemini-1.5-pro");
        assert!(client.endpoint.ends_with("/models/gemini-1.5-pro:generateContent"));
    }
}
