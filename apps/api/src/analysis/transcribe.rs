//! Image-to-Text Bridge: turns a job-posting image into job text.

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::analysis::prompts::TRANSCRIBE_JOB_IMAGE_PROMPT;
use crate::llm_client::{ImagePayload, LlmError, ModelGateway};

/// Asks the multimodal model to transcribe the posting. The reply is returned
/// verbatim: an empty or garbled transcription flows downstream unchanged.
pub async fn transcribe_job_image(
    gateway: &dyn ModelGateway,
    image: &ImagePayload,
    cancel: &CancellationToken,
) -> Result<String, LlmError> {
    info!(
        "Transcribing job-posting image ({}, {} bytes)",
        image.mime_type(),
        image.byte_len()
    );
    gateway
        .generate(TRANSCRIBE_JOB_IMAGE_PROMPT, Some(image), cancel)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::fake::FakeGateway;
    use bytes::Bytes;

    fn png() -> ImagePayload {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(b"pixels");
        ImagePayload::from_bytes(Bytes::from(bytes)).unwrap()
    }

    #[tokio::test]
    async fn test_transcription_is_returned_verbatim() {
        let gateway = FakeGateway::replying(vec![Ok("  Senior Rust Engineer\n- 5y Rust  ".into())]);
        let text = transcribe_job_image(&gateway, &png(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(text, "  Senior Rust Engineer\n- 5y Rust  ");
        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].prompt, TRANSCRIBE_JOB_IMAGE_PROMPT);
        assert_eq!(calls[0].image_mime, Some("image/png"));
    }

    #[tokio::test]
    async fn test_empty_transcription_is_not_rejected() {
        let gateway = FakeGateway::replying(vec![Ok(String::new())]);
        let text = transcribe_job_image(&gateway, &png(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn test_gateway_error_propagates() {
        let gateway = FakeGateway::replying(vec![Err(LlmError::Api {
            status: 429,
            message: "quota".into(),
        })]);
        let err = transcribe_job_image(&gateway, &png(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 429, .. }));
    }
}
