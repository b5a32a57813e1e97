//! Recording in-memory gateway for pipeline and handler tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::llm_client::{ImagePayload, LlmError, ModelGateway};

/// A prompt the fake received, with the MIME type of any attached image.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub image_mime: Option<&'static str>,
}

/// Replies with queued results in order; records every call.
#[derive(Default)]
pub struct FakeGateway {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<Vec<RecordedCall>>,
    tokens: Mutex<Vec<CancellationToken>>,
    called: Notify,
    hang: bool,
}

impl FakeGateway {
    pub fn replying(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    /// Never answers; each call stays in flight until its token is cancelled.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    /// Resolves once a call has reached the gateway.
    pub async fn wait_for_call(&self) {
        self.called.notified().await;
    }

    /// The cancel token handed to each call, in call order.
    pub fn call_tokens(&self) -> Vec<CancellationToken> {
        self.tokens.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelGateway for FakeGateway {
    async fn generate(
        &self,
        prompt: &str,
        image: Option<&ImagePayload>,
        cancel: &CancellationToken,
    ) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            prompt: prompt.to_string(),
            image_mime: image.map(|i| i.mime_type()),
        });
        self.tokens.lock().unwrap().push(cancel.clone());
        self.called.notify_one();

        if self.hang {
            cancel.cancelled().await;
        }
        if cancel.is_cancelled() {
            return Err(LlmError::Cancelled);
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyContent))
    }

    fn model_id(&self) -> &str {
        "fake-model"
    }
}
