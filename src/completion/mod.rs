//! Completion collaborator contract.
//!
//! The engine only ever sends a system instruction plus a user prompt and gets
//! text back. Structured requests are expected to return a JSON object, but the
//! caller still validates every field; see [`crate::parse`].

pub mod openai;
#[cfg(test)]
pub(crate) mod testing;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use openai::OpenAiCompatibleProvider;

/// One request to the completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system_instruction: String,
    pub user_prompt: String,
    /// Ask the service for a JSON object instead of free text.
    pub expect_structured: bool,
}

impl CompletionRequest {
    pub fn structured(system_instruction: &str, user_prompt: String) -> Self {
        Self {
            system_instruction: system_instruction.to_string(),
            user_prompt,
            expect_structured: true,
        }
    }

    pub fn text(system_instruction: &str, user_prompt: String) -> Self {
        Self {
            system_instruction: system_instruction.to_string(),
            user_prompt,
            expect_structured: false,
        }
    }
}

/// Errors from the completion service.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("No API key configured (set {0})")]
    MissingApiKey(String),

    #[error("Completion request failed: {0}")]
    Request(String),

    #[error("Completion service error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Completion service returned no content")]
    EmptyResponse,

    #[error("Completion timed out after {0:?}")]
    Timeout(Duration),
}

/// Text-completion service used by the ingestion, analysis and script pipelines.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}

/// Run a completion bounded by `timeout`. A timed-out call is dropped, which
/// cancels the in-flight request.
pub async fn complete_within(
    provider: &dyn CompletionProvider,
    request: CompletionRequest,
    timeout: Duration,
) -> Result<String, CompletionError> {
    match tokio::time::timeout(timeout, provider.complete(request)).await {
        Ok(result) => result,
        Err(_) => Err(CompletionError::Timeout(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::testing::StubProvider;
    use super::*;

    #[tokio::test]
    async fn test_complete_within_passes_response_through() {
        let provider = StubProvider::replying("hello");
        let out = complete_within(
            &provider,
            CompletionRequest::text("sys", "prompt".to_string()),
            Duration::from_secs(5),
        )
        .await
        .expect("completion");
        assert_eq!(out, "hello");
        assert_eq!(provider.requests()[0].user_prompt, "prompt");
        assert!(!provider.requests()[0].expect_structured);
    }

    #[tokio::test]
    async fn test_complete_within_times_out() {
        let provider = StubProvider::replying("late").with_delay(Duration::from_millis(200));
        let err = complete_within(
            &provider,
            CompletionRequest::structured("sys", "prompt".to_string()),
            Duration::from_millis(20),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CompletionError::Timeout(d) if d == Duration::from_millis(20)));
        assert_eq!(err.to_string(), "Completion timed out after 20ms");
    }
}
