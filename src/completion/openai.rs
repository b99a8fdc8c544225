//! Chat-completions client for OpenAI-compatible APIs.
//!
//! Defaults target Groq (`https://api.groq.com/openai/v1`). Uses reqwest with
//! Bearer token auth and requests `json_object` output for structured calls.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{CompletionError, CompletionProvider, CompletionRequest};
use crate::config::CompletionConfig;

pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiCompatibleProvider {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    /// Build from config, reading the API key from the configured env var.
    pub fn from_config(config: &CompletionConfig) -> Result<Self, CompletionError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| CompletionError::MissingApiKey(config.api_key_env.clone()))?;
        Ok(Self::new(&config.base_url, &api_key, &config.model))
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system_instruction },
                { "role": "user", "content": request.user_prompt },
            ],
        });
        if request.expect_structured {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }
}

/// Pull `choices[0].message.content` out of a chat-completions response.
fn message_content(response: &Value) -> Result<String, CompletionError> {
    response
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(CompletionError::EmptyResponse)
}

#[async_trait]
impl CompletionProvider for OpenAiCompatibleProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let body = self.request_body(&request);
        log::debug!(
            "Completion request to {} (model {}, structured: {})",
            self.base_url,
            self.model,
            request.expect_structured
        );

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(CompletionError::Status { status, body: text });
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| CompletionError::Request(format!("Failed to parse response: {}", e)))?;

        message_content(&json)
    }
}
