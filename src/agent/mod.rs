//! Model-service client.
//!
//! The inference engine is a black box behind an OpenAI-compatible
//! `/v1/chat/completions` endpoint: ordered messages in, one completion
//! out. This is the single place in the system where a failure is allowed
//! to reach the user, so the error is typed rather than logged away.

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::types::ChatMessage;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model service returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("malformed model response: {0}")]
    Malformed(String),
}

pub struct ModelClient {
    client: Client,
    endpoint: Url,
}

impl ModelClient {
    pub fn new(endpoint: &str, timeout: Duration) -> anyhow::Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| anyhow::anyhow!("invalid model endpoint {endpoint}: {e}"))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build model client: {e}"))?;
        Ok(Self { client, endpoint })
    }

    /// Request one completion for the assembled prompt.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, ModelError> {
        debug!(messages = messages.len(), "requesting completion");

        let body = serde_json::json!({
            "messages": messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api { status, body });
        }

        let payload: Value = response.json().await?;
        let text = payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| ModelError::Malformed("missing choices[0].message.content".into()))?;

        Ok(text.trim().to_string())
    }
}
