//! Thin proxy to an OpenAI-compatible chat completions API.
//!
//! Upstream HTTP errors and timeouts are surfaced as retryable
//! [`AppError::Upstream`] errors, never retried here.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::ChatRequest;

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    config: Arc<AppConfig>,
}

impl ChatClient {
    pub fn new(http: reqwest::Client, config: Arc<AppConfig>) -> Self {
        Self { http, config }
    }

    /// Forward a role-tagged conversation upstream and return the single
    /// reply string.
    pub async fn complete(&self, request: ChatRequest) -> Result<String, AppError> {
        let api_key = self
            .config
            .chat_api_key
            .as_deref()
            .ok_or_else(|| AppError::Internal("chat API key not configured".into()))?;

        let payload = json!({
            "model": self.config.chat_model,
            "messages": self.build_messages(&request),
            "temperature": 0.2,
            "max_tokens": 800,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.chat_api_base))
            .bearer_auth(api_key)
            .json(&payload)
            .timeout(UPSTREAM_TIMEOUT)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("error connecting to chat API: {e}")))?;

        let status = response.status();
        if status.as_u16() >= 400 {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "upstream error {status}: {detail}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("invalid upstream response: {e}")))?;

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| AppError::Upstream("upstream response carried no reply".into()))
    }

    fn build_messages(&self, request: &ChatRequest) -> Vec<Value> {
        let mut messages = vec![json!({
            "role": "system",
            "content": self.config.chat_system_instruction,
        })];

        if request.messages.is_empty() {
            messages.push(json!({
                "role": "user",
                "content": self.config.chat_initial_greeting,
            }));
            return messages;
        }

        for message in &request.messages {
            if message.text.is_empty() {
                continue;
            }
            // The web client labels assistant turns "model".
            let role = match message.role.as_str() {
                "model" | "assistant" => "assistant",
                _ => "user",
            };
            messages.push(json!({ "role": role, "content": message.text }));
        }
        messages
    }
}
