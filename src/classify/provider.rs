//! LLM Provider Backends
//!
//! The classifier talks to a language model through the `LlmProvider`
//! trait: a local Ollama instance or any OpenAI-compatible endpoint.
//! Both backends are shaped for audit judgments rather than chat:
//! sampling is pinned to temperature 0.0 so repeat runs over the same
//! policy produce the same labels, responses are requested as JSON, and
//! requests carry a hard timeout so a stalled backend surfaces as a
//! retryable error instead of hanging the audit.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

/// A judgment call is one prompt and one bounded response; anything
/// slower than this is treated as a failed attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, model: &str, prompt: String, system: Option<String>) -> Result<String>;
}

pub struct OllamaProvider {
    client: ollama_rs::Ollama,
}

impl OllamaProvider {
    pub fn new(client: ollama_rs::Ollama) -> Self {
        Self { client }
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new(ollama_rs::Ollama::default())
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn generate(&self, model: &str, prompt: String, system: Option<String>) -> Result<String> {
        use ollama_rs::generation::chat::{request::ChatMessageRequest, ChatMessage};
        use ollama_rs::models::ModelOptions;

        let mut messages = Vec::new();
        if let Some(sys) = system {
            messages.push(ChatMessage::system(sys));
        }
        messages.push(ChatMessage::user(prompt));

        let request = ChatMessageRequest::new(model.to_string(), messages)
            .options(ModelOptions::default().temperature(0.0));

        let res = self
            .client
            .send_chat_messages(request)
            .await
            .with_context(|| format!("Ollama judgment request failed for model '{model}'"))?;

        Ok(res.message.content)
    }
}

pub struct OpenAICompatibleProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAICompatibleProvider {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url,
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Request body for one coverage judgment against an OpenAI-compatible
/// endpoint: deterministic sampling and a JSON-object response, since the
/// caller parses a `{coverage, justification}` payload out of the reply.
fn judgment_body(model: &str, prompt: String, system: Option<String>) -> serde_json::Value {
    let mut messages = Vec::new();
    if let Some(sys) = system {
        messages.push(json!({ "role": "system", "content": sys }));
    }
    messages.push(json!({ "role": "user", "content": prompt }));

    json!({
        "model": model,
        "messages": messages,
        "temperature": 0.0,
        "response_format": { "type": "json_object" },
    })
}

#[async_trait]
impl LlmProvider for OpenAICompatibleProvider {
    async fn generate(&self, model: &str, prompt: String, system: Option<String>) -> Result<String> {
        let endpoint = self.endpoint();
        let mut request = self
            .client
            .post(&endpoint)
            .json(&judgment_body(model, prompt, system));

        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request
            .send()
            .await
            .with_context(|| format!("Judgment request to {endpoint} failed"))?
            .error_for_status()
            .with_context(|| format!("Judgment request to {endpoint} rejected"))?;

        let reply: serde_json::Value = res
            .json()
            .await
            .with_context(|| format!("Non-JSON reply from {endpoint}"))?;

        let content = reply
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .with_context(|| format!("Reply from {endpoint} carried no message content"))?;

        Ok(content.to_string())
    }
}
