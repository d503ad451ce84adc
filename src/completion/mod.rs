//! Completion provider
//!
//! A single abstraction over a remote text-completion call. `complete`
//! returns `Some(text)` or `None`; a missing credential, network failure,
//! timeout, non-success status, or malformed payload all collapse to `None`
//! so the pipeline has one uniform fallback branch. Failure detail is logged,
//! never propagated.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::CompletionConfig;

/// Trait for completion providers
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a completion for `prompt`, or None when unavailable
    async fn complete(&self, prompt: &str) -> Option<String>;
}

/// OpenAI-compatible chat-completion client
///
/// Works against any endpoint speaking the `/chat/completions` protocol
/// (Groq by default). The credential is resolved from `OPENAI_API_KEY`,
/// falling back to `GROQ_API_KEY`; when neither is set every call returns
/// `None` and the pipeline degrades to its non-LLM fallbacks.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl OpenAiClient {
    /// Create a client with the credential resolved from the environment
    pub fn new(config: &CompletionConfig) -> Self {
        Self::with_credential(config, resolve_env_credential())
    }

    /// Create a client with an explicit (possibly absent) credential
    pub fn with_credential(config: &CompletionConfig, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Whether a credential is configured at all
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    async fn request(&self, api_key: &str, prompt: &str) -> anyhow::Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": "You are a helpful assistant."},
                {"role": "user", "content": prompt},
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("Response contained no choices"))?;
        Ok(content)
    }
}

fn resolve_env_credential() -> Option<String> {
    ["OPENAI_API_KEY", "GROQ_API_KEY"]
        .iter()
        .find_map(|key| std::env::var(key).ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Option<String> {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => {
                tracing::debug!("No completion credential configured, skipping LLM call");
                return None;
            }
        };

        match self.request(api_key, prompt).await {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!("Completion request failed: {}", e);
                None
            }
        }
    }
}
