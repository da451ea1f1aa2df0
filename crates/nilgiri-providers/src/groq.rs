//! Groq adapter for the OpenAI-compatible `/chat/completions` endpoint.
//!
//! No discovery: the model is fixed by configuration. Each call sends the
//! domain instruction as a system message followed by the user's prompt.

use async_trait::async_trait;
use tracing::debug;

use nilgiri_core::config::schema::{AssistantConfig, GroqConfig};
use nilgiri_core::types::{ChatCompletionRequest, ChatCompletionResponse, Message};
use nilgiri_core::{CompletionReply, Provider, ProxyError};

use crate::protocol::{read_json, require_text};
use crate::traits::{LlmProvider, LlmRequestConfig};

/// Default Groq API base.
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

// ─────────────────────────────────────────────
// GroqProvider
// ─────────────────────────────────────────────

pub struct GroqProvider {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.groq.com/openai/v1"`).
    api_base: String,
    /// API key for Bearer authentication.
    api_key: String,
    /// Chat model identifier.
    model: String,
    request: LlmRequestConfig,
}

impl std::fmt::Debug for GroqProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqProvider")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl GroqProvider {
    /// Create a Groq adapter.
    ///
    /// # Arguments
    /// * `client`    — shared HTTP client (carries the per-call timeout)
    /// * `config`    — credential, optional API base, model
    /// * `assistant` — system instruction and sampling parameters
    pub fn new(client: reqwest::Client, config: &GroqConfig, assistant: &AssistantConfig) -> Self {
        let api_base = config
            .endpoint
            .api_base
            .clone()
            .unwrap_or_else(|| GROQ_API_BASE.to_string());

        GroqProvider {
            client,
            api_base,
            api_key: config.endpoint.api_key.clone(),
            model: config.model.clone(),
            request: LlmRequestConfig::from(assistant),
        }
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }

    fn build_request(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(self.request.system_prompt.clone()),
                Message::user(prompt),
            ],
            temperature: self.request.temperature,
            max_tokens: self.request.max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    async fn complete(&self, prompt: &str) -> Result<CompletionReply, ProxyError> {
        debug!(
            provider = "groq",
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "calling Groq chat completions"
        );

        let sent = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&self.build_request(prompt))
            .send()
            .await;

        let value = read_json(Provider::Groq, sent).await?;
        let response: ChatCompletionResponse = serde_json::from_value(value).unwrap_or_default();
        let text = require_text(Provider::Groq, response.first_content().to_string())?;

        Ok(CompletionReply::new(text, Provider::Groq))
    }

    fn provider(&self) -> Provider {
        Provider::Groq
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
