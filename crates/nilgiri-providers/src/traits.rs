//! LLM provider trait — the seam between request handlers and upstream APIs.

use async_trait::async_trait;

use nilgiri_core::config::schema::AssistantConfig;
use nilgiri_core::{CompletionReply, Provider, ProxyError};

/// Prompt template and sampling parameters applied to each call.
#[derive(Clone, Debug)]
pub struct LlmRequestConfig {
    /// Domain instruction injected before the user prompt.
    pub system_prompt: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
}

impl Default for LlmRequestConfig {
    fn default() -> Self {
        LlmRequestConfig::from(&AssistantConfig::default())
    }
}

impl From<&AssistantConfig> for LlmRequestConfig {
    fn from(assistant: &AssistantConfig) -> Self {
        Self {
            system_prompt: assistant.system_prompt.clone(),
            max_tokens: assistant.max_tokens,
            temperature: assistant.temperature,
        }
    }
}

/// Trait that both upstream adapters implement.
///
/// An adapter yields exactly one of a normalized reply or a [`ProxyError`];
/// it never panics on a malformed upstream response.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Answer a single user prompt.
    async fn complete(&self, prompt: &str) -> Result<CompletionReply, ProxyError>;

    /// Which upstream this adapter talks to.
    fn provider(&self) -> Provider;

    /// Display name for logging.
    fn display_name(&self) -> &str {
        self.provider().display_name()
    }
}
