//! Construction of the shared HTTP client and the provider adapters.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use nilgiri_core::config::schema::HttpConfig;
use nilgiri_core::config::Config;
use nilgiri_core::{Provider, ProxyError};

use crate::gemini::GeminiProvider;
use crate::groq::GroqProvider;
use crate::traits::LlmProvider;

/// Build the HTTP client shared by all adapters.
///
/// `request_timeout_secs` bounds each upstream call (connect + body).
pub fn build_http_client(config: &HttpConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.request_timeout_secs.min(10)))
        .build()
}

/// Build the adapter for `provider`.
///
/// Fails with [`ProxyError::NotConfigured`] when its credential is missing.
pub fn create_provider(
    provider: Provider,
    config: &Config,
    client: reqwest::Client,
) -> Result<Arc<dyn LlmProvider>, ProxyError> {
    let credential = provider.credential_name();
    let adapter: Arc<dyn LlmProvider> = match provider {
        Provider::Groq => {
            let groq = &config.providers.groq;
            if !groq.endpoint.is_configured() {
                return Err(ProxyError::NotConfigured { credential });
            }
            Arc::new(GroqProvider::new(client, groq, &config.assistant))
        }
        Provider::Gemini => {
            let gemini = &config.providers.gemini;
            if !gemini.endpoint.is_configured() {
                return Err(ProxyError::NotConfigured { credential });
            }
            Arc::new(GeminiProvider::new(client, gemini, &config.assistant))
        }
    };

    debug!(provider = provider.as_str(), "created LLM provider");
    Ok(adapter)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
