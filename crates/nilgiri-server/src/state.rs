//! Shared handler state: one adapter per configured provider and the
//! per-request deadline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use nilgiri_core::config::schema::ServerConfig;
use nilgiri_core::config::Config;
use nilgiri_core::{Provider, ProxyError};
use nilgiri_providers::{create_provider, LlmProvider};

pub struct AppState {
    providers: HashMap<Provider, Arc<dyn LlmProvider>>,
    deadline: Duration,
    body_limit: usize,
}

impl AppState {
    /// Empty state; register adapters with [`AppState::with_provider`].
    pub fn new(deadline: Duration) -> Self {
        AppState {
            providers: HashMap::new(),
            deadline,
            body_limit: ServerConfig::default().max_body_bytes,
        }
    }

    /// Build every provider whose credential is configured. Missing ones are
    /// reported per request as `<CREDENTIAL> not configured`.
    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        let mut state = AppState::new(Duration::from_secs(config.http.overall_deadline_secs))
            .with_body_limit(config.server.max_body_bytes);
        for provider in Provider::ALL {
            match create_provider(provider, config, client.clone()) {
                Ok(adapter) => state = state.with_provider(adapter),
                Err(e) => warn!(provider = provider.as_str(), "{e}; route will answer 500"),
            }
        }
        state
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn with_provider(mut self, adapter: Arc<dyn LlmProvider>) -> Self {
        self.providers.insert(adapter.provider(), adapter);
        self
    }

    /// Adapter for `provider`, or the configuration error to report.
    pub fn provider(&self, provider: Provider) -> Result<Arc<dyn LlmProvider>, ProxyError> {
        self.providers
            .get(&provider)
            .cloned()
            .ok_or(ProxyError::NotConfigured {
                credential: provider.credential_name(),
            })
    }

    pub fn is_configured(&self, provider: Provider) -> bool {
        self.providers.contains_key(&provider)
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Largest request body the handlers will read.
    pub fn body_limit(&self) -> usize {
        self.body_limit
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut configured: Vec<&str> = self.providers.keys().map(|p| p.as_str()).collect();
        configured.sort_unstable();
        f.debug_struct("AppState")
            .field("providers", &configured)
            .field("deadline", &self.deadline)
            .field("body_limit", &self.body_limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_skips_unconfigured() {
        let mut config = Config::default();
        config.providers.groq.endpoint.api_key = "gsk-1".into();

        let state = AppState::from_config(&config, reqwest::Client::new());
        assert!(state.is_configured(Provider::Groq));
        assert!(!state.is_configured(Provider::Gemini));
        assert_eq!(state.deadline(), Duration::from_secs(90));
        assert_eq!(state.body_limit(), 65_536);

        let err = state.provider(Provider::Gemini).err().unwrap();
        assert_eq!(err.to_string(), "GEMINI_API_KEY not configured");
    }
}
