//! Configuration schema.
//!
//! Hierarchy: `Config` → `ProvidersConfig`, `AssistantConfig`, `ServerConfig`,
//! `HttpConfig`, `ClientConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.

use serde::{Deserialize, Serialize};

/// Instruction injected ahead of every user prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You represent Nilgiri College. \
Answer questions from students, parents and visitors about the college: its courses, \
admissions, fees, faculty, facilities, events and campus life. Be accurate, polite and concise. \
If you do not know an answer, say so and suggest contacting the Nilgiri College office \
instead of guessing.";

/// Groq model used for every completion.
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.1-8b-instant";

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.nilgiri/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub providers: ProvidersConfig,
    pub assistant: AssistantConfig,
    pub server: ServerConfig,
    pub http: HttpConfig,
    pub client: ClientConfig,
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Credential and endpoint for one upstream provider.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Custom API base URL (overrides the provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

impl ProviderConfig {
    /// Whether this provider has a configured API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Groq settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroqConfig {
    #[serde(flatten)]
    pub endpoint: ProviderConfig,
    /// Chat model identifier.
    pub model: String,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            endpoint: ProviderConfig::default(),
            model: DEFAULT_GROQ_MODEL.to_string(),
        }
    }
}

/// When the Gemini discovery consults the `v1beta` model listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiscoveryFallback {
    /// Only when `v1` lists no models at all.
    #[default]
    WhenEmpty,
    /// Also when `v1` lists models but none supports `generateContent`.
    WhenNoneCapable,
}

/// Gemini settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeminiConfig {
    #[serde(flatten)]
    pub endpoint: ProviderConfig,
    pub discovery_fallback: DiscoveryFallback,
}

/// All provider configurations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    pub groq: GroqConfig,
    pub gemini: GeminiConfig,
}

// ─────────────────────────────────────────────
// Assistant
// ─────────────────────────────────────────────

/// Prompt template and sampling parameters shared by both providers.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssistantConfig {
    /// Domain instruction injected before the user prompt.
    pub system_prompt: String,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
    /// Maximum tokens to generate per answer.
    pub max_tokens: u32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: 0.5,
            max_tokens: 1024,
        }
    }
}

// ─────────────────────────────────────────────
// Server / HTTP / Client
// ─────────────────────────────────────────────

/// Address the request handlers listen on.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body; larger bodies get a 413 envelope.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            max_body_bytes: 64 * 1024,
        }
    }
}

impl ServerConfig {
    /// Base URL clients use to reach this server.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Outbound call deadlines.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpConfig {
    /// Deadline for each individual upstream call.
    pub request_timeout_secs: u64,
    /// Deadline for a whole inbound request (discovery + generation).
    pub overall_deadline_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            overall_deadline_secs: 90,
        }
    }
}

/// Settings for the client dispatcher (`nilgiri ask` / `nilgiri chat`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// Proxy base URL; defaults to the local server address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
}

impl Config {
    /// Base URL of the proxy as seen by the client dispatcher.
    pub fn client_server_url(&self) -> String {
        self.client
            .server_url
            .clone()
            .unwrap_or_else(|| self.server.base_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.providers.groq.model, "llama-3.1-8b-instant");
        assert_eq!(config.assistant.temperature, 0.5);
        assert_eq!(config.assistant.max_tokens, 1024);
        assert!(config.assistant.system_prompt.contains("Nilgiri College"));
        assert_eq!(
            config.providers.gemini.discovery_fallback,
            DiscoveryFallback::WhenEmpty
        );
        assert!(!config.providers.groq.endpoint.is_configured());
        assert_eq!(config.server.max_body_bytes, 65_536);
    }

    #[test]
    fn test_flattened_provider_keys() {
        let config: Config = serde_json::from_str(
            r#"{"providers": {
                "groq": {"apiKey": "gsk-1", "model": "llama-3.3-70b-versatile"},
                "gemini": {"apiKey": "AIza-2", "discoveryFallback": "whenNoneCapable"}
            }}"#,
        )
        .unwrap();
        assert_eq!(config.providers.groq.endpoint.api_key, "gsk-1");
        assert_eq!(config.providers.groq.model, "llama-3.3-70b-versatile");
        assert!(config.providers.gemini.endpoint.is_configured());
        assert_eq!(
            config.providers.gemini.discovery_fallback,
            DiscoveryFallback::WhenNoneCapable
        );
    }

    #[test]
    fn test_blank_key_is_not_configured() {
        let provider = ProviderConfig {
            api_key: "   ".into(),
            api_base: None,
        };
        assert!(!provider.is_configured());
    }

    #[test]
    fn test_client_server_url() {
        let mut config = Config::default();
        assert_eq!(config.client_server_url(), "http://127.0.0.1:8787");
        config.client.server_url = Some("https://assist.example.edu".into());
        assert_eq!(config.client_server_url(), "https://assist.example.edu");
    }
}
