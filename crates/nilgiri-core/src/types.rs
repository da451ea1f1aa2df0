//! Core types shared by the adapters, the HTTP handlers, and the dispatcher.
//!
//! The chat-completion wire types model the OpenAI-compatible format spoken by
//! Groq. Gemini's request/response shapes are private to its adapter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ErrorKind;

// ─────────────────────────────────────────────
// Provider tag
// ─────────────────────────────────────────────

/// An upstream LLM service the proxy can route a prompt to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Groq,
    Gemini,
}

impl Provider {
    /// All providers, in the order they are listed by `status`.
    pub const ALL: [Provider; 2] = [Provider::Groq, Provider::Gemini];

    /// Wire tag (`"groq"` / `"gemini"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Groq => "groq",
            Provider::Gemini => "gemini",
        }
    }

    /// Human-readable name used in error messages and logs.
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Groq => "Groq",
            Provider::Gemini => "Gemini",
        }
    }

    /// Name of the server-side credential reported when it is missing.
    pub fn credential_name(self) -> &'static str {
        match self {
            Provider::Groq => "GROQ_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }

    /// Path of the request handler serving this provider.
    pub fn endpoint_path(self) -> &'static str {
        match self {
            Provider::Groq => "/api/groq",
            Provider::Gemini => "/api/gemini",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "groq" => Ok(Provider::Groq),
            "gemini" | "google" => Ok(Provider::Gemini),
            other => Err(format!(
                "unknown provider '{other}' (expected 'groq' or 'gemini')"
            )),
        }
    }
}

// ─────────────────────────────────────────────
// Gemini API version
// ─────────────────────────────────────────────

/// Gemini REST API version. `V1` is always tried first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiVersion {
    #[serde(rename = "v1")]
    V1,
    #[serde(rename = "v1beta")]
    V1Beta,
}

impl ApiVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V1Beta => "v1beta",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────
// Envelopes
// ─────────────────────────────────────────────

/// Body of an inbound request handler call.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PromptRequest {
    pub prompt: String,
}

/// Normalized answer returned by every adapter and sent to clients as-is.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompletionReply {
    pub text: String,
    pub provider: Provider,
    /// Model that produced the answer (Gemini only: it is discovered per request).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// API version the model was served from (Gemini only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<ApiVersion>,
}

impl CompletionReply {
    pub fn new(text: impl Into<String>, provider: Provider) -> Self {
        CompletionReply {
            text: text.into(),
            provider,
            model: None,
            version: None,
        }
    }

    /// Attach the model/version metadata of a discovered Gemini model.
    pub fn with_model(mut self, model: impl Into<String>, version: ApiVersion) -> Self {
        self.model = Some(model.into());
        self.version = Some(version);
        self
    }
}

/// Error envelope: `{ "error": "...", "kind": "..." }`.
///
/// `kind` is additive; older clients only read `error`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

// ─────────────────────────────────────────────
// Chat completions (OpenAI-compatible, used by Groq)
// ─────────────────────────────────────────────

/// A chat message in the OpenAI format.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System { content: String },
    User { content: String },
    Assistant { content: String },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }
}

/// Request body for an OpenAI-compatible chat completion API.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Chat completion response. Every field is optional: a malformed success
/// body must degrade to "no content", never to a decode failure.
#[derive(Debug, Default, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<AssistantMessage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Content of the first choice, or an empty string.
    pub fn first_content(&self) -> &str {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
            .unwrap_or_default()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
