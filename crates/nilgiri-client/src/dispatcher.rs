//! Client-side dispatcher for the proxy endpoints.
//!
//! The server already normalizes upstream failures, so only a reduced check
//! sequence is applied here: empty body, JSON decode, status/error envelope,
//! empty answer text.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use nilgiri_core::utils::{head_chars, BODY_SNIPPET_CHARS};
use nilgiri_core::{CompletionReply, ErrorKind, Provider};

/// Text placed before the visitor's question on every dispatch.
const PROMPT_PREAMBLE: &str =
    "A visitor to the Nilgiri College website asks the following question. \
     Answer it clearly and briefly.";

/// Wrap a visitor's question with the fixed preamble.
pub fn wrap_prompt(prompt: &str) -> String {
    format!("{PROMPT_PREAMBLE}\n\nQuestion: {}", prompt.trim())
}

/// A failed dispatch, ready for display.
///
/// `status` is `None` when no HTTP response was received.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("{message}")]
pub struct DispatchError {
    pub kind: ErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl DispatchError {
    fn new(kind: ErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        DispatchError {
            kind,
            status,
            message: message.into(),
        }
    }
}

/// Sends prompts to a running proxy server.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    client: reqwest::Client,
    base_url: String,
}

impl Dispatcher {
    /// `base_url` is the server origin, e.g. `http://127.0.0.1:8787`.
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Dispatcher { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint_url(&self, provider: Provider) -> String {
        format!("{}{}", self.base_url, provider.endpoint_path())
    }

    /// Ask `provider` a question through the proxy.
    pub async fn ask(
        &self,
        provider: Provider,
        prompt: &str,
    ) -> Result<CompletionReply, DispatchError> {
        let url = self.endpoint_url(provider);
        debug!(provider = provider.as_str(), url = %url, "dispatching prompt");

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "prompt": wrap_prompt(prompt) }))
            .send()
            .await
            .map_err(|e| {
                warn!(provider = provider.as_str(), error = %e, "proxy unreachable");
                DispatchError::new(
                    ErrorKind::Transport,
                    None,
                    format!("Could not reach the assistant server: {}", e.without_url()),
                )
            })?;

        let status = response.status().as_u16();
        let raw = response.text().await.map_err(|e| {
            DispatchError::new(
                ErrorKind::Transport,
                Some(status),
                format!("Failed to read the assistant response: {}", e.without_url()),
            )
        })?;

        interpret(status, &raw)
    }
}

/// Reduced response checks applied to a proxy reply.
fn interpret(status: u16, raw: &str) -> Result<CompletionReply, DispatchError> {
    if raw.trim().is_empty() {
        return Err(DispatchError::new(
            ErrorKind::UpstreamProtocol,
            Some(status),
            format!("Empty response from server ({status})"),
        ));
    }

    let value: Value = serde_json::from_str(raw).map_err(|_| {
        DispatchError::new(
            ErrorKind::UpstreamProtocol,
            Some(status),
            format!(
                "Invalid response from server ({status}): {}",
                head_chars(raw, BODY_SNIPPET_CHARS)
            ),
        )
    })?;

    if !(200..300).contains(&status) {
        return Err(envelope_error(status, &value));
    }

    match serde_json::from_value::<CompletionReply>(value) {
        Ok(reply) if !reply.text.trim().is_empty() => Ok(reply),
        _ => Err(DispatchError::new(
            ErrorKind::EmptyContent,
            Some(status),
            "No response text from server",
        )),
    }
}

/// Read `{error, kind?}`. Unknown kinds fall back to a status-based guess.
fn envelope_error(status: u16, value: &Value) -> DispatchError {
    let message = value
        .get("error")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Request failed ({status})"));

    let kind = value
        .get("kind")
        .cloned()
        .and_then(|k| serde_json::from_value::<ErrorKind>(k).ok())
        .unwrap_or(match status {
            400 => ErrorKind::RequestValidation,
            504 => ErrorKind::Timeout,
            _ => ErrorKind::UpstreamApplication,
        });

    DispatchError::new(kind, Some(status), message)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
