//! Error taxonomy for the proxy.
//!
//! Every failure on the request path is a [`ProxyError`]. Variants carry the
//! structured payload (provider, upstream status, truncated body); the
//! human-readable message is its `Display` impl and is only rendered at the
//! outermost boundary (the handler's JSON envelope or the CLI).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::types::{ApiVersion, Provider};

/// Coarse error class, carried across the HTTP boundary in `ErrorEnvelope::kind`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RequestValidation,
    Configuration,
    Transport,
    UpstreamProtocol,
    UpstreamApplication,
    EmptyContent,
    DiscoveryExhausted,
    Timeout,
}

/// A failure anywhere between the inbound request and the upstream answer.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ProxyError {
    #[error("Missing prompt")]
    MissingPrompt,

    #[error("Invalid request body")]
    InvalidBody,

    #[error("Request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("{credential} not configured")]
    NotConfigured { credential: &'static str },

    #[error("Failed to connect to {provider}: {cause}")]
    Transport { provider: Provider, cause: String },

    #[error("{provider} returned empty response ({status})")]
    EmptyResponse { provider: Provider, status: u16 },

    /// `snippet` holds at most the first 200 characters of the raw body.
    #[error("{provider} returned invalid JSON ({status}): {snippet}")]
    InvalidJson {
        provider: Provider,
        status: u16,
        snippet: String,
    },

    #[error("{provider} API Error ({status}): {message}")]
    Upstream {
        provider: Provider,
        status: u16,
        message: String,
    },

    /// Valid JSON that does not have the documented shape.
    #[error("{provider} returned unexpected {what}: {detail}")]
    UnexpectedShape {
        provider: Provider,
        what: &'static str,
        detail: String,
    },

    #[error("{provider} returned no content")]
    EmptyContent { provider: Provider },

    #[error("{0}")]
    DiscoveryExhausted(DiscoveryFailure),

    #[error("{provider} request exceeded {seconds}s deadline")]
    DeadlineExceeded { provider: Provider, seconds: u64 },
}

impl ProxyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProxyError::MissingPrompt
            | ProxyError::InvalidBody
            | ProxyError::BodyTooLarge { .. } => ErrorKind::RequestValidation,
            ProxyError::NotConfigured { .. } => ErrorKind::Configuration,
            ProxyError::Transport { .. } => ErrorKind::Transport,
            ProxyError::EmptyResponse { .. }
            | ProxyError::InvalidJson { .. }
            | ProxyError::UnexpectedShape { .. } => ErrorKind::UpstreamProtocol,
            ProxyError::Upstream { .. } => ErrorKind::UpstreamApplication,
            ProxyError::EmptyContent { .. } => ErrorKind::EmptyContent,
            ProxyError::DiscoveryExhausted(_) => ErrorKind::DiscoveryExhausted,
            ProxyError::DeadlineExceeded { .. } => ErrorKind::Timeout,
        }
    }

    /// HTTP status the request handler answers with.
    ///
    /// Upstream statuses are passed through only when they are error statuses;
    /// anything else (including a 200 with an unusable body) becomes 502.
    pub fn http_status(&self) -> u16 {
        match self {
            ProxyError::MissingPrompt | ProxyError::InvalidBody => 400,
            ProxyError::BodyTooLarge { .. } => 413,
            ProxyError::NotConfigured { .. } => 500,
            ProxyError::Transport { .. }
            | ProxyError::UnexpectedShape { .. }
            | ProxyError::EmptyContent { .. } => 502,
            ProxyError::EmptyResponse { status, .. }
            | ProxyError::InvalidJson { status, .. }
            | ProxyError::Upstream { status, .. } => upstream_or_bad_gateway(*status),
            ProxyError::DiscoveryExhausted(_) => 500,
            ProxyError::DeadlineExceeded { .. } => 504,
        }
    }
}

fn upstream_or_bad_gateway(status: u16) -> u16 {
    if (400..=599).contains(&status) {
        status
    } else {
        502
    }
}

// ─────────────────────────────────────────────
// Discovery failure report
// ─────────────────────────────────────────────

/// Everything observed while looking for a usable Gemini model.
///
/// Listing errors and the names seen per version are kept separate so the
/// message distinguishes an entitlement problem (models listed, none capable)
/// from a fetch failure.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiscoveryFailure {
    pub v1_error: Option<String>,
    pub v1beta_error: Option<String>,
    pub v1_models: Vec<String>,
    pub v1beta_models: Vec<String>,
}

impl DiscoveryFailure {
    fn error_for(&self, version: ApiVersion) -> Option<&str> {
        match version {
            ApiVersion::V1 => self.v1_error.as_deref(),
            ApiVersion::V1Beta => self.v1beta_error.as_deref(),
        }
    }

    fn models_for(&self, version: ApiVersion) -> &[String] {
        match version {
            ApiVersion::V1 => &self.v1_models,
            ApiVersion::V1Beta => &self.v1beta_models,
        }
    }
}

impl fmt::Display for DiscoveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No Gemini model supporting generateContent is available")?;
        for version in [ApiVersion::V1, ApiVersion::V1Beta] {
            if let Some(err) = self.error_for(version) {
                write!(f, "; {version} error: {err}")?;
            }
        }
        for version in [ApiVersion::V1, ApiVersion::V1Beta] {
            let models = self.models_for(version);
            if models.is_empty() {
                write!(f, "; {version} models: none")?;
            } else {
                write!(f, "; {version} models: {}", models.join(", "))?;
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(ProxyError::MissingPrompt.to_string(), "Missing prompt");
        assert_eq!(ProxyError::InvalidBody.to_string(), "Invalid request body");
        assert_eq!(
            ProxyError::NotConfigured { credential: "GROQ_API_KEY" }.to_string(),
            "GROQ_API_KEY not configured"
        );
        assert_eq!(
            ProxyError::EmptyResponse { provider: Provider::Gemini, status: 503 }.to_string(),
            "Gemini returned empty response (503)"
        );
        assert_eq!(
            ProxyError::Upstream {
                provider: Provider::Groq,
                status: 429,
                message: "Rate limit exceeded".into(),
            }
            .to_string(),
            "Groq API Error (429): Rate limit exceeded"
        );
        assert_eq!(
            ProxyError::EmptyContent { provider: Provider::Groq }.to_string(),
            "Groq returned no content"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ProxyError::MissingPrompt.http_status(), 400);
        assert_eq!(ProxyError::NotConfigured { credential: "X" }.http_status(), 500);
        let err = ProxyError::Transport { provider: Provider::Groq, cause: "refused".into() };
        assert_eq!(err.http_status(), 502);
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_body_too_large_is_validation_413() {
        let err = ProxyError::BodyTooLarge { limit: 65_536 };
        assert_eq!(err.to_string(), "Request body exceeds 65536 bytes");
        assert_eq!(err.http_status(), 413);
        assert_eq!(err.kind(), ErrorKind::RequestValidation);
    }

    #[test]
    fn test_unexpected_shape_is_protocol_502() {
        let err = ProxyError::UnexpectedShape {
            provider: Provider::Gemini,
            what: "model listing",
            detail: "`models` is a string".into(),
        };
        assert_eq!(
            err.to_string(),
            "Gemini returned unexpected model listing: `models` is a string"
        );
        assert_eq!(err.http_status(), 502);
        assert_eq!(err.kind(), ErrorKind::UpstreamProtocol);
    }

    #[test]
    fn test_empty_response_defaults_to_bad_gateway() {
        let ok = ProxyError::EmptyResponse { provider: Provider::Groq, status: 200 };
        assert_eq!(ok.http_status(), 502);
        let zero = ProxyError::EmptyResponse { provider: Provider::Groq, status: 0 };
        assert_eq!(zero.http_status(), 502);
        let unavailable = ProxyError::EmptyResponse { provider: Provider::Groq, status: 503 };
        assert_eq!(unavailable.http_status(), 503);
    }

    #[test]
    fn test_upstream_status_passthrough() {
        let err = ProxyError::Upstream {
            provider: Provider::Gemini,
            status: 403,
            message: "denied".into(),
        };
        assert_eq!(err.http_status(), 403);
        assert_eq!(err.kind(), ErrorKind::UpstreamApplication);
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_value(ErrorKind::DiscoveryExhausted).unwrap();
        assert_eq!(json, "discovery_exhausted");
    }

    #[test]
    fn test_discovery_failure_lists_both_versions() {
        let failure = DiscoveryFailure {
            v1_error: None,
            v1beta_error: Some("Failed to connect to Gemini: timeout".into()),
            v1_models: vec!["models/x-flash".into(), "models/embedding-001".into()],
            v1beta_models: vec![],
        };
        let msg = failure.to_string();
        assert!(msg.contains("v1 models: models/x-flash, models/embedding-001"));
        assert!(msg.contains("v1beta models: none"));
        assert!(msg.contains("v1beta error: Failed to connect to Gemini: timeout"));
        assert!(!msg.contains("v1 error"));
    }

    #[test]
    fn test_discovery_exhausted_status() {
        let err = ProxyError::DiscoveryExhausted(DiscoveryFailure::default());
        assert_eq!(err.http_status(), 500);
        assert!(err.to_string().contains("v1 models: none"));
    }
}
