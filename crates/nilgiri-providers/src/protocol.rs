//! Defensive response handling shared by every upstream call site.
//!
//! Upstream bodies are read as raw text first and only then decoded, so an
//! empty body, an HTML error page, or a JSON body with an unexpected error
//! shape each produce a precise [`ProxyError`] instead of a decode panic.
//!
//! Order of checks (first failure wins):
//! 1. transport error → [`ProxyError::Transport`]
//! 2. empty body → [`ProxyError::EmptyResponse`]
//! 3. non-JSON body → [`ProxyError::InvalidJson`] (first 200 chars quoted)
//! 4. non-2xx status → [`ProxyError::Upstream`] with the extracted message
//! 5. empty answer text → [`ProxyError::EmptyContent`] (see [`require_text`])

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use nilgiri_core::utils::{head_chars, truncate_string, BODY_SNIPPET_CHARS};
use nilgiri_core::{Provider, ProxyError};

/// Turn the outcome of `RequestBuilder::send()` into a decoded JSON body.
pub async fn read_json(
    provider: Provider,
    sent: Result<reqwest::Response, reqwest::Error>,
) -> Result<Value, ProxyError> {
    let response = match sent {
        Ok(resp) => resp,
        Err(e) => {
            let err = transport_error(provider, e);
            error!(provider = provider.as_str(), error = %err, "HTTP request failed");
            return Err(err);
        }
    };

    let status = response.status().as_u16();
    let raw = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            let err = transport_error(provider, e);
            error!(
                provider = provider.as_str(),
                status,
                error = %err,
                "failed to read response body"
            );
            return Err(err);
        }
    };

    debug!(
        provider = provider.as_str(),
        status,
        body = %truncate_string(&raw, 120),
        "upstream response received"
    );

    decode_body(provider, status, &raw).inspect_err(|err| {
        error!(provider = provider.as_str(), status, error = %err, "upstream call failed");
    })
}

/// Steps 2–4 of the protocol, on an already-read body.
pub fn decode_body(provider: Provider, status: u16, raw: &str) -> Result<Value, ProxyError> {
    if raw.trim().is_empty() {
        return Err(ProxyError::EmptyResponse { provider, status });
    }

    let value: Value = serde_json::from_str(raw).map_err(|_| ProxyError::InvalidJson {
        provider,
        status,
        snippet: head_chars(raw, BODY_SNIPPET_CHARS).to_string(),
    })?;

    if !(200..300).contains(&status) {
        return Err(ProxyError::Upstream {
            provider,
            status,
            message: upstream_error_message(&value),
        });
    }

    Ok(value)
}

/// Reject an empty completion: a successful call with no text is a failure.
pub fn require_text(provider: Provider, text: String) -> Result<String, ProxyError> {
    if text.trim().is_empty() {
        Err(ProxyError::EmptyContent { provider })
    } else {
        Ok(text)
    }
}

/// Map a transport-level `reqwest` failure. The URL is stripped because the
/// Gemini listing URL carries the API key as a query parameter.
pub fn transport_error(provider: Provider, err: reqwest::Error) -> ProxyError {
    let cause = if err.is_timeout() {
        "request timed out".to_string()
    } else {
        describe_chain(&err.without_url())
    };
    ProxyError::Transport { provider, cause }
}

fn describe_chain(err: &dyn std::error::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !parts.iter().any(|p| p.contains(&text)) {
            parts.push(text);
        }
        source = cause.source();
    }
    parts.join(": ")
}

// ─────────────────────────────────────────────
// Upstream error shapes
// ─────────────────────────────────────────────

/// Known error bodies, tried in declaration order.
///
/// - `{"error": {"message": "..."}}` (OpenAI/Groq and Google APIs)
/// - `{"error": <anything>}`
#[derive(Deserialize)]
#[serde(untagged)]
enum UpstreamErrorBody {
    Detailed { error: ErrorDetail },
    Bare { error: Value },
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Best human-readable message in an error body; the whole body otherwise.
pub fn upstream_error_message(body: &Value) -> String {
    let candidate = match UpstreamErrorBody::deserialize(body) {
        Ok(UpstreamErrorBody::Detailed { error }) if !error.message.trim().is_empty() => {
            Some(error.message)
        }
        Ok(UpstreamErrorBody::Detailed { .. }) => body.get("error").map(render),
        Ok(UpstreamErrorBody::Bare { error }) if !error.is_null() => Some(render(&error)),
        _ => None,
    };

    candidate
        .filter(|msg| !msg.trim().is_empty())
        .unwrap_or_else(|| render(body))
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_empty_body() {
        let err = decode_body(Provider::Groq, 200, "").unwrap_err();
        assert_eq!(err, ProxyError::EmptyResponse { provider: Provider::Groq, status: 200 });
        assert_eq!(err.to_string(), "Groq returned empty response (200)");
        assert_eq!(err.http_status(), 502);
    }

    #[test]
    fn test_invalid_json_is_truncated_to_200_chars() {
        let raw = format!("<html>{}</html>", "a".repeat(400));
        let err = decode_body(Provider::Gemini, 500, &raw).unwrap_err();
        let expected_snippet: String = raw.chars().take(200).collect();
        assert_eq!(
            err.to_string(),
            format!("Gemini returned invalid JSON (500): {expected_snippet}")
        );
        assert!(!err.to_string().contains("</html>"));
    }

    #[test]
    fn test_invalid_json_short_body_quoted_whole() {
        let err = decode_body(Provider::Groq, 200, "Bad Gateway").unwrap_err();
        assert_eq!(err.to_string(), "Groq returned invalid JSON (200): Bad Gateway");
    }

    #[test]
    fn test_error_status_with_nested_message() {
        let raw = r#"{"error": {"message": "Invalid API Key", "type": "invalid_request_error"}}"#;
        let err = decode_body(Provider::Groq, 401, raw).unwrap_err();
        assert_eq!(err.to_string(), "Groq API Error (401): Invalid API Key");
        assert_eq!(err.http_status(), 401);
    }

    #[test]
    fn test_success_passes_body_through() {
        let value = decode_body(Provider::Groq, 200, r#"{"choices": []}"#).unwrap();
        assert_eq!(value, json!({"choices": []}));
    }

    #[test]
    fn test_error_message_precedence() {
        assert_eq!(
            upstream_error_message(&json!({"error": {"message": "quota", "code": 429}})),
            "quota"
        );
        assert_eq!(
            upstream_error_message(&json!({"error": "model_not_found"})),
            "model_not_found"
        );
        assert_eq!(
            upstream_error_message(&json!({"error": {"code": 500}})),
            r#"{"code":500}"#
        );
        assert_eq!(
            upstream_error_message(&json!({"error": {"message": ""}, "detail": "x"})),
            r#"{"message":""}"#
        );
        assert_eq!(
            upstream_error_message(&json!({"detail": "Not Found"})),
            r#"{"detail":"Not Found"}"#
        );
        assert_eq!(
            upstream_error_message(&json!({"error": null, "status": 503})),
            r#"{"error":null,"status":503}"#
        );
        assert_eq!(upstream_error_message(&json!("plain")), "plain");
    }

    #[test]
    fn test_require_text() {
        assert_eq!(require_text(Provider::Groq, "hi".into()).unwrap(), "hi");
        let err = require_text(Provider::Gemini, "  \n".into()).unwrap_err();
        assert_eq!(err.to_string(), "Gemini returned no content");
    }

    #[tokio::test]
    async fn test_read_json_transport_failure() {
        let client = reqwest::Client::new();
        let sent = client.get("http://127.0.0.1:1/models?key=secret").send().await;
        let err = read_json(Provider::Gemini, sent).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to connect to Gemini: "));
        assert!(!msg.contains("secret"));
    }

    #[tokio::test]
    async fn test_read_json_from_server() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string(""))
            .mount(&mock_server)
            .await;

        let sent = reqwest::Client::new().get(mock_server.uri()).send().await;
        let err = read_json(Provider::Groq, sent).await.unwrap_err();
        assert_eq!(err.to_string(), "Groq returned empty response (503)");
        assert_eq!(err.http_status(), 503);
    }
}
