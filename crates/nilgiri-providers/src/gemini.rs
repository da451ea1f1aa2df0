//! Gemini adapter — model discovery followed by `generateContent`.
//!
//! Every call lists the available models (see [`crate::discovery`]), picks the
//! best one that supports content generation, and sends the prompt to that
//! model on the API version it was listed under.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use nilgiri_core::config::schema::{AssistantConfig, GeminiConfig};
use nilgiri_core::config::DiscoveryFallback;
use nilgiri_core::utils::truncate_string;
use nilgiri_core::{ApiVersion, CompletionReply, Provider, ProxyError};

use crate::discovery::{discover, ListedModel, ListingOutcome, ModelLister, SelectedModel};
use crate::protocol::{read_json, require_text};
use crate::traits::{LlmProvider, LlmRequestConfig};

/// Default Generative Language API host.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Decode a `GET /{version}/models` body.
///
/// A missing or null `models` field is an empty listing. Entries that do not
/// decode are skipped so the rest stay selectable; a listing where no entry
/// decodes is an error.
fn parse_listing(value: &Value) -> Result<Vec<ListedModel>, ProxyError> {
    let unexpected = |detail: String| ProxyError::UnexpectedShape {
        provider: Provider::Gemini,
        what: "model listing",
        detail,
    };

    let entries = match value {
        Value::Object(body) => match body.get("models") {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(entries)) => entries,
            Some(other) => return Err(unexpected(format!("`models` is {}", json_type(other)))),
        },
        other => return Err(unexpected(format!("body is {}", json_type(other)))),
    };

    let mut models = Vec::with_capacity(entries.len());
    let mut last_error = None;
    for entry in entries {
        match ListedModel::deserialize(entry) {
            Ok(model) => models.push(model),
            Err(e) => {
                warn!(
                    entry = %truncate_string(&entry.to_string(), 120),
                    error = %e,
                    "skipping malformed Gemini model entry"
                );
                last_error = Some(e.to_string());
            }
        }
    }

    match last_error {
        Some(e) if models.is_empty() => Err(unexpected(format!("no entry could be decoded ({e})"))),
        _ => Ok(models),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ─────────────────────────────────────────────
// GeminiProvider
// ─────────────────────────────────────────────

pub struct GeminiProvider {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    fallback: DiscoveryFallback,
    request: LlmRequestConfig,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_base", &self.api_base)
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(
        client: reqwest::Client,
        config: &GeminiConfig,
        assistant: &AssistantConfig,
    ) -> Self {
        let api_base = config
            .endpoint
            .api_base
            .clone()
            .unwrap_or_else(|| GEMINI_API_BASE.to_string());

        GeminiProvider {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: config.endpoint.api_key.clone(),
            fallback: config.discovery_fallback,
            request: LlmRequestConfig::from(assistant),
        }
    }

    fn models_url(&self, version: ApiVersion) -> String {
        format!("{}/{}/models", self.api_base, version)
    }

    fn generate_url(&self, model: &SelectedModel) -> String {
        format!(
            "{}/{}/models/{}:generateContent",
            self.api_base,
            model.version,
            model.bare_name()
        )
    }

    /// Fetch one version's model listing, applying the response protocol.
    pub async fn list_models(&self, version: ApiVersion) -> Result<Vec<ListedModel>, ProxyError> {
        let sent = self
            .client
            .get(self.models_url(version))
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await;

        let value = read_json(Provider::Gemini, sent).await?;
        parse_listing(&value)
    }

    /// The domain instruction is prepended to the user text: the request
    /// carries a single user turn.
    fn build_request(&self, prompt: &str) -> GenerateRequest {
        let text = if self.request.system_prompt.trim().is_empty() {
            prompt.to_string()
        } else {
            format!("{}\n\n{}", self.request.system_prompt, prompt)
        };

        GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text }],
            }],
            generation_config: GenerationConfig {
                temperature: self.request.temperature,
                max_output_tokens: self.request.max_tokens,
            },
        }
    }

    async fn generate(&self, model: &SelectedModel, prompt: &str) -> Result<String, ProxyError> {
        debug!(
            model = model.bare_name(),
            version = %model.version,
            "calling Gemini generateContent"
        );

        let sent = self
            .client
            .post(self.generate_url(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&self.build_request(prompt))
            .send()
            .await;

        let value = read_json(Provider::Gemini, sent).await?;
        let response: GenerateResponse = serde_json::from_value(value).unwrap_or_default();
        require_text(Provider::Gemini, response.text())
    }
}

#[async_trait]
impl ModelLister for GeminiProvider {
    async fn list(&self, version: ApiVersion) -> ListingOutcome {
        match self.list_models(version).await {
            Ok(models) => {
                debug!(version = %version, count = models.len(), "listed Gemini models");
                ListingOutcome::fetched(version, models)
            }
            Err(e) => {
                warn!(version = %version, error = %e, "Gemini model listing failed");
                ListingOutcome::failed(version, e.to_string())
            }
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn complete(&self, prompt: &str) -> Result<CompletionReply, ProxyError> {
        let model = discover(self, self.fallback)
            .await
            .map_err(ProxyError::DiscoveryExhausted)?;

        let text = self.generate(&model, prompt).await?;
        Ok(CompletionReply::new(text, Provider::Gemini)
            .with_model(model.bare_name(), model.version))
    }

    fn provider(&self) -> Provider {
        Provider::Gemini
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use nilgiri_core::config::schema::ProviderConfig;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_provider(api_base: &str, fallback: DiscoveryFallback) -> GeminiProvider {
        let config = GeminiConfig {
            endpoint: ProviderConfig {
                api_key: "AIza-test".to_string(),
                api_base: Some(api_base.to_string()),
            },
            discovery_fallback: fallback,
        };
        GeminiProvider::new(reqwest::Client::new(), &config, &AssistantConfig::default())
    }

    fn model(name: &str, methods: &[&str]) -> serde_json::Value {
        json!({"name": name, "supportedGenerationMethods": methods})
    }

    fn answer(text: &str) -> serde_json::Value {
        json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }]
        })
    }

    #[test]
    fn test_urls() {
        let provider = make_provider(
            "https://generativelanguage.googleapis.com/",
            DiscoveryFallback::WhenEmpty,
        );
        assert_eq!(
            provider.models_url(ApiVersion::V1Beta),
            "https://generativelanguage.googleapis.com/v1beta/models"
        );
        let selected = SelectedModel {
            version: ApiVersion::V1,
            name: "models/gemini-1.5-flash-8b".into(),
        };
        assert_eq!(
            provider.generate_url(&selected),
            "https://generativelanguage.googleapis.com/v1/models/gemini-1.5-flash-8b:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let provider = make_provider("http://unused", DiscoveryFallback::WhenEmpty);
        let body =
            serde_json::to_value(provider.build_request("What courses are offered?")).unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        let text = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("You represent Nilgiri College."));
        assert!(text.ends_with("What courses are offered?"));
        assert_eq!(body["generationConfig"]["temperature"], 0.5);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "Nilgiri "}, {"text": "College"}]}}]
        }))
        .unwrap();
        assert_eq!(response.text(), "Nilgiri College");

        let empty: GenerateResponse = serde_json::from_value(json!({"candidates": []})).unwrap();
        assert_eq!(empty.text(), "");
    }

    #[tokio::test]
    async fn test_complete_discovers_and_generates() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .and(query_param("key", "AIza-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [
                    model("models/gemini-1.5-pro", &["generateContent"]),
                    model("models/gemini-1.5-flash-8b", &["generateContent", "countTokens"]),
                    model("models/embedding-001", &["embedContent"]),
                ]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/models/gemini-1.5-flash-8b:generateContent"))
            .and(header("x-goog-api-key", "AIza-test"))
            .and(body_partial_json(json!({
                "generationConfig": {"temperature": 0.5, "maxOutputTokens": 1024}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(answer("Nilgiri College offers B.Sc. programmes.")),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = make_provider(&mock_server.uri(), DiscoveryFallback::WhenEmpty);
        let reply = provider.complete("What courses are offered?").await.unwrap();

        assert_eq!(reply.text, "Nilgiri College offers B.Sc. programmes.");
        assert_eq!(reply.provider, Provider::Gemini);
        assert_eq!(reply.model.as_deref(), Some("gemini-1.5-flash-8b"));
        assert_eq!(reply.version, Some(ApiVersion::V1));
    }

    #[tokio::test]
    async fn test_complete_uses_v1beta_when_v1_listing_fails() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": 404, "message": "Method not found.", "status": "NOT_FOUND"}
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [model("models/gemini-2.0-flash", &["generateContent"])]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(answer("Admissions open in May.")),
            )
            .mount(&mock_server)
            .await;

        let provider = make_provider(&mock_server.uri(), DiscoveryFallback::WhenEmpty);
        let reply = provider.complete("When do admissions open?").await.unwrap();

        assert_eq!(reply.text, "Admissions open in May.");
        assert_eq!(reply.version, Some(ApiVersion::V1Beta));
    }

    #[tokio::test]
    async fn test_non_capable_v1_listing_fails_without_v1beta() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [model("models/x-flash", &["countTokens"])]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [model("models/y-pro", &["generateContent"])]
            })))
            .expect(0)
            .mount(&mock_server)
            .await;

        let provider = make_provider(&mock_server.uri(), DiscoveryFallback::WhenEmpty);
        let err = provider.complete("hello").await.unwrap_err();

        assert!(matches!(err, ProxyError::DiscoveryExhausted(_)));
        let msg = err.to_string();
        assert!(msg.contains("v1 models: models/x-flash"));
        assert!(msg.contains("v1beta models: none"));
    }

    #[tokio::test]
    async fn test_discovery_failure_reports_both_errors() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": 403, "message": "API key not valid."}
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&mock_server)
            .await;

        let provider = make_provider(&mock_server.uri(), DiscoveryFallback::WhenEmpty);
        let err = provider.complete("hello").await.unwrap_err();
        let msg = err.to_string();

        assert!(msg.contains("v1 error: Gemini API Error (403): API key not valid."));
        assert!(msg.contains("v1beta error: Gemini returned empty response (200)"));
        assert!(msg.contains("v1 models: none"));
        assert!(msg.contains("v1beta models: none"));
        assert_eq!(err.http_status(), 500);
    }

    #[tokio::test]
    async fn test_empty_candidates_is_no_content() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [model("models/gemini-1.5-flash", &["generateContent"])]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"finishReason": "SAFETY"}]
            })))
            .mount(&mock_server)
            .await;

        let provider = make_provider(&mock_server.uri(), DiscoveryFallback::WhenEmpty);
        let err = provider.complete("hello").await.unwrap_err();
        assert_eq!(err, ProxyError::EmptyContent { provider: Provider::Gemini });
    }

    #[tokio::test]
    async fn test_generate_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [model("models/gemini-1.5-flash", &["generateContent"])]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"code": 429, "message": "Resource has been exhausted"}
            })))
            .mount(&mock_server)
            .await;

        let provider = make_provider(&mock_server.uri(), DiscoveryFallback::WhenEmpty);
        let err = provider.complete("hello").await.unwrap_err();
        assert_eq!(err.to_string(), "Gemini API Error (429): Resource has been exhausted");
        assert_eq!(err.http_status(), 429);
    }

    #[test]
    fn test_parse_listing_shapes() {
        assert!(parse_listing(&json!({})).unwrap().is_empty());
        assert!(parse_listing(&json!({"models": null})).unwrap().is_empty());

        let err = parse_listing(&json!({"models": "unexpected"})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Gemini returned unexpected model listing: `models` is a string"
        );

        let err = parse_listing(&json!([1, 2])).unwrap_err();
        assert_eq!(err.to_string(), "Gemini returned unexpected model listing: body is an array");

        let err = parse_listing(&json!({"models": [{"name": null}]})).unwrap_err();
        assert!(err.to_string().contains("no entry could be decoded"));
    }

    #[test]
    fn test_parse_listing_skips_bad_entries() {
        let models = parse_listing(&json!({
            "models": [
                {"name": null, "supportedGenerationMethods": ["generateContent"]},
                model("models/gemini-1.5-flash", &["generateContent"]),
                "not-an-object",
            ]
        }))
        .unwrap();
        assert_eq!(models, vec![ListedModel::new("models/gemini-1.5-flash", &["generateContent"])]);
    }

    #[tokio::test]
    async fn test_malformed_entry_does_not_hide_valid_models() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [
                    model("models/gemini-1.5-flash", &["generateContent"]),
                    {"name": null, "supportedGenerationMethods": ["generateContent"]},
                ]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer("Library opens at 8.")))
            .mount(&mock_server)
            .await;

        let provider = make_provider(&mock_server.uri(), DiscoveryFallback::WhenEmpty);
        let reply = provider.complete("Library hours?").await.unwrap();
        assert_eq!(reply.text, "Library opens at 8.");
        assert_eq!(reply.model.as_deref(), Some("gemini-1.5-flash"));
    }

    #[tokio::test]
    async fn test_unexpected_listings_are_reported_per_version() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": "x"})))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": "unexpected"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = make_provider(&mock_server.uri(), DiscoveryFallback::WhenEmpty);
        let err = provider.complete("hello").await.unwrap_err();
        let msg = err.to_string();

        assert!(matches!(err, ProxyError::DiscoveryExhausted(_)));
        assert!(msg.contains(
            "v1 error: Gemini returned unexpected model listing: `models` is a string"
        ));
        assert!(msg.contains("v1beta error: Gemini returned unexpected model listing"));
    }
}
