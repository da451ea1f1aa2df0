//! Request handlers — one route per provider plus a health check.
//!
//! Bodies are read from the raw payload under [`AppState::body_limit`], so a
//! malformed or oversized payload still maps to the JSON envelope
//! (`{"error": "Invalid request body"}`, 413 `{"error": "Request body exceeds …"}`)
//! rather than actix's default extractor error.

use std::time::Instant;

use actix_web::http::StatusCode;
use actix_web::{get, post, web, HttpResponse, Responder};
use futures_util::StreamExt;
use serde_json::{json, Value};
use tracing::{debug, error, info};

use nilgiri_core::{CompletionReply, ErrorEnvelope, Provider, ProxyError};

use crate::state::AppState;

#[post("/groq")]
async fn groq(state: web::Data<AppState>, payload: web::Payload) -> HttpResponse {
    dispatch(&state, Provider::Groq, payload).await
}

#[post("/gemini")]
async fn gemini(state: web::Data<AppState>, payload: web::Payload) -> HttpResponse {
    dispatch(&state, Provider::Gemini, payload).await
}

async fn dispatch(state: &AppState, provider: Provider, payload: web::Payload) -> HttpResponse {
    let started = Instant::now();
    let result = match read_body(payload, state.body_limit()).await {
        Ok(body) => answer(state, provider, &body).await,
        Err(e) => Err(e),
    };
    debug!(
        provider = provider.as_str(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request finished"
    );
    respond(provider, result)
}

#[get("/health")]
async fn health(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "providers": {
            "groq": state.is_configured(Provider::Groq),
            "gemini": state.is_configured(Provider::Gemini),
        }
    }))
}

/// Register the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(groq)
            .service(gemini)
            .service(health),
    );
}

/// Validate the body, pick the adapter, and run it under the request deadline.
pub async fn answer(
    state: &AppState,
    provider: Provider,
    body: &[u8],
) -> Result<CompletionReply, ProxyError> {
    let prompt = extract_prompt(body)?;
    let adapter = state.provider(provider)?;

    let deadline = state.deadline();
    match tokio::time::timeout(deadline, adapter.complete(&prompt)).await {
        Ok(result) => result,
        Err(_) => Err(ProxyError::DeadlineExceeded {
            provider,
            seconds: deadline.as_secs(),
        }),
    }
}

/// Collect the request body, refusing anything over `limit` bytes.
async fn read_body(mut payload: web::Payload, limit: usize) -> Result<web::BytesMut, ProxyError> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|_| ProxyError::InvalidBody)?;
        if body.len() + chunk.len() > limit {
            return Err(ProxyError::BodyTooLarge { limit });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Parse `{ "prompt": "<non-blank string>" }`.
pub fn extract_prompt(body: &[u8]) -> Result<String, ProxyError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| ProxyError::InvalidBody)?;
    match value.get("prompt").and_then(Value::as_str) {
        Some(prompt) if !prompt.trim().is_empty() => Ok(prompt.to_string()),
        _ => Err(ProxyError::MissingPrompt),
    }
}

fn respond(provider: Provider, result: Result<CompletionReply, ProxyError>) -> HttpResponse {
    match result {
        Ok(reply) => {
            info!(
                provider = provider.as_str(),
                model = reply.model.as_deref().unwrap_or("-"),
                chars = reply.text.len(),
                "prompt answered"
            );
            HttpResponse::Ok().json(reply)
        }
        Err(err) => {
            let status = StatusCode::from_u16(err.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            error!(
                provider = provider.as_str(),
                status = status.as_u16(),
                kind = ?err.kind(),
                error = %err,
                "prompt failed"
            );
            HttpResponse::build(status).json(ErrorEnvelope {
                error: err.to_string(),
                kind: Some(err.kind()),
            })
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
