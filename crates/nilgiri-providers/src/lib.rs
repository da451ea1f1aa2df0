//! Upstream LLM adapters for the Nilgiri assistant proxy.
//!
//! # Architecture
//!
//! - [`traits::LlmProvider`] — trait both adapters implement
//! - [`protocol`] — defensive body reading and error normalization shared by every call
//! - [`groq::GroqProvider`] — fixed-model chat completions
//! - [`gemini::GeminiProvider`] — per-request model discovery, then `generateContent`
//! - [`discovery`] — listing, ranking and the v1 → v1beta selection state machine
//! - [`http_provider::create_provider`] — builds an adapter from config

pub mod discovery;
pub mod gemini;
pub mod groq;
pub mod http_provider;
pub mod protocol;
pub mod traits;

// Re-export main types for convenience
pub use gemini::GeminiProvider;
pub use groq::GroqProvider;
pub use http_provider::{build_http_client, create_provider};
pub use traits::{LlmProvider, LlmRequestConfig};
