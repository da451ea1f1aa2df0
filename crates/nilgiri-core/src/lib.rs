//! Core building blocks for the Nilgiri assistant proxy.
//!
//! - [`types`] — provider tags, API versions, reply/error envelopes, wire types
//! - [`error`] — the [`error::ProxyError`] taxonomy and its HTTP mapping
//! - [`config`] — typed configuration, file loading, env overrides
//! - [`utils`] — data paths and string helpers

pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use error::{ErrorKind, ProxyError};
pub use types::{ApiVersion, CompletionReply, ErrorEnvelope, Provider};
