//! Config loader — reads `~/.nilgiri/config.json`, merges env vars, and
//! strips legacy keys.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.nilgiri/config.json`
//! 3. Environment variables `NILGIRI_<SECTION>__<FIELD>` (override JSON)
//! 4. `GROQ_API_KEY` / `GEMINI_API_KEY`, only for keys still unset

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{Config, DiscoveryFallback, ProviderConfig};

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path (or `path`) + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    apply_env_overrides(load_config_from_path(&config_path))
}

/// Load config from a specific file path, without env overrides.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    let mut raw: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return Config::default();
        }
    };

    strip_public_credentials(&mut raw);

    match serde_json::from_value(raw) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to deserialize config: {}", e);
            Config::default()
        }
    }
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Drop client-side Groq credentials from older configs.
///
/// Keys that were shipped to browsers (`publicGroqApiKey`,
/// `providers.groq.publicApiKey`) are never used: every call goes through the
/// server-side credential.
fn strip_public_credentials(raw: &mut serde_json::Value) {
    if let Some(root) = raw.as_object_mut() {
        if root.remove("publicGroqApiKey").is_some() {
            warn!("Ignoring publicGroqApiKey: direct client calls to Groq are not supported");
        }
    }
    if let Some(groq) = raw
        .get_mut("providers")
        .and_then(|p| p.get_mut("groq"))
        .and_then(|g| g.as_object_mut())
    {
        if groq.remove("publicApiKey").is_some() {
            warn!(
                "Ignoring providers.groq.publicApiKey: direct client calls to Groq are not supported"
            );
        }
    }
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `NILGIRI_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `NILGIRI_PROVIDERS__<NAME>__API_KEY` → `providers.<name>.api_key`
/// - `NILGIRI_PROVIDERS__<NAME>__API_BASE` → `providers.<name>.api_base`
/// - `NILGIRI_PROVIDERS__GROQ__MODEL` → `providers.groq.model`
/// - `NILGIRI_PROVIDERS__GEMINI__DISCOVERY_FALLBACK` → `whenEmpty` | `whenNoneCapable`
/// - `NILGIRI_SERVER__HOST` / `NILGIRI_SERVER__PORT` / `NILGIRI_SERVER__MAX_BODY_BYTES`
/// - `NILGIRI_HTTP__REQUEST_TIMEOUT_SECS` / `NILGIRI_HTTP__OVERALL_DEADLINE_SECS`
/// - `NILGIRI_CLIENT__SERVER_URL`
fn apply_env_overrides(mut config: Config) -> Config {
    apply_provider_env(&mut config.providers.groq.endpoint, "GROQ");
    apply_provider_env(&mut config.providers.gemini.endpoint, "GEMINI");

    if let Ok(val) = std::env::var("NILGIRI_PROVIDERS__GROQ__MODEL") {
        config.providers.groq.model = val;
    }
    if let Ok(val) = std::env::var("NILGIRI_PROVIDERS__GEMINI__DISCOVERY_FALLBACK") {
        match serde_json::from_value::<DiscoveryFallback>(serde_json::Value::String(val.clone())) {
            Ok(policy) => config.providers.gemini.discovery_fallback = policy,
            Err(_) => warn!("Unknown discovery fallback policy '{}', keeping default", val),
        }
    }

    // Conventional names, used only when nothing more specific is set
    fill_from_env(&mut config.providers.groq.endpoint, "GROQ_API_KEY");
    fill_from_env(&mut config.providers.gemini.endpoint, "GEMINI_API_KEY");

    if let Ok(val) = std::env::var("NILGIRI_SERVER__HOST") {
        config.server.host = val;
    }
    if let Ok(val) = std::env::var("NILGIRI_SERVER__PORT") {
        if let Ok(p) = val.parse::<u16>() {
            config.server.port = p;
        }
    }
    if let Ok(val) = std::env::var("NILGIRI_SERVER__MAX_BODY_BYTES") {
        if let Ok(n) = val.parse::<usize>() {
            config.server.max_body_bytes = n;
        }
    }

    if let Ok(val) = std::env::var("NILGIRI_HTTP__REQUEST_TIMEOUT_SECS") {
        if let Ok(n) = val.parse::<u64>() {
            config.http.request_timeout_secs = n;
        }
    }
    if let Ok(val) = std::env::var("NILGIRI_HTTP__OVERALL_DEADLINE_SECS") {
        if let Ok(n) = val.parse::<u64>() {
            config.http.overall_deadline_secs = n;
        }
    }

    if let Ok(val) = std::env::var("NILGIRI_CLIENT__SERVER_URL") {
        config.client.server_url = Some(val);
    }

    config
}

/// Apply env var overrides for a single provider.
fn apply_provider_env(provider: &mut ProviderConfig, name: &str) {
    if let Ok(val) = std::env::var(format!("NILGIRI_PROVIDERS__{name}__API_KEY")) {
        provider.api_key = val;
    }
    if let Ok(val) = std::env::var(format!("NILGIRI_PROVIDERS__{name}__API_BASE")) {
        provider.api_base = Some(val);
    }
}

fn fill_from_env(provider: &mut ProviderConfig, var: &str) {
    if provider.is_configured() {
        return;
    }
    if let Ok(val) = std::env::var(var) {
        if !val.trim().is_empty() {
            provider.api_key = val;
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
