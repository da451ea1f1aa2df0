//! `nilgiri status` — show configuration and provider status.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use nilgiri_core::config::schema::ProviderConfig;
use nilgiri_core::config::{load_config, Config};
use nilgiri_core::utils::mask_secret;
use nilgiri_core::Provider;

/// `path` is the resolved config file (see [`crate::helpers::resolve_config_path`]).
pub fn run(path: &Path) -> Result<()> {
    let config = load_config(Some(path));

    println!();
    println!("{}", "Nilgiri Assistant Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        path.display(),
        if path.exists() {
            "✓".green().to_string()
        } else {
            "(not found, using defaults)".red().to_string()
        }
    );
    println!("  {:<18} {}", "Server:".bold(), config.server.base_url());
    println!("  {:<18} {}", "Client target:".bold(), config.client_server_url());
    println!(
        "  {:<18} {}",
        "Timeouts:".bold(),
        format!(
            "per call {}s | per request {}s",
            config.http.request_timeout_secs, config.http.overall_deadline_secs
        )
        .dimmed()
    );
    println!(
        "  {:<18} {}",
        "Parameters:".bold(),
        format!(
            "temp: {} | max_tokens: {}",
            config.assistant.temperature, config.assistant.max_tokens
        )
        .dimmed()
    );

    println!();
    println!("  {}", "Providers:".bold());
    for provider in Provider::ALL {
        println!("    {:<20} {}", provider.display_name(), provider_line(&config, provider));
    }
    println!();

    Ok(())
}

fn endpoint(config: &Config, provider: Provider) -> &ProviderConfig {
    match provider {
        Provider::Groq => &config.providers.groq.endpoint,
        Provider::Gemini => &config.providers.gemini.endpoint,
    }
}

fn provider_line(config: &Config, provider: Provider) -> String {
    let endpoint = endpoint(config, provider);
    if !endpoint.is_configured() {
        return format!(
            "{}",
            format!("· not configured ({})", provider.credential_name()).dimmed()
        );
    }
    let detail = match provider {
        Provider::Groq => format!("model {}", config.providers.groq.model),
        Provider::Gemini => "model discovered per request".to_string(),
    };
    format!(
        "{} key {} | {}",
        "✓".green(),
        mask_secret(endpoint.api_key.trim()),
        detail.dimmed()
    )
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
