//! `nilgiri serve` — build the adapters and run the proxy server.
//!
//! Startup sequence:
//! 1. Build the shared HTTP client (per-call timeout)
//! 2. Build one adapter per configured provider
//! 3. Bind and run until Ctrl+C

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::{info, warn};

use nilgiri_core::config::Config;
use nilgiri_core::Provider;
use nilgiri_providers::build_http_client;
use nilgiri_server::{start_server, AppState};

pub async fn run(config: Config) -> Result<()> {
    let client = build_http_client(&config.http).context("failed to build HTTP client")?;
    let state = AppState::from_config(&config, client);

    let configured: Vec<&str> = Provider::ALL
        .iter()
        .filter(|p| state.is_configured(**p))
        .map(|p| p.as_str())
        .collect();
    if configured.is_empty() {
        warn!("no provider credentials configured; every prompt will fail with 500");
    }

    println!();
    println!("{}", "Nilgiri Assistant proxy".cyan().bold());
    println!("  {:<12} {}", "Listening:".bold(), config.server.base_url());
    println!(
        "  {:<12} {}",
        "Providers:".bold(),
        if configured.is_empty() {
            "none".red().to_string()
        } else {
            configured.join(", ")
        }
    );
    println!();

    let server = start_server(state, &config.server)
        .with_context(|| format!("failed to bind {}", config.server.base_url()))?;

    server.await.context("proxy server terminated")?;
    info!("proxy server stopped");
    Ok(())
}
