//! Nilgiri CLI — entry point.
//!
//! # Commands
//!
//! - `nilgiri serve` — run the proxy server
//! - `nilgiri ask -p gemini "question"` — single-shot dispatch
//! - `nilgiri chat -p groq` — interactive REPL over the dispatcher
//! - `nilgiri status` — show configuration and provider status
//! - `nilgiri onboard` — write a default config file

mod helpers;
mod onboard;
mod repl;
mod serve;
mod status;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use nilgiri_client::Dispatcher;
use nilgiri_core::config::{load_config, Config};
use nilgiri_core::Provider;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Nilgiri College assistant: LLM proxy server and client
#[derive(Parser)]
#[command(name = "nilgiri", version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.nilgiri/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the proxy server
    Serve {
        /// Override the bind host
        #[arg(long)]
        host: Option<String>,

        /// Override the bind port
        #[arg(long)]
        port: Option<u16>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Ask a single question through the proxy
    Ask {
        /// Provider to route to (groq or gemini)
        #[arg(short, long, default_value = "gemini")]
        provider: Provider,

        /// Proxy server URL (defaults to client.serverUrl or the local server)
        #[arg(long)]
        server: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,

        /// The question to ask
        prompt: String,
    },

    /// Interactive chat through the proxy
    Chat {
        /// Provider to route to (groq or gemini)
        #[arg(short, long, default_value = "gemini")]
        provider: Provider,

        /// Proxy server URL (defaults to client.serverUrl or the local server)
        #[arg(long)]
        server: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configuration and provider status
    Status,

    /// Write a default configuration file
    Onboard,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = helpers::resolve_config_path(cli.config.as_deref());

    match cli.command {
        Commands::Serve { host, port, logs } => {
            init_logging(logs, "info");
            let mut config = load_config(Some(&config_path));
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve::run(config).await
        }
        Commands::Ask {
            provider,
            server,
            logs,
            prompt,
        } => {
            init_logging(logs, "warn");
            let config = load_config(Some(&config_path));
            let dispatcher = build_dispatcher(&config, server)?;
            run_ask(&dispatcher, provider, &prompt).await
        }
        Commands::Chat {
            provider,
            server,
            logs,
        } => {
            init_logging(logs, "warn");
            let config = load_config(Some(&config_path));
            let dispatcher = build_dispatcher(&config, server)?;
            repl::run(&dispatcher, provider).await
        }
        Commands::Status => status::run(&config_path),
        Commands::Onboard => onboard::run(&config_path),
    }
}

// ─────────────────────────────────────────────
// Ask command
// ─────────────────────────────────────────────

async fn run_ask(dispatcher: &Dispatcher, provider: Provider, prompt: &str) -> Result<()> {
    info!(provider = provider.as_str(), server = dispatcher.base_url(), "asking");
    let reply = dispatcher
        .ask(provider, prompt)
        .await
        .with_context(|| format!("{provider} request via {} failed", dispatcher.base_url()))?;
    helpers::print_reply(&reply);
    Ok(())
}

/// Build a dispatcher whose HTTP timeout outlasts the server's own deadline.
pub fn build_dispatcher(config: &Config, server: Option<String>) -> Result<Dispatcher> {
    let timeout = Duration::from_secs(config.http.overall_deadline_secs + 10);
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client")?;
    let base_url = server.unwrap_or_else(|| config.client_server_url());
    Ok(Dispatcher::new(client, base_url))
}

/// Initialize tracing/logging. `RUST_LOG` wins when set.
///
/// `quiet` is the filter used without `--logs`: the server keeps its
/// request log at `info`, one-shot commands only print warnings.
fn init_logging(verbose: bool, quiet: &str) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "nilgiri=debug,info" } else { quiet };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
