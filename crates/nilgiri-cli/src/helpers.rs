//! Shared CLI helpers — path expansion, reply printing, banner.

use std::path::{Path, PathBuf};

use colored::Colorize;

use nilgiri_client::{CompletionReply, DispatchError};
use nilgiri_core::Provider;

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Resolve the config file in use: `--config` (with `~` expanded) or the default.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => expand_tilde(&path.to_string_lossy()),
        None => nilgiri_core::config::get_config_path(),
    }
}

/// One-line source tag under an answer, e.g. `gemini · gemini-1.5-flash (v1)`.
pub fn reply_source(reply: &CompletionReply) -> String {
    match (&reply.model, reply.version) {
        (Some(model), Some(version)) => {
            format!("{} · {model} ({version})", reply.provider.as_str())
        }
        (Some(model), None) => format!("{} · {model}", reply.provider.as_str()),
        _ => reply.provider.as_str().to_string(),
    }
}

/// Print an assistant reply to stdout.
pub fn print_reply(reply: &CompletionReply) {
    println!();
    println!("{}", "Nilgiri Assistant".cyan().bold());
    println!("{}", reply.text.trim_end());
    println!("{}", reply_source(reply).dimmed());
    println!();
}

/// Print a dispatch failure to stderr.
pub fn print_dispatch_error(err: &DispatchError) {
    let status = err
        .status
        .map(|s| format!(" [{s}]"))
        .unwrap_or_default();
    eprintln!();
    eprintln!("{} {}{}", "✗".red().bold(), err.message, status.dimmed());
    eprintln!();
}

/// Print the banner shown at chat start.
pub fn print_banner(provider: Provider, server: &str) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "Nilgiri Assistant".cyan().bold(), version.dimmed());
    println!(
        "{}",
        format!("Asking {provider} via {server}. Type a question, or \"exit\" to quit.").dimmed()
    );
    println!();
}

/// Print a "thinking" placeholder.
pub fn print_thinking() {
    eprint!("{}", "… thinking".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
