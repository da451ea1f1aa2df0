//! `nilgiri onboard` — write a default configuration file.
//!
//! Creates the config (with empty credentials) and the history directory.
//! An existing config is left untouched.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use nilgiri_core::config::{save_config, Config};
use nilgiri_core::utils::get_history_path;

pub fn run(path: &Path) -> Result<()> {
    println!();
    println!("{}", "Nilgiri Assistant — Setup".cyan().bold());
    println!();

    if write_default_config(path)? {
        println!("  {} created config at {}", "✓".green(), path.display());
    } else {
        println!("  {} config already exists at {}", "✓".green(), path.display());
    }

    let history_dir = get_history_path();
    std::fs::create_dir_all(&history_dir)
        .with_context(|| format!("failed to create {}", history_dir.display()))?;

    println!();
    println!(
        "  Add your keys under {} and {} (or export {} / {}),",
        "providers.groq.apiKey".bold(),
        "providers.gemini.apiKey".bold(),
        "GROQ_API_KEY",
        "GEMINI_API_KEY"
    );
    println!("  then run {}.", "`nilgiri serve`".green());
    println!();

    Ok(())
}

/// Write `Config::default()` to `path`. Returns `false` if the file exists.
fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_config(&Config::default(), Some(path))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
