//! Utility helpers — data paths and string truncation.

use std::path::PathBuf;

/// Maximum number of upstream body characters quoted in an error message.
pub const BODY_SNIPPET_CHARS: usize = 200;

/// Get the Nilgiri data directory (e.g. `~/.nilgiri/`).
pub fn get_data_path() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".nilgiri")
}

/// Get the history directory used by the interactive chat (`~/.nilgiri/history/`).
pub fn get_history_path() -> PathBuf {
    get_data_path().join("history")
}

/// First `max_chars` characters of `s`, with no ellipsis. Unicode-safe.
pub fn head_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Truncate a string to `max_len` characters, adding "..." if truncated.
/// Unicode-safe.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Mask a credential for display: keeps the first four characters.
pub fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    format!("{}…", head_chars(secret, 4))
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("USERPROFILE").ok().map(PathBuf::from))
}
