//! Interactive chat over the dispatcher.
//!
//! Uses `rustyline` for readline-style editing with persistent history.

use anyhow::Result;
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use nilgiri_client::Dispatcher;
use nilgiri_core::Provider;

use crate::helpers;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "bye", ":q"];

/// Run the chat loop until the user exits.
pub async fn run(dispatcher: &Dispatcher, provider: Provider) -> Result<()> {
    helpers::print_banner(provider, dispatcher.base_url());

    let mut editor = create_editor()?;

    loop {
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_exit_command(trimmed) {
            println!("\nGoodbye!");
            break;
        }

        let _ = editor.add_history_entry(&input);

        debug!(provider = provider.as_str(), chars = trimmed.len(), "sending question");
        helpers::print_thinking();

        let outcome = dispatcher.ask(provider, trimmed).await;
        helpers::clear_thinking();
        match outcome {
            Ok(reply) => helpers::print_reply(&reply),
            Err(e) => helpers::print_dispatch_error(&e),
        }
    }

    save_history(&mut editor);

    Ok(())
}

/// Editor with chat history persisted at `~/.nilgiri/history/cli_history`.
fn create_editor() -> Result<DefaultEditor> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(500)?;
    if editor.load_history(&history_path()).is_ok() {
        debug!("loaded chat history");
    }
    Ok(editor)
}

fn save_history(editor: &mut DefaultEditor) {
    let path = history_path();
    let saved = path
        .parent()
        .map_or(Ok(()), std::fs::create_dir_all)
        .map_err(ReadlineError::from)
        .and_then(|()| editor.save_history(&path));
    if let Err(e) = saved {
        debug!("failed to save history: {e}");
    }
}

fn history_path() -> std::path::PathBuf {
    nilgiri_core::utils::get_history_path().join("cli_history")
}

fn is_exit_command(input: &str) -> bool {
    EXIT_COMMANDS.iter().any(|cmd| cmd.eq_ignore_ascii_case(input))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
