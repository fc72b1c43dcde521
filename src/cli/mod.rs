//! CLI surface: argument parsing, command handlers, and table output.

pub mod commands;
pub mod output;
pub mod types;

pub use types::{Cli, Commands, ConversationCommands};

/// Print an error in the requested format and exit non-zero.
pub fn handle_error(error: anyhow::Error, json: bool) {
    if json {
        println!("{}", serde_json::json!({ "error": error.to_string() }));
    } else {
        eprintln!("Error: {error:#}");
    }
    std::process::exit(1);
}
