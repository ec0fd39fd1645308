//! REPL command handling
//!
//! Slash commands are handled locally; anything else goes to the agent.

use crate::agent::Agent;
use crate::core::{Config, Result};

/// Result of handling a line of input
pub enum CommandResult {
    /// The input was a command and produced this output
    Handled(String),
    /// The user asked to exit
    Exit,
    /// Not a command; send it to the agent
    NotACommand,
}

/// Handle a slash command, if the input is one
pub fn handle_command(input: &str, agent: &Agent) -> Result<CommandResult> {
    if !input.starts_with('/') {
        return Ok(CommandResult::NotACommand);
    }

    match input.split_whitespace().next().unwrap_or("") {
        "/help" => Ok(CommandResult::Handled(help_text())),
        "/quit" | "/exit" => Ok(CommandResult::Exit),
        "/tools" => {
            let lines: Vec<String> = agent
                .tools()
                .schemas()
                .into_iter()
                .map(|schema| format!("  {} - {}", schema.name, schema.description))
                .collect();
            Ok(CommandResult::Handled(format!(
                "Registered tools:\n{}",
                lines.join("\n")
            )))
        }
        "/config" => {
            let config = agent.config();
            if input.split_whitespace().nth(1) == Some("save") {
                // A failed save should not end the session
                return Ok(match config.save() {
                    Ok(()) => CommandResult::Handled(format!(
                        "Saved configuration to {}",
                        Config::config_file().display()
                    )),
                    Err(e) => {
                        CommandResult::Handled(format!("Failed to save configuration: {}", e))
                    }
                });
            }
            Ok(CommandResult::Handled(format!(
                "model: {}\nollama: {}\nrepository: {}/{}\nmax iterations: {}",
                config.model.name,
                config.ollama.base_url,
                config.github.owner,
                config.github.repo,
                config.agent.max_iterations,
            )))
        }
        other => Ok(CommandResult::Handled(format!(
            "Unknown command: {}. Try /help.",
            other
        ))),
    }
}

fn help_text() -> String {
    [
        "Commands:",
        "  /help         Show this help",
        "  /tools        List registered tools",
        "  /config       Show current configuration",
        "  /config save  Persist the current configuration to disk",
        "  /quit         Exit",
        "",
        "Anything else is sent to the agent as a task.",
    ]
    .join("\n")
}
