//! Interactive REPL for Octoagent
//!
//! Provides the main user interaction loop. Each submitted task is an
//! independent agent run with its own conversation; listing results of a
//! previous task is simply a new run.

use std::io::{self, BufRead, Write};

use crate::agent::{Agent, AgentOutcome};
use crate::cli::commands::{handle_command, CommandResult};
use crate::core::{Config, Result};

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    agent: Agent,
}

impl Repl {
    /// Create a REPL with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self {
            agent: Agent::new(config)?,
        })
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            print!("You: ");
            stdout.flush()?;

            let mut input = String::new();
            match stdin.lock().read_line(&mut input) {
                Ok(0) => {
                    // EOF (Ctrl+D)
                    println!("\nGoodbye!");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            }

            let input = input.trim();

            if input.is_empty() {
                continue;
            }

            match handle_command(input, &self.agent)? {
                CommandResult::Exit => {
                    println!("\nGoodbye!");
                    break;
                }
                CommandResult::Handled(output) => {
                    println!("{}\n", output);
                    continue;
                }
                CommandResult::NotACommand => {}
            }

            let run = self.agent.run(input).await;
            match run.outcome {
                AgentOutcome::Complete { final_text } => {
                    println!(
                        "\nAgent ({} iteration{}): {}\n",
                        run.iterations,
                        if run.iterations == 1 { "" } else { "s" },
                        final_text
                    );
                }
                AgentOutcome::Failed { kind, message } => {
                    println!("\nRun failed ({}): {}\n", kind, message);
                }
            }
        }

        Ok(())
    }

    fn print_banner(&self) {
        let config = self.agent.config();
        println!("Octoagent - GitHub agent on Ollama");
        println!(
            "Repository: {}/{} | Model: {}",
            config.github.owner, config.github.repo, config.model.name
        );
        println!("Type /help for commands.\n");
    }
}
