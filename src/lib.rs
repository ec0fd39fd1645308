//! Octoagent - a tool-calling agent for GitHub repositories
//!
//! Drives an Ollama chat model through multiple turns, letting it invoke
//! GitHub tools (reading files, listing and creating issues) and feeding the
//! results back into the conversation until the model produces a final
//! answer.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Chat backend abstraction with the Ollama adapter
//! - **Tools**: Tool registry, invoker, and the GitHub tool set
//! - **Agent**: The bounded execution loop and conversation store
//! - **CLI**: Command-line interface and REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use octoagent::{Agent, Config};
//!
//! #[tokio::main]
//! async fn main() {
//!     let agent = Agent::new(Config::load()).unwrap();
//!
//!     let run = agent.run("List the active issues on the repository").await;
//!     if let Some(text) = run.outcome.final_text() {
//!         println!("{}", text);
//!     }
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;
pub mod tools;

// Re-export commonly used items
pub use agent::{Agent, AgentOutcome, AgentRun, Conversation};
pub use cli::Repl;
pub use core::{Config, FailureKind, OctoagentError, Result};
pub use llm::{BackendResponse, ChatBackend};
pub use tools::{ToolHandler, ToolInvoker, ToolRegistry};
