//! Octoagent - GitHub agent on Ollama
//!
//! Main entry point for the CLI application.

use clap::Parser;
use octoagent::{AgentOutcome, Config, Repl};
use tracing_subscriber::EnvFilter;

/// Octoagent - GitHub agent on Ollama
#[derive(Parser, Debug)]
#[command(name = "octoagent")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model to use
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Repository owner
    #[arg(long)]
    owner: Option<String>,

    /// Repository name
    #[arg(long)]
    repo: Option<String>,

    /// Maximum agent loop iterations
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Single prompt mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("octoagent=info")),
        )
        .init();

    let args = Args::parse();

    // Build configuration
    let mut config = Config::load();

    // Apply CLI overrides
    if let Some(ref model) = args.model {
        config.model.name = model.clone();
    }

    if let Some(ref owner) = args.owner {
        config.github.owner = owner.clone();
    }

    if let Some(ref repo) = args.repo {
        config.github.repo = repo.clone();
    }

    if let Some(max_iterations) = args.max_iterations {
        config.agent.max_iterations = max_iterations;
    }

    // Single prompt mode
    if let Some(prompt) = args.prompt {
        let agent = octoagent::Agent::new(config)?;

        let run = agent.run(&prompt).await;
        match run.outcome {
            AgentOutcome::Complete { final_text } => {
                println!("{}", final_text);
                return Ok(());
            }
            AgentOutcome::Failed { kind, message } => {
                anyhow::bail!("run failed ({}): {}", kind, message);
            }
        }
    }

    // Interactive REPL mode
    let mut repl = Repl::with_config(config)?;
    repl.run().await?;

    Ok(())
}
