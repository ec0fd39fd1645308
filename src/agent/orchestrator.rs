//! Agent orchestrator
//!
//! Owns the conversation state machine: consult the backend, dispatch the
//! tool calls it requested, append the results, repeat until the model
//! produces a final answer or the run fails. One call to [`Agent::run`] is
//! one bounded AgentRun over a fresh conversation; nothing is shared
//! between runs.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::agent::conversation::Conversation;
use crate::agent::loop_state::{IterationBudget, LoopState};
use crate::core::{Config, FailureKind, Message, OctoagentError, Result, ToolSchema};
use crate::llm::{BackendResponse, ChatBackend, OllamaBackend};
use crate::tools::{register_github_tools, GitHubClient, ToolInvoker, ToolRegistry};

/// Outcome of an agent run, reported at the caller boundary
///
/// Callers always get either final text or a typed failure reason, never a
/// raw low-level fault.
#[derive(Debug, Clone)]
pub enum AgentOutcome {
    /// The model produced a final answer
    Complete { final_text: String },
    /// The run terminated without an answer
    Failed { kind: FailureKind, message: String },
}

impl AgentOutcome {
    /// Whether the run completed with a final answer
    pub fn is_complete(&self) -> bool {
        matches!(self, AgentOutcome::Complete { .. })
    }

    /// The final text, if the run completed
    pub fn final_text(&self) -> Option<&str> {
        match self {
            AgentOutcome::Complete { final_text } => Some(final_text),
            AgentOutcome::Failed { .. } => None,
        }
    }
}

/// A finished agent run: the outcome plus the full transcript
#[derive(Debug)]
pub struct AgentRun {
    /// How the run terminated
    pub outcome: AgentOutcome,
    /// The conversation built during the run
    pub conversation: Conversation,
    /// Backend consultations performed
    pub iterations: usize,
}

/// Main agent tying the backend, registry, and invoker together
pub struct Agent {
    /// Configuration
    config: Config,
    /// Chat backend adapter
    backend: Arc<dyn ChatBackend>,
    /// Tool registry (shared so independent runs can reuse it)
    tools: Arc<ToolRegistry>,
    /// Tool invoker with the configured per-call timeout
    invoker: ToolInvoker,
    /// Cancellation signal checked between loop steps
    cancel: CancellationToken,
}

impl Agent {
    /// Create an agent wired to Ollama and the GitHub tool set
    pub fn new(config: Config) -> Result<Self> {
        let backend = Arc::new(OllamaBackend::from_config(&config));

        let mut registry = ToolRegistry::new();
        let github = Arc::new(GitHubClient::from_config(&config));
        register_github_tools(&mut registry, github)?;

        Ok(Self::with_backend(config, backend, Arc::new(registry)))
    }

    /// Create an agent with a custom backend and tool registry
    pub fn with_backend(
        config: Config,
        backend: Arc<dyn ChatBackend>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        let invoker = ToolInvoker::from_config(&config);
        Self {
            config,
            backend,
            tools,
            invoker,
            cancel: CancellationToken::new(),
        }
    }

    /// Token for cancelling runs from outside; cancellation takes effect
    /// between loop steps, never mid-tool-call.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Get current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run the agent loop for one user message
    ///
    /// Builds a fresh conversation, then alternates between backend
    /// consultation and tool dispatch until the model answers, the
    /// iteration bound is hit, or a fatal fault occurs.
    pub async fn run(&self, user_input: &str) -> AgentRun {
        let mut conversation = Conversation::new();
        let schemas = self.tools.schemas();
        let mut budget = IterationBudget::new(self.config.agent.max_iterations);

        // A user append cannot violate the store invariant.
        let mut state = match conversation.append(Message::user(user_input)) {
            Ok(()) => LoopState::AwaitingBackend,
            Err(e) => LoopState::Failed(e),
        };

        info!(
            backend = self.backend.name(),
            max_iterations = budget.max_iterations,
            "Starting agent run"
        );

        let outcome = loop {
            state = match state {
                LoopState::AwaitingBackend => {
                    self.await_backend(&mut conversation, &schemas, &mut budget)
                        .await
                }
                LoopState::DispatchingTools(requests) => {
                    self.dispatch_tools(&mut conversation, requests).await
                }
                LoopState::Done(final_text) => {
                    info!(iterations = budget.iterations, "Agent run complete");
                    break AgentOutcome::Complete { final_text };
                }
                LoopState::Failed(error) => {
                    warn!(iterations = budget.iterations, error = %error, "Agent run failed");
                    break AgentOutcome::Failed {
                        kind: error.failure_kind(),
                        message: error.to_string(),
                    };
                }
            };
        };

        AgentRun {
            outcome,
            conversation,
            iterations: budget.iterations,
        }
    }

    /// One `AwaitingBackend` step: consult the backend and append its decision
    async fn await_backend(
        &self,
        conversation: &mut Conversation,
        schemas: &[ToolSchema],
        budget: &mut IterationBudget,
    ) -> LoopState {
        if self.cancel.is_cancelled() {
            return LoopState::Failed(OctoagentError::Cancelled);
        }

        if !budget.begin_iteration() {
            return LoopState::Failed(OctoagentError::MaxIterationsExceeded(
                budget.max_iterations,
            ));
        }

        debug!(iteration = budget.iterations, "Consulting backend");

        match self.complete_with_retry(conversation, schemas).await {
            Ok(BackendResponse::Final(text)) => {
                match conversation.append(Message::assistant(text.clone())) {
                    Ok(()) => LoopState::Done(text),
                    Err(e) => LoopState::Failed(e),
                }
            }
            Ok(BackendResponse::ToolCalls { content, requests }) => {
                info!(count = requests.len(), "Backend requested tool calls");
                let message = Message::assistant_tool_calls(content, requests.clone());
                match conversation.append(message) {
                    Ok(()) => LoopState::DispatchingTools(requests),
                    Err(e) => LoopState::Failed(e),
                }
            }
            Err(e) => LoopState::Failed(e),
        }
    }

    /// One `DispatchingTools` step: answer every pending request in order
    ///
    /// Results are appended in the order the backend issued the requests,
    /// since later calls may depend on earlier side effects. Failures are
    /// appended as content for the model, never escalated.
    async fn dispatch_tools(
        &self,
        conversation: &mut Conversation,
        requests: Vec<crate::core::ToolCallRequest>,
    ) -> LoopState {
        if self.cancel.is_cancelled() {
            return LoopState::Failed(OctoagentError::Cancelled);
        }

        for request in &requests {
            let result = self.invoker.invoke(request, &self.tools).await;
            if let Err(e) = conversation.append(Message::tool_result(&result)) {
                // Store invariant violation here means an internal bug.
                return LoopState::Failed(e);
            }
        }

        LoopState::AwaitingBackend
    }

    /// Call the backend, retrying transient faults with exponential backoff
    ///
    /// Only `BackendUnavailable` is retried; protocol errors are final.
    /// Retries never touch the conversation, so they are invisible to the
    /// transcript.
    async fn complete_with_retry(
        &self,
        conversation: &Conversation,
        schemas: &[ToolSchema],
    ) -> Result<BackendResponse> {
        let retries = self.config.agent.backend_retries;
        let base_delay = self.config.agent.retry_base_delay_ms;
        let mut attempt = 0usize;

        loop {
            match self.backend.complete(conversation.history(), schemas).await {
                Ok(response) => return Ok(response),
                Err(OctoagentError::BackendUnavailable(msg)) if attempt < retries => {
                    attempt += 1;
                    let delay = backoff_delay(base_delay, attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Backend unavailable, retrying: {}",
                        msg
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Exponential backoff with jitter for retry attempt `attempt` (1-based)
///
/// Saturates instead of overflowing on extreme base delays.
fn backoff_delay(base_delay: u64, attempt: usize) -> Duration {
    let exp = base_delay.saturating_mul(1u64 << attempt.saturating_sub(1).min(16));
    let jitter = rand::rng().random_range(0..=base_delay / 2 + 1);
    Duration::from_millis(exp.saturating_add(jitter))
}
