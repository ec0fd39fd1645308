//! Agent loop state management
//!
//! The loop is a small state machine: it alternates between consulting the
//! backend and dispatching the tool calls the backend requested, until it
//! terminates with a final answer or a failure. The iteration counter bounds
//! the number of backend consultations.

use crate::core::{OctoagentError, ToolCallRequest};

/// State of the agent execution loop
#[derive(Debug)]
pub enum LoopState {
    /// Waiting on the chat backend's next decision
    AwaitingBackend,
    /// Executing the pending tool calls, in the order received
    DispatchingTools(Vec<ToolCallRequest>),
    /// Terminated with a final assistant answer
    Done(String),
    /// Terminated with an error
    Failed(OctoagentError),
}

impl LoopState {
    /// Whether the loop has terminated
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopState::Done(_) | LoopState::Failed(_))
    }
}

/// Iteration bookkeeping for one run
#[derive(Debug, Clone)]
pub struct IterationBudget {
    /// Backend consultations so far
    pub iterations: usize,
    /// Maximum allowed consultations
    pub max_iterations: usize,
}

impl IterationBudget {
    /// Create a budget with the given bound
    pub fn new(max_iterations: usize) -> Self {
        Self {
            iterations: 0,
            max_iterations,
        }
    }

    /// Account for one backend consultation
    ///
    /// Returns false when the bound is exhausted; the caller must then
    /// terminate the run instead of consulting the backend again.
    pub fn begin_iteration(&mut self) -> bool {
        if self.iterations >= self.max_iterations {
            return false;
        }
        self.iterations += 1;
        true
    }
}
