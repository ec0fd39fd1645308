//! Agent module - orchestration and conversation management
//!
//! Contains the agent loop that coordinates backend calls and tool dispatch.

pub mod conversation;
pub mod loop_state;
pub mod orchestrator;

pub use conversation::Conversation;
pub use loop_state::{IterationBudget, LoopState};
pub use orchestrator::{Agent, AgentOutcome, AgentRun};
