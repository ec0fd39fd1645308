//! Chat backend trait for abstracting the completion endpoint
//!
//! Enables swapping the Ollama adapter for stubs in tests or other backends.

use async_trait::async_trait;

use crate::core::{Message, Result, ToolCallRequest, ToolSchema};

/// What the backend decided to do with the conversation
///
/// A completion is either a final natural-language answer or a batch of
/// tool call requests; the agent loop matches exhaustively on this.
#[derive(Debug, Clone)]
pub enum BackendResponse {
    /// The model produced a final answer; the run terminates
    Final(String),
    /// The model wants one or more tools invoked, in the order given.
    /// Any assistant text accompanying the request is kept so the
    /// transcript preserves what the model said.
    ToolCalls {
        content: String,
        requests: Vec<ToolCallRequest>,
    },
}

/// Trait for chat completion backends
///
/// Implementations must preserve message order and tool-call identifiers
/// exactly as the backend produced them, and must not retry internally;
/// retry policy belongs to the agent loop.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send the conversation history and available tool schemas, and return
    /// the backend's decision.
    ///
    /// Fails with `BackendUnavailable` on connectivity or timeout faults and
    /// with `BackendProtocol` when the response cannot be parsed.
    async fn complete(
        &self,
        history: &[Message],
        tools: &[ToolSchema],
    ) -> Result<BackendResponse>;

    /// Get the backend name
    fn name(&self) -> &str;
}
