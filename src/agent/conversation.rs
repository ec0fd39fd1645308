//! Conversation store
//!
//! An ordered, append-only sequence of messages owned by a single agent run.
//! The store tracks outstanding tool calls so that every tool_result message
//! provably answers a strictly-earlier, not-yet-answered request; anything
//! else is rejected with `DanglingToolResult` before it reaches the history.

use crate::core::{Message, OctoagentError, Result, Role};

/// Append-only message history for one agent run
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    /// Message history, never mutated retroactively
    messages: Vec<Message>,
    /// Identifiers of tool calls not yet answered, in request order
    outstanding: Vec<String>,
}

impl Conversation {
    /// Create an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the history
    ///
    /// Assistant messages carrying tool calls open outstanding requests;
    /// a tool_result message must close exactly one of them.
    pub fn append(&mut self, message: Message) -> Result<()> {
        match message.role {
            Role::ToolResult => {
                let id = message.tool_call_id.clone().ok_or_else(|| {
                    OctoagentError::DanglingToolResult("<missing id>".to_string())
                })?;

                let position = self
                    .outstanding
                    .iter()
                    .position(|outstanding| *outstanding == id)
                    .ok_or(OctoagentError::DanglingToolResult(id))?;

                self.outstanding.remove(position);
            }
            Role::Assistant => {
                for call in message.tool_calls() {
                    self.outstanding.push(call.id.clone());
                }
            }
            Role::User => {}
        }

        self.messages.push(message);
        Ok(())
    }

    /// Read-only snapshot of the history
    pub fn history(&self) -> &[Message] {
        &self.messages
    }

    /// Identifiers of tool calls still awaiting a result, in request order
    pub fn outstanding_tool_calls(&self) -> &[String] {
        &self.outstanding
    }

    /// Get the last message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Get message count
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
