//! Shared types used across Octoagent modules
//!
//! Contains the conversation message structures, tool schemas, and the
//! tool call / tool result pair that links a backend request to its answer.

use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    ToolResult,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::ToolResult => write!(f, "tool_result"),
        }
    }
}

/// A message in a conversation
///
/// `tool_calls` is only ever present on assistant messages, `tool_call_id`
/// and `tool_name` only on tool_result messages. The constructors below are
/// the only way messages are built inside the crate, so the pairing holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Content of the message (may be empty on tool-calling assistant turns)
    pub content: String,
    /// Tool calls requested by the assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRequest>>,
    /// Identifier of the tool call this tool_result answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Name of the tool that produced this tool_result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Create a new assistant message with final text
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Create an assistant message carrying tool call requests
    pub fn assistant_tool_calls(
        content: impl Into<String>,
        tool_calls: Vec<ToolCallRequest>,
    ) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Some(tool_calls),
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Create a tool_result message answering the given tool call
    pub fn tool_result(result: &ToolResult) -> Self {
        Self {
            role: Role::ToolResult,
            content: result.text(),
            tool_calls: None,
            tool_call_id: Some(result.id.clone()),
            tool_name: Some(result.tool_name.clone()),
        }
    }

    /// Tool call requests carried by this message, if any
    pub fn tool_calls(&self) -> &[ToolCallRequest] {
        self.tool_calls.as_deref().unwrap_or_default()
    }
}

/// Declared schema of a tool the model can call
///
/// Immutable once registered; `parameters` is a JSON Schema object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Name of the tool (unique within a registry)
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON Schema for the arguments
    pub parameters: serde_json::Value,
}

impl ToolSchema {
    /// Create a new tool schema
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A tool call requested by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Opaque backend-assigned identifier, unique per conversation
    pub id: String,
    /// Name of the tool to invoke
    pub name: String,
    /// JSON arguments for the tool
    pub arguments: serde_json::Value,
}

impl ToolCallRequest {
    /// Create a new tool call request
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Get a string argument by key
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.arguments
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}

/// Why a tool invocation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolFailure {
    /// The requested tool is not registered
    UnknownTool,
    /// The handler did not finish within the configured timeout
    ToolTimeout,
    /// The handler faulted while executing
    ToolExecutionError,
}

impl std::fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolFailure::UnknownTool => write!(f, "unknown_tool"),
            ToolFailure::ToolTimeout => write!(f, "tool_timeout"),
            ToolFailure::ToolExecutionError => write!(f, "tool_execution_error"),
        }
    }
}

/// Outcome of a single tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    /// Payload returned by the handler
    Success(String),
    /// Failure descriptor surfaced to the model as data
    Failure { kind: ToolFailure, message: String },
}

/// Result of executing a tool call, linked back to its request by id
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// Identifier of the originating tool call request
    pub id: String,
    /// Name of the tool that was executed
    pub tool_name: String,
    /// Success payload or failure descriptor
    pub outcome: ToolOutcome,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(
        id: impl Into<String>,
        tool_name: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            outcome: ToolOutcome::Success(output.into()),
        }
    }

    /// Create a failed result
    pub fn failure(
        id: impl Into<String>,
        tool_name: impl Into<String>,
        kind: ToolFailure,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            outcome: ToolOutcome::Failure {
                kind,
                message: message.into(),
            },
        }
    }

    /// Whether the invocation succeeded
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Success(_))
    }

    /// Render the outcome as conversation content for the model
    pub fn text(&self) -> String {
        match &self.outcome {
            ToolOutcome::Success(output) => output.clone(),
            ToolOutcome::Failure { kind, message } => {
                format!("Tool '{}' failed ({}): {}", self.tool_name, kind, message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert!(msg.tool_calls.is_none());
        assert!(msg.tool_call_id.is_none());

        let call = ToolCallRequest::new("t1", "get_file_contents", serde_json::json!({"path": "README.md"}));
        let msg = Message::assistant_tool_calls("", vec![call]);
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.tool_calls().len(), 1);
    }

    #[test]
    fn test_tool_result_message_links_id_and_name() {
        let result = ToolResult::success("t1", "get_file_contents", "contents...");
        let msg = Message::tool_result(&result);
        assert_eq!(msg.role, Role::ToolResult);
        assert_eq!(msg.tool_call_id.as_deref(), Some("t1"));
        assert_eq!(msg.tool_name.as_deref(), Some("get_file_contents"));
        assert_eq!(msg.content, "contents...");
    }

    #[test]
    fn test_failure_rendered_as_content() {
        let result = ToolResult::failure("t2", "create_issue", ToolFailure::ToolTimeout, "timed out after 30s");
        let msg = Message::tool_result(&result);
        assert!(msg.content.contains("tool_timeout"));
        assert!(msg.content.contains("create_issue"));
    }

    #[test]
    fn test_get_string_argument() {
        let call = ToolCallRequest::new("t1", "get_file_contents", serde_json::json!({"path": "src/main.rs"}));
        assert_eq!(call.get_string("path").as_deref(), Some("src/main.rs"));
        assert!(call.get_string("missing").is_none());
    }
}
