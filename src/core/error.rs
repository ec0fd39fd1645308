//! Custom error types for Octoagent
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

/// Main error type for Octoagent operations
#[derive(Error, Debug)]
pub enum OctoagentError {
    /// A tool with the same name is already registered
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),

    /// No tool registered under this name
    #[error("no tool registered under '{0}'")]
    UnknownTool(String),

    /// Chat backend connectivity or timeout fault (retryable)
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Chat backend returned a response we cannot parse (non-retryable)
    #[error("backend protocol error: {0}")]
    BackendProtocol(String),

    /// A tool_result message does not answer any outstanding tool call
    #[error("tool result '{0}' does not match any outstanding tool call")]
    DanglingToolResult(String),

    /// The agent loop hit its iteration bound without a final answer
    #[error("agent loop exceeded {0} iterations without a final answer")]
    MaxIterationsExceeded(usize),

    /// The run was cancelled between loop steps
    #[error("agent run cancelled")]
    Cancelled,

    /// GitHub API errors
    #[error("GitHub error: {0}")]
    GitHub(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for Octoagent operations
pub type Result<T> = std::result::Result<T, OctoagentError>;

/// Coarse classification of a failed run, reported at the caller boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    BackendUnavailable,
    BackendProtocol,
    DanglingToolResult,
    MaxIterationsExceeded,
    Cancelled,
    Internal,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::BackendUnavailable => write!(f, "backend_unavailable"),
            FailureKind::BackendProtocol => write!(f, "backend_protocol"),
            FailureKind::DanglingToolResult => write!(f, "dangling_tool_result"),
            FailureKind::MaxIterationsExceeded => write!(f, "max_iterations_exceeded"),
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Internal => write!(f, "internal"),
        }
    }
}

impl OctoagentError {
    /// Create a backend unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::BackendUnavailable(msg.into())
    }

    /// Create a backend protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::BackendProtocol(msg.into())
    }

    /// Create a GitHub error
    pub fn github(msg: impl Into<String>) -> Self {
        Self::GitHub(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Classify this error for the caller-facing outcome
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            OctoagentError::BackendUnavailable(_) => FailureKind::BackendUnavailable,
            OctoagentError::BackendProtocol(_) => FailureKind::BackendProtocol,
            OctoagentError::DanglingToolResult(_) => FailureKind::DanglingToolResult,
            OctoagentError::MaxIterationsExceeded(_) => FailureKind::MaxIterationsExceeded,
            OctoagentError::Cancelled => FailureKind::Cancelled,
            _ => FailureKind::Internal,
        }
    }
}
