//! Tool invoker - executes a single tool call
//!
//! Resolves the handler through the registry and enforces the per-call
//! timeout. Every fault (unknown tool, timeout, handler error) becomes a
//! failure descriptor in the ToolResult so the model can see and react to
//! it; nothing here terminates the agent loop. Retries are deliberately
//! absent because tool side effects are not idempotent.

use std::time::Duration;

use tracing::{debug, warn};

use crate::core::{Config, ToolCallRequest, ToolFailure, ToolResult};
use crate::tools::registry::ToolRegistry;

/// Executes tool calls with a per-call timeout
#[derive(Debug, Clone)]
pub struct ToolInvoker {
    timeout: Duration,
}

impl ToolInvoker {
    /// Create an invoker with the given per-call timeout
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Create an invoker from configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(Duration::from_secs(config.agent.tool_timeout_secs))
    }

    /// Invoke one tool call and return its result
    ///
    /// Never returns an error: failures are data in the result.
    pub async fn invoke(&self, request: &ToolCallRequest, registry: &ToolRegistry) -> ToolResult {
        let handler = match registry.resolve(&request.name) {
            Ok(handler) => handler,
            Err(e) => {
                warn!(tool = %request.name, id = %request.id, "Unknown tool requested");
                return ToolResult::failure(
                    &request.id,
                    &request.name,
                    ToolFailure::UnknownTool,
                    e.to_string(),
                );
            }
        };

        debug!(tool = %request.name, id = %request.id, "Executing tool");

        match tokio::time::timeout(self.timeout, handler.call(&request.arguments)).await {
            Ok(Ok(output)) => ToolResult::success(&request.id, &request.name, output),
            Ok(Err(e)) => {
                warn!(tool = %request.name, id = %request.id, error = %e, "Tool execution failed");
                ToolResult::failure(
                    &request.id,
                    &request.name,
                    ToolFailure::ToolExecutionError,
                    e.to_string(),
                )
            }
            Err(_) => {
                warn!(
                    tool = %request.name,
                    id = %request.id,
                    "Tool timed out after {}s",
                    self.timeout.as_secs()
                );
                ToolResult::failure(
                    &request.id,
                    &request.name,
                    ToolFailure::ToolTimeout,
                    format!("timed out after {:?}", self.timeout),
                )
            }
        }
    }
}
