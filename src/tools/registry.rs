//! Tool registry - holds the set of callable tools
//!
//! Maps tool names to their schemas and handlers. Registration order is
//! preserved so the schema list presented to the backend is deterministic.

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::{OctoagentError, Result, ToolSchema};

/// A registered tool handler
///
/// Handlers take validated JSON arguments and return a text payload or an
/// error; the transport behind a handler (in-process, subprocess, network)
/// is opaque to the registry. Handlers must be safe for concurrent
/// invocation since independent agent runs may share one registry.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute the tool with the given arguments
    async fn call(&self, arguments: &serde_json::Value) -> Result<String>;
}

impl std::fmt::Debug for dyn ToolHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ToolHandler")
    }
}

/// Registry of available tools
#[derive(Default, Clone)]
pub struct ToolRegistry {
    // Vec keeps insertion order for schema listing
    entries: Vec<(ToolSchema, Arc<dyn ToolHandler>)>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its schema name
    pub fn register(&mut self, schema: ToolSchema, handler: Arc<dyn ToolHandler>) -> Result<()> {
        if self.contains(&schema.name) {
            return Err(OctoagentError::DuplicateTool(schema.name));
        }
        self.entries.push((schema, handler));
        Ok(())
    }

    /// Resolve a tool name to its handler
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn ToolHandler>> {
        self.entries
            .iter()
            .find(|(schema, _)| schema.name == name)
            .map(|(_, handler)| Arc::clone(handler))
            .ok_or_else(|| OctoagentError::UnknownTool(name.to_string()))
    }

    /// All tool schemas in registration order
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.entries
            .iter()
            .map(|(schema, _)| schema.clone())
            .collect()
    }

    /// Whether a tool is registered under this name
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(schema, _)| schema.name == name)
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
