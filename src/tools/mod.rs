//! Tools module - callable capabilities for the agent
//!
//! Contains the tool registry, the invoker, and the GitHub tool set.

pub mod github;
pub mod invoker;
pub mod registry;

pub use github::{register_github_tools, GitHubClient};
pub use invoker::ToolInvoker;
pub use registry::{ToolHandler, ToolRegistry};
