//! LLM module - chat backend integrations
//!
//! Provides the chat backend abstraction with Ollama as the primary adapter.

pub mod ollama;
pub mod traits;

pub use ollama::OllamaBackend;
pub use traits::{BackendResponse, ChatBackend};
