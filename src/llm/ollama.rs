//! Ollama chat backend adapter
//!
//! Async HTTP client for the Ollama chat API with tool calling support.
//! Ollama does not assign tool-call identifiers on the wire, so the adapter
//! accepts an `id` field when present and otherwise assigns `call_N` from a
//! monotonic counter, keeping identifiers opaque and unique per conversation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Config, Message, OctoagentError, Result, Role, ToolCallRequest, ToolSchema};
use crate::llm::traits::{BackendResponse, ChatBackend};

/// Ollama API adapter
pub struct OllamaBackend {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
    num_ctx: u32,
    system_prompt: Option<String>,
    next_call_id: AtomicU64,
}

/// Ollama chat request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    options: WireOptions,
    stream: bool,
}

/// Ollama message format
#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

/// Ollama tool call format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    function: WireFunction,
}

/// Function in an Ollama tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    arguments: serde_json::Value,
}

/// Tool declaration on the wire, wrapping a schema as a function
#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: WireToolSchema,
}

#[derive(Debug, Serialize)]
struct WireToolSchema {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

/// Ollama generation options
#[derive(Debug, Serialize)]
struct WireOptions {
    temperature: f32,
    num_ctx: u32,
}

/// Ollama chat response (non-streaming)
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

impl OllamaBackend {
    /// Create a new Ollama backend from configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.ollama.base_url,
            &config.model.name,
            config.model.temperature,
            config.model.num_ctx,
            Some(config.system_prompt()),
            Duration::from_secs(config.ollama.timeout_secs),
        )
    }

    /// Create a backend with explicit settings
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        num_ctx: u32,
        system_prompt: Option<String>,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        let base_url: String = base_url.into();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            temperature,
            num_ctx,
            system_prompt,
            next_call_id: AtomicU64::new(0),
        }
    }

    /// Convert an internal message to the Ollama wire format
    fn to_wire_message(msg: &Message) -> WireMessage {
        match msg.role {
            Role::User => WireMessage {
                role: "user".to_string(),
                content: msg.content.clone(),
                tool_calls: None,
                tool_name: None,
            },
            Role::Assistant => WireMessage {
                role: "assistant".to_string(),
                content: msg.content.clone(),
                tool_calls: msg.tool_calls.as_ref().map(|calls| {
                    calls
                        .iter()
                        .map(|tc| WireToolCall {
                            id: Some(tc.id.clone()),
                            function: WireFunction {
                                name: tc.name.clone(),
                                arguments: tc.arguments.clone(),
                            },
                        })
                        .collect()
                }),
                tool_name: None,
            },
            Role::ToolResult => WireMessage {
                role: "tool".to_string(),
                content: msg.content.clone(),
                tool_calls: None,
                // Ollama attributes tool results by function name, not call id
                tool_name: msg.tool_name.clone(),
            },
        }
    }

    /// Interpret a parsed chat response as the tagged backend variant
    fn to_backend_response(&self, response: ChatResponse) -> BackendResponse {
        let ResponseMessage {
            content,
            tool_calls,
        } = response.message;

        match tool_calls {
            Some(calls) if !calls.is_empty() => {
                let requests = calls
                    .into_iter()
                    .map(|tc| {
                        let id = tc.id.unwrap_or_else(|| {
                            format!("call_{}", self.next_call_id.fetch_add(1, Ordering::Relaxed))
                        });
                        ToolCallRequest::new(id, tc.function.name, tc.function.arguments)
                    })
                    .collect();
                BackendResponse::ToolCalls { content, requests }
            }
            _ => BackendResponse::Final(content),
        }
    }
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    async fn complete(
        &self,
        history: &[Message],
        tools: &[ToolSchema],
    ) -> Result<BackendResponse> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        if let Some(ref prompt) = self.system_prompt {
            messages.push(WireMessage {
                role: "system".to_string(),
                content: prompt.clone(),
                tool_calls: None,
                tool_name: None,
            });
        }
        messages.extend(history.iter().map(Self::to_wire_message));

        let wire_tools = if tools.is_empty() {
            None
        } else {
            Some(
                tools
                    .iter()
                    .map(|schema| WireTool {
                        tool_type: "function",
                        function: WireToolSchema {
                            name: schema.name.clone(),
                            description: schema.description.clone(),
                            parameters: schema.parameters.clone(),
                        },
                    })
                    .collect(),
            )
        };

        let request = ChatRequest {
            model: &self.model,
            messages,
            tools: wire_tools,
            options: WireOptions {
                temperature: self.temperature,
                num_ctx: self.num_ctx,
            },
            stream: false,
        };

        debug!(model = %self.model, messages = history.len(), "Calling Ollama chat API");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    OctoagentError::unavailable(format!(
                        "Cannot connect to Ollama at {}. Is it running?",
                        self.base_url
                    ))
                } else if e.is_timeout() {
                    OctoagentError::unavailable(format!("Ollama request timed out: {}", e))
                } else {
                    OctoagentError::unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            // 5xx and 429 are transient; anything else means we are talking
            // to the wrong thing or sending a malformed request.
            if status.is_server_error() || status.as_u16() == 429 {
                return Err(OctoagentError::unavailable(format!(
                    "Ollama API error ({}): {}",
                    status, error_text
                )));
            }

            return Err(OctoagentError::protocol(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| OctoagentError::unavailable(format!("Failed to read response: {}", e)))?;

        let chat_response: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| OctoagentError::protocol(format!("Failed to parse response: {}", e)))?;

        Ok(self.to_backend_response(chat_response))
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ToolResult;

    fn test_backend(base_url: &str) -> OllamaBackend {
        OllamaBackend::new(
            base_url,
            "qwen3:32b",
            0.1,
            4096,
            Some("You are a helpful agent.".to_string()),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_tool_result_message_carries_function_name() {
        let result = ToolResult::success("t1", "get_file_contents", "contents...");
        let msg = Message::tool_result(&result);
        let wire = OllamaBackend::to_wire_message(&msg);
        assert_eq!(wire.role, "tool");
        assert_eq!(wire.content, "contents...");
        // The model attributes the result to the function, not the call id
        assert_eq!(wire.tool_name.as_deref(), Some("get_file_contents"));
    }

    #[test]
    fn test_assistant_tool_calls_preserved_on_wire() {
        let call = ToolCallRequest::new("t9", "list_issues", serde_json::json!({"state": "open"}));
        let msg = Message::assistant_tool_calls("", vec![call]);
        let wire = OllamaBackend::to_wire_message(&msg);
        let calls = wire.tool_calls.expect("tool calls should survive conversion");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id.as_deref(), Some("t9"));
        assert_eq!(calls[0].function.name, "list_issues");
    }

    #[test]
    fn test_missing_ids_are_synthesized_uniquely() {
        let backend = test_backend("http://localhost:11434");
        let response = ChatResponse {
            message: ResponseMessage {
                content: String::new(),
                tool_calls: Some(vec![
                    WireToolCall {
                        id: None,
                        function: WireFunction {
                            name: "get_file_contents".to_string(),
                            arguments: serde_json::json!({"path": "README.md"}),
                        },
                    },
                    WireToolCall {
                        id: None,
                        function: WireFunction {
                            name: "list_issues".to_string(),
                            arguments: serde_json::json!({}),
                        },
                    },
                ]),
            },
        };

        match backend.to_backend_response(response) {
            BackendResponse::ToolCalls { requests, .. } => {
                assert_eq!(requests.len(), 2);
                assert_ne!(requests[0].id, requests[1].id);
            }
            BackendResponse::Final(_) => panic!("expected tool calls"),
        }
    }

    #[tokio::test]
    async fn test_complete_parses_final_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": {"role": "assistant", "content": "Summary: looks good."}}"#)
            .create_async()
            .await;

        let backend = test_backend(&server.url());
        let history = vec![Message::user("Summarize the README")];
        let response = backend.complete(&history, &[]).await.unwrap();

        match response {
            BackendResponse::Final(text) => assert_eq!(text, "Summary: looks good."),
            BackendResponse::ToolCalls { .. } => panic!("expected final message"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_parses_tool_calls() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"message": {"role": "assistant", "content": "Let me read that file.",
                    "tool_calls": [{"function": {"name": "get_file_contents",
                    "arguments": {"path": "README.md"}}}]}}"#,
            )
            .create_async()
            .await;

        let backend = test_backend(&server.url());
        let tools = vec![ToolSchema::new(
            "get_file_contents",
            "Read a file from the repository",
            serde_json::json!({"type": "object", "properties": {"path": {"type": "string"}}}),
        )];
        let history = vec![Message::user("Read the README")];
        let response = backend.complete(&history, &tools).await.unwrap();

        match response {
            BackendResponse::ToolCalls { content, requests } => {
                assert_eq!(content, "Let me read that file.");
                assert_eq!(requests.len(), 1);
                assert_eq!(requests[0].name, "get_file_contents");
                assert_eq!(requests[0].get_string("path").as_deref(), Some("README.md"));
            }
            BackendResponse::Final(_) => panic!("expected tool calls"),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(500)
            .with_body("internal error")
            .create_async()
            .await;

        let backend = test_backend(&server.url());
        let err = backend
            .complete(&[Message::user("hi")], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, OctoagentError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_garbage_body_is_protocol_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_body("not json at all")
            .create_async()
            .await;

        let backend = test_backend(&server.url());
        let err = backend
            .complete(&[Message::user("hi")], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, OctoagentError::BackendProtocol(_)));
    }
}
