//! End-to-end tests for the agent execution loop
//!
//! Drives the loop against scripted in-process backends and tools, checking
//! the transcript shape, the iteration bound, retry behavior, and run
//! isolation.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use octoagent::core::{Message, OctoagentError, Role, ToolCallRequest, ToolSchema};
use octoagent::{
    Agent, AgentOutcome, BackendResponse, ChatBackend, Config, FailureKind, Result, ToolHandler,
    ToolRegistry,
};

/// Backend that replays a fixed script of responses
struct ScriptedBackend {
    script: Mutex<VecDeque<Result<BackendResponse>>>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    fn new(script: Vec<Result<BackendResponse>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(
        &self,
        _history: &[Message],
        _tools: &[ToolSchema],
    ) -> Result<BackendResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(OctoagentError::protocol("script exhausted")))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Backend that always requests another tool call, forever
struct LoopingBackend {
    calls: AtomicUsize,
}

impl LoopingBackend {
    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for LoopingBackend {
    async fn complete(
        &self,
        _history: &[Message],
        _tools: &[ToolSchema],
    ) -> Result<BackendResponse> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(tool_calls(
            "",
            vec![ToolCallRequest::new(
                format!("t{}", n),
                "read_file",
                serde_json::json!({"path": "X"}),
            )],
        ))
    }

    fn name(&self) -> &str {
        "looping"
    }
}

/// Tool returning a fixed payload
struct StaticTool(&'static str);

#[async_trait]
impl ToolHandler for StaticTool {
    async fn call(&self, _arguments: &serde_json::Value) -> Result<String> {
        Ok(self.0.to_string())
    }
}

/// Tool that always faults
struct FaultyTool;

#[async_trait]
impl ToolHandler for FaultyTool {
    async fn call(&self, _arguments: &serde_json::Value) -> Result<String> {
        Err(OctoagentError::github("boom"))
    }
}

/// Tool that cancels the run's token while executing
struct CancellingTool {
    token: Mutex<Option<CancellationToken>>,
}

#[async_trait]
impl ToolHandler for CancellingTool {
    async fn call(&self, _arguments: &serde_json::Value) -> Result<String> {
        if let Some(token) = self.token.lock().unwrap().as_ref() {
            token.cancel();
        }
        Ok("interrupted".to_string())
    }
}

fn tool_calls(content: &str, requests: Vec<ToolCallRequest>) -> BackendResponse {
    BackendResponse::ToolCalls {
        content: content.to_string(),
        requests,
    }
}

fn object_schema(name: &str) -> ToolSchema {
    ToolSchema::new(name, "test tool", serde_json::json!({"type": "object"}))
}

fn registry_with(name: &str, handler: Arc<dyn ToolHandler>) -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(object_schema(name), handler).unwrap();
    Arc::new(registry)
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.agent.max_iterations = 10;
    config.agent.backend_retries = 3;
    config.agent.retry_base_delay_ms = 1;
    config
}

#[tokio::test]
async fn summarize_file_transcript_has_four_messages_in_order() {
    let backend = ScriptedBackend::new(vec![
        Ok(tool_calls(
            "I'll read the file first.",
            vec![ToolCallRequest::new(
                "t1",
                "get_file_contents",
                serde_json::json!({"path": "X"}),
            )],
        )),
        Ok(BackendResponse::Final("Summary: ...".to_string())),
    ]);
    let tools = registry_with("get_file_contents", Arc::new(StaticTool("contents...")));
    let agent = Agent::with_backend(test_config(), backend.clone(), tools);

    let run = agent.run("Summarize file X").await;

    assert_eq!(run.outcome.final_text(), Some("Summary: ..."));
    assert_eq!(run.iterations, 2);

    let history = run.conversation.history();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].tool_calls().len(), 1);
    // Assistant text alongside the tool calls survives into the transcript
    assert_eq!(history[1].content, "I'll read the file first.");
    assert_eq!(history[2].role, Role::ToolResult);
    assert_eq!(history[2].tool_call_id.as_deref(), Some("t1"));
    assert_eq!(history[2].tool_name.as_deref(), Some("get_file_contents"));
    assert_eq!(history[2].content, "contents...");
    assert_eq!(history[3].role, Role::Assistant);
    assert_eq!(history[3].content, "Summary: ...");
}

#[tokio::test]
async fn looping_backend_stops_at_exactly_max_iterations() {
    let backend = Arc::new(LoopingBackend {
        calls: AtomicUsize::new(0),
    });
    let tools = registry_with("read_file", Arc::new(StaticTool("data")));

    let mut config = test_config();
    config.agent.max_iterations = 4;
    let agent = Agent::with_backend(config, backend.clone(), tools);

    let run = agent.run("loop forever").await;

    match run.outcome {
        AgentOutcome::Failed { kind, .. } => assert_eq!(kind, FailureKind::MaxIterationsExceeded),
        AgentOutcome::Complete { .. } => panic!("expected MaxIterationsExceeded"),
    }
    assert_eq!(run.iterations, 4);
    assert_eq!(backend.call_count(), 4);

    // Every tool call issued before the bound was still answered in order.
    assert!(run.conversation.outstanding_tool_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn transient_backend_faults_are_retried_invisibly() {
    let backend = ScriptedBackend::new(vec![
        Err(OctoagentError::unavailable("connection refused")),
        Err(OctoagentError::unavailable("connection refused")),
        Ok(BackendResponse::Final("All good.".to_string())),
    ]);
    let agent = Agent::with_backend(test_config(), backend.clone(), Arc::new(ToolRegistry::new()));

    let run = agent.run("hello").await;

    assert_eq!(run.outcome.final_text(), Some("All good."));
    assert_eq!(backend.call_count(), 3);
    // Retries happened inside one loop iteration
    assert_eq!(run.iterations, 1);

    // The transcript shows no trace of the faults.
    let history = run.conversation.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[1].role, Role::Assistant);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_fail_the_run() {
    let backend = ScriptedBackend::new(vec![
        Err(OctoagentError::unavailable("down")),
        Err(OctoagentError::unavailable("down")),
        Err(OctoagentError::unavailable("down")),
        Err(OctoagentError::unavailable("down")),
    ]);
    let mut config = test_config();
    config.agent.backend_retries = 3;
    let agent = Agent::with_backend(config, backend.clone(), Arc::new(ToolRegistry::new()));

    let run = agent.run("hello").await;

    match run.outcome {
        AgentOutcome::Failed { kind, .. } => assert_eq!(kind, FailureKind::BackendUnavailable),
        AgentOutcome::Complete { .. } => panic!("expected failure"),
    }
    // Initial attempt plus three retries
    assert_eq!(backend.call_count(), 4);
}

#[tokio::test]
async fn protocol_errors_are_not_retried() {
    let backend = ScriptedBackend::new(vec![Err(OctoagentError::protocol("bad payload"))]);
    let agent = Agent::with_backend(test_config(), backend.clone(), Arc::new(ToolRegistry::new()));

    let run = agent.run("hello").await;

    match run.outcome {
        AgentOutcome::Failed { kind, .. } => assert_eq!(kind, FailureKind::BackendProtocol),
        AgentOutcome::Complete { .. } => panic!("expected failure"),
    }
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn tool_failures_are_surfaced_as_conversation_content() {
    let backend = ScriptedBackend::new(vec![
        Ok(tool_calls(
            "",
            vec![ToolCallRequest::new(
                "t1",
                "create_issue",
                serde_json::json!({"title": "Typo in README.md"}),
            )],
        )),
        Ok(BackendResponse::Final(
            "Could not create the issue.".to_string(),
        )),
    ]);
    let tools = registry_with("create_issue", Arc::new(FaultyTool));
    let agent = Agent::with_backend(test_config(), backend, tools);

    let run = agent.run("Open an issue about the typo").await;

    // The handler fault did not crash the loop; the model saw it and answered.
    assert!(run.outcome.is_complete());
    let history = run.conversation.history();
    assert_eq!(history[2].role, Role::ToolResult);
    assert!(history[2].content.contains("tool_execution_error"));
    assert!(history[2].content.contains("boom"));
}

#[tokio::test]
async fn unknown_tool_requests_are_answered_not_fatal() {
    let backend = ScriptedBackend::new(vec![
        Ok(tool_calls(
            "",
            vec![ToolCallRequest::new(
                "t1",
                "no_such_tool",
                serde_json::json!({}),
            )],
        )),
        Ok(BackendResponse::Final("Never mind.".to_string())),
    ]);
    let agent = Agent::with_backend(
        test_config(),
        backend,
        Arc::new(ToolRegistry::new()),
    );

    let run = agent.run("use a tool you do not have").await;

    assert!(run.outcome.is_complete());
    let history = run.conversation.history();
    assert!(history[2].content.contains("unknown_tool"));
}

#[tokio::test]
async fn multiple_tool_calls_are_answered_in_request_order() {
    let backend = ScriptedBackend::new(vec![
        Ok(tool_calls(
            "",
            vec![
                ToolCallRequest::new("t1", "get_file_contents", serde_json::json!({"path": "a"})),
                ToolCallRequest::new("t2", "list_issues", serde_json::json!({})),
            ],
        )),
        Ok(BackendResponse::Final("done".to_string())),
    ]);

    let mut registry = ToolRegistry::new();
    registry
        .register(
            object_schema("get_file_contents"),
            Arc::new(StaticTool("file data")),
        )
        .unwrap();
    registry
        .register(object_schema("list_issues"), Arc::new(StaticTool("no issues")))
        .unwrap();
    let agent = Agent::with_backend(test_config(), backend, Arc::new(registry));

    let run = agent.run("read a file, then list issues").await;

    assert!(run.outcome.is_complete());
    let history = run.conversation.history();
    assert_eq!(history.len(), 5);
    assert_eq!(history[2].tool_call_id.as_deref(), Some("t1"));
    assert_eq!(history[3].tool_call_id.as_deref(), Some("t2"));
}

#[tokio::test]
async fn cancellation_between_steps_terminates_without_partial_messages() {
    let backend = ScriptedBackend::new(vec![Ok(tool_calls(
        "",
        vec![ToolCallRequest::new("t1", "cancel_me", serde_json::json!({}))],
    ))]);

    let tool = Arc::new(CancellingTool {
        token: Mutex::new(None),
    });
    let mut registry = ToolRegistry::new();
    registry
        .register(object_schema("cancel_me"), Arc::clone(&tool) as Arc<dyn ToolHandler>)
        .unwrap();

    let agent = Agent::with_backend(test_config(), backend, Arc::new(registry));
    *tool.token.lock().unwrap() = Some(agent.cancellation_token());

    let run = agent.run("do something").await;

    // The in-flight tool batch finished and was recorded; the run then
    // terminated before consulting the backend again.
    match run.outcome {
        AgentOutcome::Failed { kind, .. } => assert_eq!(kind, FailureKind::Cancelled),
        AgentOutcome::Complete { .. } => panic!("expected cancellation"),
    }
    let history = run.conversation.history();
    assert_eq!(history.len(), 3);
    assert_eq!(history[2].role, Role::ToolResult);
    assert_eq!(history[2].content, "interrupted");
}

#[tokio::test]
async fn concurrent_runs_over_one_registry_stay_isolated() {
    let tools = registry_with("get_file_contents", Arc::new(StaticTool("shared data")));

    let backend_a = ScriptedBackend::new(vec![
        Ok(tool_calls(
            "",
            vec![ToolCallRequest::new(
                "a1",
                "get_file_contents",
                serde_json::json!({"path": "a"}),
            )],
        )),
        Ok(BackendResponse::Final("answer A".to_string())),
    ]);
    let backend_b = ScriptedBackend::new(vec![
        Ok(tool_calls(
            "",
            vec![ToolCallRequest::new(
                "b1",
                "get_file_contents",
                serde_json::json!({"path": "b"}),
            )],
        )),
        Ok(BackendResponse::Final("answer B".to_string())),
    ]);

    let agent_a = Agent::with_backend(test_config(), backend_a, Arc::clone(&tools));
    let agent_b = Agent::with_backend(test_config(), backend_b, tools);

    let (run_a, run_b) = tokio::join!(agent_a.run("task A"), agent_b.run("task B"));

    assert_eq!(run_a.outcome.final_text(), Some("answer A"));
    assert_eq!(run_b.outcome.final_text(), Some("answer B"));

    // Each conversation only ever saw its own tool call ids.
    let ids_a: Vec<&str> = run_a
        .conversation
        .history()
        .iter()
        .filter_map(|m| m.tool_call_id.as_deref())
        .collect();
    let ids_b: Vec<&str> = run_b
        .conversation
        .history()
        .iter()
        .filter_map(|m| m.tool_call_id.as_deref())
        .collect();
    assert_eq!(ids_a, ["a1"]);
    assert_eq!(ids_b, ["b1"]);
}

#[tokio::test]
async fn fresh_conversation_per_run() {
    let backend = ScriptedBackend::new(vec![
        Ok(BackendResponse::Final("first".to_string())),
        Ok(BackendResponse::Final("second".to_string())),
    ]);
    let agent = Agent::with_backend(test_config(), backend, Arc::new(ToolRegistry::new()));

    let first = agent.run("task one").await;
    let second = agent.run("task two").await;

    // Two independent runs: each transcript starts from its own user message.
    assert_eq!(first.conversation.len(), 2);
    assert_eq!(second.conversation.len(), 2);
    assert_eq!(second.conversation.history()[0].content, "task two");
}
