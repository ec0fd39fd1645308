//! GitHub tools - repository inspection and issue management
//!
//! Implements the `get_file_contents`, `create_issue`, and `list_issues`
//! tools against the GitHub REST v3 API. Each tool is a handler registered
//! into the ToolRegistry; failures map to errors the invoker wraps as
//! failure descriptors for the model.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::core::{Config, OctoagentError, Result, ToolSchema};
use crate::tools::registry::{ToolHandler, ToolRegistry};

const RAW_CONTENT_TYPE: &str = "application/vnd.github.raw+json";
const JSON_CONTENT_TYPE: &str = "application/vnd.github+json";

/// GitHub REST API client scoped to a single repository
pub struct GitHubClient {
    client: Client,
    api_base: String,
    owner: String,
    repo: String,
    token: Option<String>,
}

/// Issue as returned by the list endpoint
#[derive(Debug, Deserialize)]
struct Issue {
    number: u64,
    title: String,
    state: String,
    html_url: String,
    #[serde(default)]
    labels: Vec<Label>,
    // Present only when the "issue" is actually a pull request
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Label {
    name: String,
}

/// Issue as returned by the create endpoint
#[derive(Debug, Deserialize)]
struct CreatedIssue {
    number: u64,
    html_url: String,
}

impl GitHubClient {
    /// Create a client from configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.github.api_base,
            &config.github.owner,
            &config.github.repo,
            config.github.token.clone(),
        )
    }

    /// Create a client with explicit settings
    pub fn new(
        api_base: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        let api_base: String = api_base.into();

        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            owner: owner.into(),
            repo: repo.into(),
            token,
        }
    }

    fn headers(&self, accept: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("octoagent"));
        if let Ok(value) = HeaderValue::from_str(accept) {
            headers.insert(ACCEPT, value);
        }
        if let Some(ref token) = self.token {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers
    }

    fn repo_url(&self, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.owner, self.repo, suffix
        )
    }

    /// Fetch the raw contents of a file in the repository
    pub async fn get_file_contents(&self, path: &str, reference: Option<&str>) -> Result<String> {
        let mut request = self
            .client
            .get(self.repo_url(&format!("contents/{}", path)))
            .headers(self.headers(RAW_CONTENT_TYPE));

        if let Some(reference) = reference {
            request = request.query(&[("ref", reference)]);
        }

        debug!(path, "Fetching file contents");
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OctoagentError::github(format!(
                "GET contents/{} failed ({}): {}",
                path, status, body
            )));
        }

        Ok(response.text().await?)
    }

    /// Create an issue and return a short summary of what was created
    pub async fn create_issue(
        &self,
        title: &str,
        body: Option<&str>,
        labels: &[String],
    ) -> Result<String> {
        let payload = serde_json::json!({
            "title": title,
            "body": body.unwrap_or(""),
            "labels": labels,
        });

        debug!(title, "Creating issue");
        let response = self
            .client
            .post(self.repo_url("issues"))
            .headers(self.headers(JSON_CONTENT_TYPE))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OctoagentError::github(format!(
                "POST issues failed ({}): {}",
                status, body
            )));
        }

        let created: CreatedIssue = response.json().await?;
        Ok(format!(
            "Created issue #{}: {} ({})",
            created.number, title, created.html_url
        ))
    }

    /// List issues on the repository, formatted one per line
    pub async fn list_issues(&self, state: &str) -> Result<String> {
        let response = self
            .client
            .get(self.repo_url("issues"))
            .headers(self.headers(JSON_CONTENT_TYPE))
            .query(&[("state", state)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OctoagentError::github(format!(
                "GET issues failed ({}): {}",
                status, body
            )));
        }

        let issues: Vec<Issue> = response.json().await?;

        // The issues endpoint also returns pull requests; skip those.
        let lines: Vec<String> = issues
            .iter()
            .filter(|issue| issue.pull_request.is_none())
            .map(|issue| {
                let labels: Vec<&str> = issue.labels.iter().map(|l| l.name.as_str()).collect();
                format!(
                    "#{} [{}] {} (labels: {}) {}",
                    issue.number,
                    issue.state,
                    issue.title,
                    if labels.is_empty() {
                        "none".to_string()
                    } else {
                        labels.join(", ")
                    },
                    issue.html_url
                )
            })
            .collect();

        if lines.is_empty() {
            Ok(format!("No {} issues found.", state))
        } else {
            Ok(lines.join("\n"))
        }
    }
}

fn require_str(arguments: &serde_json::Value, key: &str) -> Result<String> {
    arguments
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| OctoagentError::github(format!("missing required argument '{}'", key)))
}

/// Handler for the `get_file_contents` tool
pub struct GetFileContentsTool(Arc<GitHubClient>);

#[async_trait]
impl ToolHandler for GetFileContentsTool {
    async fn call(&self, arguments: &serde_json::Value) -> Result<String> {
        let path = require_str(arguments, "path")?;
        let reference = arguments.get("ref").and_then(|v| v.as_str());
        self.0.get_file_contents(&path, reference).await
    }
}

/// Handler for the `create_issue` tool
pub struct CreateIssueTool(Arc<GitHubClient>);

#[async_trait]
impl ToolHandler for CreateIssueTool {
    async fn call(&self, arguments: &serde_json::Value) -> Result<String> {
        let title = require_str(arguments, "title")?;
        let body = arguments.get("body").and_then(|v| v.as_str());
        let labels: Vec<String> = arguments
            .get("labels")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|l| l.as_str().map(|s| s.to_string()))
                    .collect()
            })
            .unwrap_or_default();
        self.0.create_issue(&title, body, &labels).await
    }
}

/// Handler for the `list_issues` tool
pub struct ListIssuesTool(Arc<GitHubClient>);

#[async_trait]
impl ToolHandler for ListIssuesTool {
    async fn call(&self, arguments: &serde_json::Value) -> Result<String> {
        let state = arguments
            .get("state")
            .and_then(|v| v.as_str())
            .unwrap_or("open");
        self.0.list_issues(state).await
    }
}

/// Register the GitHub tool set into a registry
pub fn register_github_tools(registry: &mut ToolRegistry, client: Arc<GitHubClient>) -> Result<()> {
    registry.register(
        ToolSchema::new(
            "get_file_contents",
            "Read the contents of a file from the repository",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path of the file within the repository"
                    },
                    "ref": {
                        "type": "string",
                        "description": "Branch, tag, or commit to read from (optional)"
                    }
                },
                "required": ["path"]
            }),
        ),
        Arc::new(GetFileContentsTool(Arc::clone(&client))),
    )?;

    registry.register(
        ToolSchema::new(
            "create_issue",
            "Create an issue on the repository",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "Issue title"
                    },
                    "body": {
                        "type": "string",
                        "description": "Issue description"
                    },
                    "labels": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Labels to apply to the issue"
                    }
                },
                "required": ["title"]
            }),
        ),
        Arc::new(CreateIssueTool(Arc::clone(&client))),
    )?;

    registry.register(
        ToolSchema::new(
            "list_issues",
            "List issues on the repository",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "state": {
                        "type": "string",
                        "enum": ["open", "closed", "all"],
                        "description": "Which issues to list (default: open)"
                    }
                }
            }),
        ),
        Arc::new(ListIssuesTool(client)),
    )?;

    Ok(())
}
