//! Configuration management for Octoagent
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/octoagent/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{OctoagentError, Result};

/// Main configuration for Octoagent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Ollama configuration
    pub ollama: OllamaConfig,
    /// Model configuration
    pub model: ModelConfig,
    /// GitHub configuration
    pub github: GitHubConfig,
    /// Agent configuration
    pub agent: AgentConfig,
}

/// Ollama server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL of the Ollama API (default: http://localhost:11434)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model used for the agent loop
    /// Default: qwen3:32b
    pub name: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Context window size passed to Ollama
    pub num_ctx: u32,
}

/// GitHub API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Personal access token (from GITHUB_PERSONAL_ACCESS_TOKEN)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// API base URL
    pub api_base: String,
}

/// Agent behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum loop iterations before the run fails
    /// Default: 10
    pub max_iterations: usize,
    /// Per-call timeout for tool invocations in seconds
    pub tool_timeout_secs: u64,
    /// Retries for transient backend faults
    pub backend_retries: usize,
    /// Base delay for exponential retry backoff in milliseconds
    pub retry_base_delay_ms: u64,
    /// System prompt override; a repository-aware default is built when unset
    pub system_prompt: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama: OllamaConfig::default(),
            model: ModelConfig::default(),
            github: GitHubConfig::default(),
            agent: AgentConfig::default(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: env::var("OLLAMA_API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            timeout_secs: 600,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: env::var("OCTOAGENT_MODEL").unwrap_or_else(|_| "qwen3:32b".to_string()),
            temperature: 0.1,
            num_ctx: 120_000,
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: env::var("GITHUB_PERSONAL_ACCESS_TOKEN").ok(),
            owner: env::var("OCTOAGENT_GITHUB_OWNER")
                .unwrap_or_else(|_| "frtendero".to_string()),
            repo: env::var("OCTOAGENT_GITHUB_REPO")
                .unwrap_or_else(|_| "spring-into-haystack".to_string()),
            api_base: "https://api.github.com".to_string(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            tool_timeout_secs: 60,
            backend_retries: 3,
            retry_base_delay_ms: 500,
            system_prompt: None,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("octoagent")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load() -> Self {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        // Try to load from config file
        if let Ok(config) = Self::load_from_file() {
            return config;
        }

        // Fall back to defaults (which respect env vars)
        Self::default()
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(OctoagentError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| OctoagentError::config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| OctoagentError::config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to the default config file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file())
    }

    /// Save configuration to the given path, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| {
                    OctoagentError::config(format!("Failed to create config dir: {}", e))
                })?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| OctoagentError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content)
            .map_err(|e| OctoagentError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// The system prompt used for the agent, built from the repository
    /// context when no override is configured
    pub fn system_prompt(&self) -> String {
        if let Some(ref prompt) = self.agent.system_prompt {
            return prompt.clone();
        }

        format!(
            "You are a helpful agent provided with tools to perform different tasks \
             on the GitHub repository https://github.com/{owner}/{repo} owned by user \
             {owner}. You will be prompted to perform tasks such as reading files on \
             the repository, checking for errors in the files, listing, reading and \
             creating issues, and other typical GitHub tasks.",
            owner = self.github.owner,
            repo = self.github.repo,
        )
    }
}
