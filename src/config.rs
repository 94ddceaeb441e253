//! Configuration loading and management for meetprep.
//!
//! Loads settings from `meetprep.toml` with environment variable overrides for sensitive data.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("missing required API key for provider: {0}")]
    MissingApiKey(String),
    #[error("unknown LLM provider: {0}")]
    UnknownProvider(String),
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// LLM provider: "openai" or "gemini"
    pub provider: String,
    /// Model identifier (e.g., "gpt-4o-mini")
    pub model: String,
}

/// Web search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search depth hint passed to the search provider: "basic" or "advanced"
    #[serde(default = "default_depth")]
    pub depth: String,
}

/// API keys configuration (loaded from environment)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub openai_key: Option<String>,
    #[serde(default)]
    pub gemini_key: Option<String>,
    #[serde(default)]
    pub tavily_key: Option<String>,
}

/// Storage paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base path for data storage
    pub path: PathBuf,
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub agent: AgentConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from the default location (meetprep.toml in cwd or home)
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::find_config_file();
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Parse configuration text without touching the environment
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Override API keys from environment variables
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.api.openai_key = Some(key);
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.api.gemini_key = Some(key);
        }
        if let Ok(key) = std::env::var("TAVILY_API_KEY") {
            self.api.tavily_key = Some(key);
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> PathBuf {
        // Check current directory first
        let local_config = PathBuf::from("meetprep.toml");
        if local_config.exists() {
            return local_config;
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config").join("meetprep").join("meetprep.toml");
            if home_config.exists() {
                return home_config;
            }
        }

        // Default to local path (will error on read)
        local_config
    }

    /// Get the API key for the configured LLM provider
    pub fn llm_api_key(&self) -> Result<&str, ConfigError> {
        match self.agent.provider.as_str() {
            "openai" => self
                .api
                .openai_key
                .as_deref()
                .ok_or_else(|| ConfigError::MissingApiKey("openai".to_string())),
            "gemini" => self
                .api
                .gemini_key
                .as_deref()
                .ok_or_else(|| ConfigError::MissingApiKey("gemini".to_string())),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }

    /// Get the API key for the web search provider
    pub fn search_api_key(&self) -> Result<&str, ConfigError> {
        self.api
            .tavily_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingApiKey("tavily".to_string()))
    }

    /// Path of the sled database holding reports
    pub fn reports_path(&self) -> PathBuf {
        self.storage.path.join("reports")
    }
}

fn default_depth() -> String {
    "advanced".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: default_depth(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data"),
        }
    }
}
