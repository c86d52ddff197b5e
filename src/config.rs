//! Configuration management for the assistant relay
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{Result, RelayError};
use crate::locales::Lang;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Application-level settings
    #[serde(default)]
    pub app: AppConfig,
    /// Remote service settings
    #[serde(default)]
    pub openai: OpenAiConfig,
    /// Run polling settings
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Local tool settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Deployment environment
///
/// Anything other than `Production` short-circuits completions to a canned
/// reply without contacting the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    /// Talk to the remote service
    Production,
    /// Return canned replies
    #[default]
    Development,
}

impl AppEnv {
    /// Returns true when completions must reach the remote service
    pub fn is_production(&self) -> bool {
        matches!(self, AppEnv::Production)
    }
}

impl FromStr for AppEnv {
    type Err = RelayError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" => Ok(AppEnv::Production),
            "development" | "local" | "test" => Ok(AppEnv::Development),
            other => Err(RelayError::Config(format!(
                "Invalid app env: {}. Must be one of: production, development",
                other
            ))),
        }
    }
}

/// Application-level settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Deployment environment
    #[serde(default)]
    pub env: AppEnv,
    /// Language for user-facing messages
    #[serde(default)]
    pub lang: Lang,
}

/// Remote assistant service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key sent as a bearer token
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the service (overridable for tests and proxies)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Assistant the runs are created against
    #[serde(default)]
    pub assistant_id: Option<String>,

    /// Chat completion settings
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Model used instead of the completion model when a message carries an image
    #[serde(default = "default_vision_model")]
    pub vision_model: String,

    /// Image generation settings
    #[serde(default)]
    pub image: ImageConfig,
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_timeout_ms() -> u64 {
    9_000
}

fn default_vision_model() -> String {
    "gpt-4o".to_string()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            assistant_id: None,
            completion: CompletionConfig::default(),
            vision_model: default_vision_model(),
            image: ImageConfig::default(),
        }
    }
}

impl OpenAiConfig {
    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Chat completion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Model name
    #[serde(default = "default_completion_model")]
    pub model: String,
    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,
    /// Maximum tokens in the reply
    #[serde(default = "default_completion_max_tokens")]
    pub max_tokens: u32,
    /// Frequency penalty
    #[serde(default)]
    pub frequency_penalty: f32,
    /// Presence penalty
    #[serde(default = "default_presence_penalty")]
    pub presence_penalty: f32,
}

fn default_completion_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_completion_max_tokens() -> u32 {
    64
}

fn default_presence_penalty() -> f32 {
    0.6
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: default_completion_model(),
            temperature: 0.0,
            max_tokens: default_completion_max_tokens(),
            frequency_penalty: 0.0,
            presence_penalty: default_presence_penalty(),
        }
    }
}

/// Image generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Model name
    #[serde(default = "default_image_model")]
    pub model: String,
    /// Requested size, e.g. `256x256`
    #[serde(default = "default_image_size")]
    pub size: String,
    /// Quality hint
    #[serde(default = "default_image_quality")]
    pub quality: String,
}

fn default_image_model() -> String {
    "dall-e-2".to_string()
}

fn default_image_size() -> String {
    "256x256".to_string()
}

fn default_image_quality() -> String {
    "standard".to_string()
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            model: default_image_model(),
            size: default_image_size(),
            quality: default_image_quality(),
        }
    }
}

/// Run polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Fixed delay between run status polls (milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum time a single run may be polled (seconds)
    #[serde(default = "default_deadline_seconds")]
    pub deadline_seconds: u64,
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_deadline_seconds() -> u64 {
    120
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            deadline_seconds: default_deadline_seconds(),
        }
    }
}

impl RunnerConfig {
    /// Poll interval as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Deadline as a `Duration`
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_seconds)
    }
}

/// Local tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to the roster data file
    #[serde(default = "default_roster_path")]
    pub roster_path: String,

    /// Offset from UTC used for "today" in date tools
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

fn default_roster_path() -> String {
    "config/roster.yaml".to_string()
}

fn default_utc_offset_hours() -> i32 {
    7
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            roster_path: default_roster_path(),
            utc_offset_hours: default_utc_offset_hours(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars()?;
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RelayError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| RelayError::Config(format!("Failed to parse config: {}", e)).into())
    }

    /// Apply environment variable overrides
    ///
    /// # Errors
    ///
    /// Returns error if `APP_ENV` or `APP_LANG` is set to an unknown value
    fn apply_env_vars(&mut self) -> Result<()> {
        if let Ok(env) = std::env::var("APP_ENV") {
            let v = env.parse::<AppEnv>().map_err(|e| {
                tracing::error!("Invalid value for APP_ENV: {}", env);
                e
            })?;
            self.app.env = v;
            tracing::debug!(env = ?v, "Env override: APP_ENV");
        }

        if let Ok(lang) = std::env::var("APP_LANG") {
            self.app.lang = lang.parse::<Lang>().map_err(|e| {
                tracing::error!("Invalid value for APP_LANG: {}", lang);
                e
            })?;
        }

        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.openai.api_key = Some(key);
        }
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            self.openai.base_url = base_url;
        }
        if let Ok(assistant_id) = std::env::var("OPENAI_ASSISTANT_ID") {
            self.openai.assistant_id = Some(assistant_id);
        }
        if let Ok(timeout) = std::env::var("OPENAI_TIMEOUT") {
            match timeout.parse::<u64>() {
                Ok(v) => self.openai.timeout_ms = v,
                Err(_) => tracing::warn!("Invalid value for OPENAI_TIMEOUT: {}", timeout),
            }
        }

        if let Ok(model) = std::env::var("OPENAI_COMPLETION_MODEL") {
            self.openai.completion.model = model;
        }
        if let Ok(temperature) = std::env::var("OPENAI_COMPLETION_TEMPERATURE") {
            match temperature.parse::<f32>() {
                Ok(v) => self.openai.completion.temperature = v,
                Err(_) => tracing::warn!(
                    "Invalid value for OPENAI_COMPLETION_TEMPERATURE: {}",
                    temperature
                ),
            }
        }
        if let Ok(max_tokens) = std::env::var("OPENAI_COMPLETION_MAX_TOKENS") {
            match max_tokens.parse::<u32>() {
                Ok(v) => self.openai.completion.max_tokens = v,
                Err(_) => tracing::warn!(
                    "Invalid value for OPENAI_COMPLETION_MAX_TOKENS: {}",
                    max_tokens
                ),
            }
        }
        if let Ok(model) = std::env::var("OPENAI_VISION_MODEL") {
            self.openai.vision_model = model;
        }

        if let Ok(model) = std::env::var("OPENAI_IMAGE_GENERATION_MODEL") {
            self.openai.image.model = model;
        }
        if let Ok(size) = std::env::var("OPENAI_IMAGE_GENERATION_SIZE") {
            self.openai.image.size = size;
        }
        if let Ok(quality) = std::env::var("OPENAI_IMAGE_GENERATION_QUALITY") {
            self.openai.image.quality = quality;
        }

        if let Ok(interval) = std::env::var("RELAY_POLL_INTERVAL_MS") {
            match interval.parse::<u64>() {
                Ok(v) => self.runner.poll_interval_ms = v,
                Err(_) => tracing::warn!("Invalid value for RELAY_POLL_INTERVAL_MS: {}", interval),
            }
        }
        if let Ok(deadline) = std::env::var("RELAY_RUN_DEADLINE_SECONDS") {
            match deadline.parse::<u64>() {
                Ok(v) => self.runner.deadline_seconds = v,
                Err(_) => tracing::warn!(
                    "Invalid value for RELAY_RUN_DEADLINE_SECONDS: {}",
                    deadline
                ),
            }
        }
        if let Ok(path) = std::env::var("RELAY_ROSTER_PATH") {
            self.tools.roster_path = path;
        }

        Ok(())
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(env) = cli.env {
            tracing::debug!(env = ?env, "CLI override: --env");
            self.app.env = env;
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any value is out of range, or if production mode is
    /// selected without credentials or an assistant id
    pub fn validate(&self) -> Result<()> {
        if self.runner.poll_interval_ms == 0 {
            return Err(RelayError::Config(
                "runner.poll_interval_ms must be greater than 0".to_string(),
            )
            .into());
        }

        if self.runner.deadline_seconds == 0 {
            return Err(RelayError::Config(
                "runner.deadline_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.openai.base_url.trim().is_empty() {
            return Err(
                RelayError::Config("openai.base_url cannot be empty".to_string()).into(),
            );
        }

        if !(-12..=14).contains(&self.tools.utc_offset_hours) {
            return Err(RelayError::Config(
                "tools.utc_offset_hours must be between -12 and 14".to_string(),
            )
            .into());
        }

        if self.app.env.is_production() {
            if self
                .openai
                .api_key
                .as_deref()
                .map_or(true, |k| k.trim().is_empty())
            {
                return Err(RelayError::MissingCredentials(
                    "OPENAI_API_KEY is required in production".to_string(),
                )
                .into());
            }
            if self
                .openai
                .assistant_id
                .as_deref()
                .map_or(true, |a| a.trim().is_empty())
            {
                return Err(RelayError::Config(
                    "openai.assistant_id is required in production".to_string(),
                )
                .into());
            }
        }

        Ok(())
    }
}
