//! Configuration System
//!
//! Layered configuration (defaults, config file, environment) for the bot
//! token, the allow-list, the model set and the pipeline/engine settings.
//! Loaded once at startup and shared read-only afterwards.

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

mod facade;
mod merge;
mod model;
mod sources;

pub use facade::ConfigLoader;
pub use model::{Misconfiguration, ModelConfig, UsableModel};
pub use sources::config_file::default_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Telegram bot API token
    pub telegram_bot_token: String,

    /// Usernames allowed to talk to the bot; empty allows everyone
    #[serde(default)]
    pub allowed_telegram_usernames: Vec<String>,

    /// Models every message is fanned out to
    #[serde(default)]
    pub models: Vec<ModelConfig>,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Pipeline queue settings. The processing queue always holds one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Capacity of the admission queue
    #[serde(default = "default_admission_capacity")]
    pub admission_capacity: usize,
}

fn default_admission_capacity() -> usize {
    10
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            admission_capacity: default_admission_capacity(),
        }
    }
}

/// How llamafiles are executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Program the llamafile is run through; empty runs it directly
    #[serde(default = "default_launcher")]
    pub launcher: Option<String>,

    /// Flag that keeps the engine from echoing the prompt
    #[serde(default = "default_silent_prompt_flag")]
    pub silent_prompt_flag: String,
}

fn default_launcher() -> Option<String> {
    Some("bash".to_string())
}

fn default_silent_prompt_flag() -> String {
    "--silent-prompt".to_string()
}

impl EngineConfig {
    /// Launcher with an empty value treated as "run directly".
    pub fn launcher(&self) -> Option<&str> {
        self.launcher.as_deref().filter(|l| !l.is_empty())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            launcher: default_launcher(),
            silent_prompt_flag: default_silent_prompt_flag(),
        }
    }
}

/// Telegram long-polling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Long-poll timeout passed to getUpdates
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u32,

    /// Pause after a failed getUpdates call
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

fn default_timeout_secs() -> u32 {
    30
}

fn default_retry_delay_secs() -> u64 {
    5
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Telegram(String),
    Queue(String),
    Models(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Telegram(msg) => write!(f, "Telegram: {}", msg),
            ValidationError::Queue(msg) => write!(f, "Queue: {}", msg),
            ValidationError::Models(msg) => write!(f, "Models: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl RelayConfig {
    /// Validate the entire configuration.
    ///
    /// Misconfigured models are not errors here: the worker answers them
    /// with a misconfiguration reply.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.telegram_bot_token.trim().is_empty() {
            errors.push(ValidationError::Telegram(
                "telegram_bot_token cannot be empty".to_string(),
            ));
        }

        if self.queue.admission_capacity == 0 {
            errors.push(ValidationError::Queue(
                "admission_capacity must be at least 1".to_string(),
            ));
        }

        if !self.models.iter().any(ModelConfig::is_enabled) {
            errors.push(ValidationError::Models(
                "no enabled models configured".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Enabled models paired with the reason they cannot run, if any.
    pub fn misconfigured_models(&self) -> Vec<Misconfiguration> {
        self.models
            .iter()
            .filter(|model| model.is_enabled())
            .filter_map(|model| model.usable().err())
            .collect()
    }

    /// Models as shared handles, in configuration order.
    pub fn shared_models(&self) -> Vec<Arc<ModelConfig>> {
        self.models.iter().cloned().map(Arc::new).collect()
    }
}
