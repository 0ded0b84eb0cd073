//! CLI: clap definitions and the `check` report. The binary routes commands.

use crate::config::{ModelConfig, RelayConfig, ValidationError};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

/// Llamarelay - relay Telegram messages to local llamafile models
#[derive(Parser)]
#[command(name = "llamarelay")]
#[command(about = "Relay Telegram messages to locally hosted llamafile models")]
pub struct Cli {
    /// Configuration file path (JSON or TOML); defaults to the platform config dir
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Disable logging
    #[arg(long, short)]
    pub quiet: bool,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (default)
    Run,
    /// Validate the configuration and list models
    Check {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }
}

/// One model line of the check report
#[derive(Debug, Clone, Serialize)]
pub struct ModelReport {
    pub label: String,
    pub enabled: bool,
    pub usable: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<&'static str>,
}

impl ModelReport {
    fn from_model(model: &ModelConfig) -> Self {
        let missing = model.usable().err().map(|m| m.missing).unwrap_or_default();
        Self {
            label: model.label(),
            enabled: model.is_enabled(),
            usable: missing.is_empty(),
            missing,
        }
    }
}

/// Result of the `check` command
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub admission_capacity: usize,
    pub allow_all: bool,
    pub models: Vec<ModelReport>,
}

impl CheckReport {
    pub fn new(config: &RelayConfig) -> Self {
        let errors = config
            .validate()
            .err()
            .unwrap_or_default()
            .iter()
            .map(ValidationError::to_string)
            .collect::<Vec<_>>();
        Self {
            valid: errors.is_empty(),
            errors,
            admission_capacity: config.queue.admission_capacity,
            allow_all: config.allowed_telegram_usernames.is_empty(),
            models: config.models.iter().map(ModelReport::from_model).collect(),
        }
    }

    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!(
            "Configuration: {}",
            if self.valid { "valid" } else { "invalid" }
        ));
        for error in &self.errors {
            lines.push(format!("  error: {}", error));
        }
        lines.push(format!("Admission queue capacity: {}", self.admission_capacity));
        lines.push(format!(
            "Allowed users: {}",
            if self.allow_all { "everyone" } else { "allow-list" }
        ));
        lines.push(format!("Models ({}):", self.models.len()));
        for model in &self.models {
            let state = match (model.enabled, model.usable) {
                (false, _) => "disabled".to_string(),
                (true, true) => "ok".to_string(),
                (true, false) => format!("misconfigured, missing {}", model.missing.join(", ")),
            };
            lines.push(format!("  - {} [{}]", model.label, state));
        }
        lines.join("\n")
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
