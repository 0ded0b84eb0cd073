//! Error types for the llamarelay message relay.

use crate::format::format_params;
use std::process::ExitStatus;
use thiserror::Error;

/// Failure of a single external engine invocation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to run '{path}' with params {}: {source}", format_params(.params))]
    Spawn {
        path: String,
        params: Vec<String>,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to run '{path}' with params {}: {status}", format_params(.params))]
    Exit {
        path: String,
        params: Vec<String>,
        status: ExitStatus,
    },
}

impl EngineError {
    /// Executable path of the failed invocation
    pub fn path(&self) -> &str {
        match self {
            EngineError::Spawn { path, .. } | EngineError::Exit { path, .. } => path,
        }
    }

    /// Extra parameters of the failed invocation
    pub fn params(&self) -> &[String] {
        match self {
            EngineError::Spawn { params, .. } | EngineError::Exit { params, .. } => params,
        }
    }
}

/// Reply delivery errors
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Failed to send message: {0}")]
    Rejected(String),
}

/// Process-level errors. Anything of this kind stops the listening loop.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Queue closed unexpectedly: {0}")]
    QueueClosed(&'static str),

    #[error("Failed to get info about this bot: {0}")]
    Identify(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Telegram error: {0}")]
    Telegram(String),

    #[error("Logging error: {0}")]
    Logging(String),
}

impl From<config::ConfigError> for RelayError {
    fn from(err: config::ConfigError) -> Self {
        RelayError::Config(err.to_string())
    }
}
