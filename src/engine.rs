//! Generation Engine Invoker
//!
//! One blocking call-out per request to an external llamafile. The worker
//! awaits the process to completion; there is no timeout, so a hung engine
//! holds the whole processing queue.

use crate::config::EngineConfig;
use crate::error::EngineError;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Text generation backend trait
#[async_trait]
pub trait GenerationEngine: Send + Sync {
    /// Run the engine at `executable` on `prompt` with extra `params` and
    /// return the trimmed standard output.
    async fn generate(
        &self,
        executable: &str,
        prompt: &str,
        params: &[String],
    ) -> Result<String, EngineError>;
}

/// Runs llamafiles as child processes, optionally through a launcher such as `bash`.
#[derive(Debug, Clone)]
pub struct LlamafileEngine {
    launcher: Option<String>,
    silent_prompt_flag: String,
}

impl LlamafileEngine {
    pub fn new(launcher: Option<String>, silent_prompt_flag: impl Into<String>) -> Self {
        Self {
            launcher,
            silent_prompt_flag: silent_prompt_flag.into(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.launcher().map(String::from),
            config.silent_prompt_flag.clone(),
        )
    }

    /// Arguments after the program name: `-p "<prompt>" <params..> <silent flag>`.
    pub fn prompt_args(&self, prompt: &str, params: &[String]) -> Vec<String> {
        let mut args = Vec::with_capacity(params.len() + 3);
        args.push("-p".to_string());
        args.push(format!("\"{}\"", prompt));
        args.extend(params.iter().cloned());
        args.push(self.silent_prompt_flag.clone());
        args
    }

    fn command(&self, executable: &str, prompt: &str, params: &[String]) -> Command {
        let mut command = match &self.launcher {
            Some(launcher) => {
                let mut command = Command::new(launcher);
                command.arg(executable);
                command
            }
            None => Command::new(executable),
        };
        command
            .args(self.prompt_args(prompt, params))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        command
    }
}

impl Default for LlamafileEngine {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

#[async_trait]
impl GenerationEngine for LlamafileEngine {
    async fn generate(
        &self,
        executable: &str,
        prompt: &str,
        params: &[String],
    ) -> Result<String, EngineError> {
        debug!(
            executable,
            launcher = ?self.launcher,
            param_count = params.len(),
            "Running generation engine"
        );

        let output = self
            .command(executable, prompt, params)
            .output()
            .await
            .map_err(|source| EngineError::Spawn {
                path: executable.to_string(),
                params: params.to_vec(),
                source,
            })?;

        if !output.status.success() {
            return Err(EngineError::Exit {
                path: executable.to_string(),
                params: params.to_vec(),
                status: output.status,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
