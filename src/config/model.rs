//! Model entries: one configured llamafile plus its prompt-construction rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// One `models` entry from the config file.
///
/// The three llamafile fields are optional at the serde level so that a
/// partially written entry still loads; [`ModelConfig::usable`] decides
/// whether the entry may be run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Display name used in replies and logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Path to the llamafile executable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llamafile_path: Option<String>,

    /// Prompt template containing the placeholder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llamafile_prompt_pattern: Option<String>,

    /// Token replaced by the message text inside the template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llamafile_prompt_placeholder: Option<String>,

    /// Extra arguments passed after the prompt
    #[serde(default)]
    pub llamafile_other_parameters: Vec<String>,

    #[serde(default)]
    pub disabled: bool,
}

/// Borrowed view of a model that has every field required to run.
#[derive(Debug, Clone, Copy)]
pub struct UsableModel<'a> {
    pub path: &'a str,
    pub prompt_pattern: &'a str,
    pub placeholder: &'a str,
    pub parameters: &'a [String],
}

impl UsableModel<'_> {
    /// Base name of the executable, used to name the model in replies.
    pub fn base_name(&self) -> String {
        executable_base_name(self.path)
    }
}

/// A model entry that is missing required fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Misconfiguration {
    pub model: String,
    pub missing: Vec<&'static str>,
}

impl fmt::Display for Misconfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "misconfiguration in your config ({}: missing {})",
            self.model,
            self.missing.join(", ")
        )
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn executable_base_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

impl ModelConfig {
    /// Check that path, template and placeholder are all present and non-empty.
    pub fn usable(&self) -> Result<UsableModel<'_>, Misconfiguration> {
        let path = present(&self.llamafile_path);
        let prompt_pattern = present(&self.llamafile_prompt_pattern);
        let placeholder = present(&self.llamafile_prompt_placeholder);

        match (path, prompt_pattern, placeholder) {
            (Some(path), Some(prompt_pattern), Some(placeholder)) => Ok(UsableModel {
                path,
                prompt_pattern,
                placeholder,
                parameters: &self.llamafile_other_parameters,
            }),
            _ => {
                let mut missing = Vec::new();
                if path.is_none() {
                    missing.push("llamafile_path");
                }
                if prompt_pattern.is_none() {
                    missing.push("llamafile_prompt_pattern");
                }
                if placeholder.is_none() {
                    missing.push("llamafile_prompt_placeholder");
                }
                Err(Misconfiguration {
                    model: self.label(),
                    missing,
                })
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }

    /// Human-readable model name: the configured name, else the executable.
    pub fn label(&self) -> String {
        if let Some(name) = present(&self.name) {
            return name.to_string();
        }
        match present(&self.llamafile_path) {
            Some(path) => format!("Llamafile ({})", executable_base_name(path)),
            None => "misconfigured model".to_string(),
        }
    }
}

impl fmt::Display for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
