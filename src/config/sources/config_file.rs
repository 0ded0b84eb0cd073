//! Config file source: the path given on the command line, or
//! `$XDG_CONFIG_HOME/llamarelay/config.json` when none is given.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Default config file location in the platform config directory.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "llamarelay").map(|dirs| dirs.config_dir().join("config.json"))
}

/// Add the config file to the builder. The file is required; its format
/// (JSON, TOML, ...) follows the extension.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::Message(format!(
            "config file not found: {}",
            path.display()
        )));
    }
    Ok(builder.add_source(File::from(path).required(true)))
}
