//! Config loading entry point: defaults, then config file, then environment.

use super::merge::merge_policy;
use super::sources::{config_file, environment};
use super::RelayConfig;
use crate::error::RelayError;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from an explicit file path.
    pub fn load_from_file(path: &Path) -> Result<RelayConfig, RelayError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = config_file::add_to_builder(builder, path)?;
        let builder = environment::add_to_builder(builder);

        let config: RelayConfig = builder.build()?.try_deserialize()?;
        debug!(
            config_path = %path.display(),
            models = config.models.len(),
            allowed_usernames = config.allowed_telegram_usernames.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Load from `path` when given, else from the default location.
    pub fn load(path: Option<&Path>) -> Result<RelayConfig, RelayError> {
        let resolved = Self::resolve_path(path)?;
        Self::load_from_file(&resolved)
    }

    pub fn resolve_path(path: Option<&Path>) -> Result<PathBuf, RelayError> {
        match path {
            Some(path) => Ok(path.to_path_buf()),
            None => config_file::default_config_path().ok_or_else(|| {
                RelayError::Config(
                    "no config path given and no platform config directory available".to_string(),
                )
            }),
        }
    }
}
