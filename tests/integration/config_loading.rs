//! Layered configuration loading: defaults, file, environment

use super::test_utils::lock_env;
use llamarelay::config::{default_config_path, ConfigLoader};
use llamarelay::error::RelayError;
use tempfile::TempDir;

const MINIMAL_JSON: &str = r#"{
  "telegram_bot_token": "123:file-token",
  "models": [
    {
      "name": "tiny",
      "llamafile_path": "/models/tiny.llamafile",
      "llamafile_prompt_pattern": "{{P}}",
      "llamafile_prompt_placeholder": "{{P}}"
    }
  ]
}"#;

struct EnvVar {
    key: &'static str,
}

impl EnvVar {
    fn set(key: &'static str, value: &str) -> Self {
        std::env::set_var(key, value);
        Self { key }
    }
}

impl Drop for EnvVar {
    fn drop(&mut self) {
        std::env::remove_var(self.key);
    }
}

#[test]
fn test_file_values_with_defaults() {
    let _guard = lock_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("relay.json");
    std::fs::write(&path, MINIMAL_JSON).unwrap();

    let config = ConfigLoader::load(Some(path.as_path())).unwrap();
    assert_eq!(config.telegram_bot_token, "123:file-token");
    assert!(config.allowed_telegram_usernames.is_empty());
    assert_eq!(config.queue.admission_capacity, 10);
    assert_eq!(config.engine.launcher(), Some("bash"));
    assert_eq!(config.polling.retry_delay_secs, 5);
    assert_eq!(config.logging.level, "info");
    assert!(config.validate().is_ok());
}

#[test]
fn test_environment_overrides_file() {
    let _guard = lock_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("relay.json");
    std::fs::write(&path, MINIMAL_JSON).unwrap();

    let _token = EnvVar::set("LLAMARELAY_TELEGRAM_BOT_TOKEN", "999:env-token");
    let _capacity = EnvVar::set("LLAMARELAY_QUEUE__ADMISSION_CAPACITY", "4");

    let config = ConfigLoader::load_from_file(&path).unwrap();
    assert_eq!(config.telegram_bot_token, "999:env-token");
    assert_eq!(config.queue.admission_capacity, 4);
    assert_eq!(config.models[0].label(), "tiny");
}

#[test]
fn test_missing_token_fails_to_load() {
    let _guard = lock_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("relay.json");
    std::fs::write(&path, r#"{ "models": [] }"#).unwrap();

    let err = ConfigLoader::load_from_file(&path).unwrap_err();
    assert!(matches!(err, RelayError::Config(_)));
}

#[test]
fn test_malformed_file_is_config_error() {
    let _guard = lock_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("relay.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = ConfigLoader::load_from_file(&path).unwrap_err();
    assert!(matches!(err, RelayError::Config(_)));
}

#[test]
fn test_default_path_is_used_without_argument() {
    let resolved = ConfigLoader::resolve_path(None);
    match default_config_path() {
        Some(default) => assert_eq!(resolved.unwrap(), default),
        None => assert!(resolved.is_err()),
    }
}
