//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources (config file, then environment) override these.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("queue.admission_capacity", 10_i64)?
        .set_default("engine.launcher", "bash")?
        .set_default("engine.silent_prompt_flag", "--silent-prompt")?
        .set_default("polling.timeout_secs", 30_i64)?
        .set_default("polling.retry_delay_secs", 5_i64)
}
