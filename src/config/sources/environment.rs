//! Environment source: `LLAMARELAY_*` variables, `__` separating nested keys
//! (e.g. `LLAMARELAY_QUEUE__ADMISSION_CAPACITY`).

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub const ENV_PREFIX: &str = "LLAMARELAY";

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    )
}
