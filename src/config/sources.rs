//! Configuration sources, applied in order after the merge-policy defaults.

pub mod config_file;
pub mod environment;
