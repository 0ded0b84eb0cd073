//! Llamarelay: Telegram to llamafile relay
//!
//! Every accepted chat message is fanned out into one request per enabled
//! model. Requests flow through a bounded admission queue into a single
//! worker that runs one llamafile at a time, and each result is sent back as
//! a threaded reply.

pub mod access;
pub mod cli;
pub mod config;
pub mod delivery;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod escape;
pub mod format;
pub mod logging;
pub mod pipeline;
pub mod prompt;
pub mod request;
pub mod telegram;
