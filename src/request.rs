//! The unit of work moving through the pipeline: one model, one text
//! payload, one reply destination.

use crate::config::ModelConfig;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Request ID for tracing a request across pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    /// Generate the next request ID
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        RequestId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Message text of a request, already sanitized for the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextPayload {
    /// A standalone message
    Single(String),
    /// A reply: the parent message's text plus the reply's own text
    WithComment { original: String, comment: String },
}

impl TextPayload {
    /// Text substituted for the placeholder: `"<comment>: <original>"` for
    /// replies, the message text otherwise.
    pub fn prompt_text(&self) -> String {
        match self {
            TextPayload::Single(original) => original.clone(),
            TextPayload::WithComment { original, comment } => format!("{}: {}", comment, original),
        }
    }

    pub fn original(&self) -> &str {
        match self {
            TextPayload::Single(original) | TextPayload::WithComment { original, .. } => original,
        }
    }

    pub fn comment(&self) -> Option<&str> {
        match self {
            TextPayload::Single(_) => None,
            TextPayload::WithComment { comment, .. } => Some(comment),
        }
    }
}

/// Where the reply goes: the originating chat, threaded under the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub chat_id: i64,
    pub message_id: i32,
}

/// Generation request
///
/// Immutable after creation except for the processing-start timestamp,
/// which the worker sets once when it dequeues the request.
#[derive(Debug)]
pub struct Request {
    id: RequestId,
    model: Arc<ModelConfig>,
    payload: TextPayload,
    destination: Destination,
    started_at: Option<Instant>,
}

impl Request {
    pub fn new(model: Arc<ModelConfig>, payload: TextPayload, destination: Destination) -> Self {
        Self {
            id: RequestId::next(),
            model,
            payload,
            destination,
            started_at: None,
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    pub fn payload(&self) -> &TextPayload {
        &self.payload
    }

    pub fn destination(&self) -> Destination {
        self.destination
    }

    /// Record the processing start. Later calls keep the first timestamp.
    pub fn mark_started(&mut self) -> Instant {
        *self.started_at.get_or_insert_with(Instant::now)
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }
}
