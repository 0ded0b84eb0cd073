//! Dispatcher: fans an inbound message out into one request per enabled model.
//!
//! Each request is admitted by its own task, so a full admission queue
//! delays only that submission. Requests of one message therefore reach the
//! queue in no particular order. A submission that finds the pipeline closed
//! is reported on the fatal channel returned by [`Dispatcher::new`].

use crate::config::ModelConfig;
use crate::error::RelayError;
use crate::escape::escape_for_shell;
use crate::pipeline::Submitter;
use crate::request::{Destination, Request, TextPayload};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// A chat message accepted by the listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Text of the message itself
    pub text: String,
    /// Text of the message it replies to, if any
    pub parent_text: Option<String>,
    pub destination: Destination,
}

/// Receiving end for process-level submission failures.
pub struct FatalErrors {
    rx: mpsc::UnboundedReceiver<RelayError>,
}

impl FatalErrors {
    /// Next fatal error; `None` once every dispatcher is gone.
    pub async fn recv(&mut self) -> Option<RelayError> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<RelayError> {
        self.rx.try_recv().ok()
    }
}

/// Submission tasks started for one message
#[derive(Debug)]
pub struct Fanout {
    handles: Vec<JoinHandle<()>>,
}

impl Fanout {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait until every submission of this fan-out has been admitted (or failed).
    pub async fn join(self) {
        for result in join_all(self.handles).await {
            if let Err(e) = result {
                error!(error = %e, "Submission task ended abnormally");
            }
        }
    }
}

pub struct Dispatcher {
    submitter: Submitter,
    models: Arc<[Arc<ModelConfig>]>,
    fatal: mpsc::UnboundedSender<RelayError>,
}

impl Dispatcher {
    pub fn new(submitter: Submitter, models: Vec<Arc<ModelConfig>>) -> (Self, FatalErrors) {
        let (fatal, rx) = mpsc::unbounded_channel();
        (
            Self {
                submitter,
                models: models.into(),
                fatal,
            },
            FatalErrors { rx },
        )
    }

    /// One request per enabled model, in configuration order, with the
    /// message texts sanitized for the shell.
    pub fn build_requests(&self, message: &InboundMessage) -> Vec<Request> {
        let payload = match &message.parent_text {
            Some(parent) => TextPayload::WithComment {
                original: escape_for_shell(parent),
                comment: escape_for_shell(&message.text),
            },
            None => TextPayload::Single(escape_for_shell(&message.text)),
        };

        self.models
            .iter()
            .filter(|model| model.is_enabled())
            .map(|model| Request::new(Arc::clone(model), payload.clone(), message.destination))
            .collect()
    }

    /// Build the requests for `message` and submit each one independently.
    pub fn dispatch(&self, message: &InboundMessage) -> Fanout {
        let handles = self
            .build_requests(message)
            .into_iter()
            .map(|request| {
                info!(
                    request_id = %request.id(),
                    model = %request.model(),
                    original_text = request.payload().original(),
                    comment_text = ?request.payload().comment(),
                    "Enqueueing request"
                );

                let submitter = self.submitter.clone();
                let fatal = self.fatal.clone();
                tokio::spawn(async move {
                    if let Err(e) = submitter.submit(request).await {
                        error!(error = %e, "Request submission failed");
                        let _ = fatal.send(e);
                    }
                })
            })
            .collect();

        Fanout { handles }
    }

    pub fn enabled_model_count(&self) -> usize {
        self.models.iter().filter(|model| model.is_enabled()).count()
    }
}
