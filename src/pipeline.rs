//! Request Pipeline
//!
//! Two bounded queues chained by a relay task: an admission queue fed by any
//! number of submitters, and a single-slot processing queue drained by one
//! worker. Only one generation runs at a time; everything else waits in
//! FIFO order. Requests are never dropped: a full admission queue makes the
//! submitter wait.

use crate::config::{Misconfiguration, QueueConfig};
use crate::delivery::ReplySink;
use crate::engine::GenerationEngine;
use crate::error::{EngineError, RelayError};
use crate::format::{format_failure, format_misconfiguration, format_success};
use crate::prompt::render_prompt;
use crate::request::Request;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Capacity of the processing queue. Together with the single worker this
/// keeps at most one request waiting behind the one being generated.
pub const PROCESSING_QUEUE_CAPACITY: usize = 1;

/// Handle for pushing requests into the admission queue.
#[derive(Clone)]
pub struct Submitter {
    admission: mpsc::Sender<Request>,
}

impl Submitter {
    /// Admit a request, waiting while the admission queue is full.
    ///
    /// Fails only when the pipeline has shut down.
    pub async fn submit(&self, request: Request) -> Result<(), RelayError> {
        let request_id = request.id();
        self.admission
            .send(request)
            .await
            .map_err(|_| RelayError::QueueClosed("admission queue"))?;
        debug!(request_id = %request_id, "Request admitted");
        Ok(())
    }
}

/// Outcome of running one request
#[derive(Debug)]
pub enum Outcome {
    Generated {
        text: String,
        model_name: String,
    },
    Failed {
        prompt: String,
        params: Vec<String>,
        error: EngineError,
    },
    Misconfigured(Misconfiguration),
}

impl Outcome {
    /// Reply text for this outcome; `started` is the processing-start time.
    pub fn render(&self, started: Instant) -> String {
        match self {
            Outcome::Generated { text, model_name } => {
                format_success(text, model_name, started.elapsed())
            }
            Outcome::Failed {
                prompt,
                params,
                error,
            } => format_failure(prompt, params, error),
            Outcome::Misconfigured(misconfiguration) => format_misconfiguration(misconfiguration),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Generated { .. })
    }
}

/// Admission queue, processing queue, relay task and worker task.
pub struct Pipeline {
    submitter: Submitter,
    relay: JoinHandle<()>,
    worker: JoinHandle<()>,
}

impl Pipeline {
    /// Create both queues and spawn the relay and worker tasks.
    pub fn start(
        config: &QueueConfig,
        engine: Arc<dyn GenerationEngine>,
        sink: Arc<dyn ReplySink>,
    ) -> Self {
        let admission_capacity = config.admission_capacity.max(1);
        let (admission_tx, admission_rx) = mpsc::channel(admission_capacity);
        let (processing_tx, processing_rx) = mpsc::channel(PROCESSING_QUEUE_CAPACITY);

        let relay = tokio::spawn(Self::relay_loop(admission_rx, processing_tx));
        let worker = tokio::spawn(Self::worker_loop(processing_rx, engine, sink));

        info!(
            admission_capacity,
            processing_capacity = PROCESSING_QUEUE_CAPACITY,
            "Started request pipeline"
        );

        Self {
            submitter: Submitter {
                admission: admission_tx,
            },
            relay,
            worker,
        }
    }

    pub fn submitter(&self) -> Submitter {
        self.submitter.clone()
    }

    /// Stop admitting and wait until every admitted request has been handled.
    ///
    /// Returns once all other `Submitter` clones are dropped as well.
    pub async fn close(self) {
        drop(self.submitter);
        if let Err(e) = self.relay.await {
            error!(error = %e, "Relay task ended abnormally");
        }
        if let Err(e) = self.worker.await {
            error!(error = %e, "Worker task ended abnormally");
        }
        info!("Stopped request pipeline");
    }

    /// Move requests one by one from the admission queue to the processing queue.
    async fn relay_loop(
        mut admission: mpsc::Receiver<Request>,
        processing: mpsc::Sender<Request>,
    ) {
        debug!("Relay started");

        while let Some(request) = admission.recv().await {
            let request_id = request.id();
            if processing.send(request).await.is_err() {
                error!(
                    request_id = %request_id,
                    "Processing queue closed, stopping relay"
                );
                return;
            }
            debug!(request_id = %request_id, "Request queued for processing");
        }

        debug!("Admission queue closed, relay stopped");
    }

    /// Single consumer of the processing queue.
    async fn worker_loop(
        mut processing: mpsc::Receiver<Request>,
        engine: Arc<dyn GenerationEngine>,
        sink: Arc<dyn ReplySink>,
    ) {
        debug!("Worker started");

        while let Some(mut request) = processing.recv().await {
            let started = request.mark_started();
            let outcome = Self::run_request(engine.as_ref(), &request).await;
            let reply = outcome.render(started);
            Self::deliver(sink.as_ref(), &request, &reply).await;
        }

        debug!("Processing queue closed, worker stopped");
    }

    /// Run one request to an outcome. Misconfigured models never reach the engine.
    pub async fn run_request(engine: &dyn GenerationEngine, request: &Request) -> Outcome {
        let model = match request.model().usable() {
            Ok(model) => model,
            Err(misconfiguration) => {
                warn!(
                    request_id = %request.id(),
                    model = %misconfiguration.model,
                    missing = ?misconfiguration.missing,
                    "Rejecting request for misconfigured model"
                );
                return Outcome::Misconfigured(misconfiguration);
            }
        };

        let prompt = render_prompt(&model, request.payload());
        info!(
            request_id = %request.id(),
            model = %request.model(),
            executable = model.path,
            "Processing request"
        );

        let start = Instant::now();
        match engine.generate(model.path, &prompt, model.parameters).await {
            Ok(text) => {
                info!(
                    request_id = %request.id(),
                    model = %request.model(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    generated_len = text.len(),
                    "Request completed"
                );
                Outcome::Generated {
                    text,
                    model_name: model.base_name(),
                }
            }
            Err(error) => {
                warn!(
                    request_id = %request.id(),
                    model = %request.model(),
                    executable = error.path(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    error = %error,
                    "Request failed"
                );
                Outcome::Failed {
                    prompt,
                    params: error.params().to_vec(),
                    error,
                }
            }
        }
    }

    async fn deliver(sink: &dyn ReplySink, request: &Request, reply: &str) {
        let destination = request.destination();
        match sink.send_reply(destination, reply).await {
            Ok(()) => debug!(
                request_id = %request.id(),
                chat_id = destination.chat_id,
                message_id = destination.message_id,
                "Reply delivered"
            ),
            Err(e) => error!(
                request_id = %request.id(),
                chat_id = destination.chat_id,
                message_id = destination.message_id,
                error = %e,
                "Failed to deliver reply"
            ),
        }
    }
}
