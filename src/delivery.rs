//! Reply delivery seam between the pipeline worker and the chat platform.

use crate::error::DeliveryError;
use crate::request::Destination;
use async_trait::async_trait;

/// Sends a formatted HTML reply to the message a request came from.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send_reply(&self, destination: Destination, text: &str) -> Result<(), DeliveryError>;
}
