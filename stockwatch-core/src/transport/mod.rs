//! Queue transport used to deliver stock change messages.
//!
//! Dead-lettering of rejected or unprocessable messages is broker
//! configuration: the stock change queue is declared with a dead-letter
//! exchange, so nothing here re-publishes on failure.

pub mod rabbitmq;

pub use rabbitmq::RabbitMqHttpTransport;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while talking to the broker.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request error (connection refused, timeout, ...)
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Payload or response (de)serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Broker answered with a non-success status
    #[error("broker rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Broker accepted the message but no queue was bound to the routing key
    #[error("message to {destination} was not routed to any queue")]
    Unroutable { destination: String },

    /// Endpoint URL could not be built
    #[error("invalid broker URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// A message read back from a queue without consuming it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetterMessage {
    pub routing_key: String,
    pub redelivered: bool,
    pub payload: String,
    /// `"string"` for UTF-8 bodies, `"base64"` otherwise.
    pub payload_encoding: String,
}

/// Delivers serialized payloads to a named destination.
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Publish `payload` to `destination`. Blocking until the broker
    /// answers or the transport's own timeout fires.
    async fn publish(&self, destination: &str, payload: &str) -> Result<(), TransportError>;
}

/// Read-only access to messages parked in a queue.
#[async_trait]
pub trait QueueInspector: Send + Sync {
    /// Return up to `count` messages from `queue`, leaving them queued.
    async fn peek(
        &self,
        queue: &str,
        count: u32,
    ) -> Result<Vec<DeadLetterMessage>, TransportError>;
}
