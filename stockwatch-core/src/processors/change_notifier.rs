//! ChangeNotifier processor.
//!
//! The ChangeNotifier is responsible for:
//! - Checking the `NotificationGate` before anything else
//! - Serializing a `StockChangeEvent` to its JSON wire form
//! - Publishing it to the gate's destination through a `QueueTransport`
//!
//! Failures are logged and the event is dropped. There is no local retry;
//! messages the broker cannot deliver are dead-lettered by the broker.

use super::notification_gate::NotificationGate;
use crate::events::StockChangeEvent;
use crate::transport::{QueueTransport, TransportError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info};

/// What happened to one event handed to a notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// The transport accepted the message.
    Published,
    /// The gate was disabled; nothing was sent.
    Suppressed,
    /// The transport failed; the event was dropped.
    Failed,
}

/// Delivers stock change events downstream.
#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    /// Deliver `event`. Never fails: errors are logged and reported as
    /// [`NotifyOutcome::Failed`].
    async fn notify(&self, event: StockChangeEvent) -> NotifyOutcome;
}

/// `ChangeNotifier` publishing to a message queue.
pub struct QueueChangeNotifier {
    gate: Arc<NotificationGate>,
    transport: Arc<dyn QueueTransport>,
}

impl QueueChangeNotifier {
    pub fn new(gate: Arc<NotificationGate>, transport: Arc<dyn QueueTransport>) -> Self {
        Self { gate, transport }
    }

    async fn publish(&self, event: &StockChangeEvent) -> Result<(), TransportError> {
        let body = serde_json::to_string(&event.to_payload())?;
        self.transport.publish(self.gate.destination(), &body).await
    }
}

#[async_trait]
impl ChangeNotifier for QueueChangeNotifier {
    async fn notify(&self, event: StockChangeEvent) -> NotifyOutcome {
        if !self.gate.is_enabled() {
            debug!(
                product_id = event.product_id,
                "Stock change notifications are disabled, skipping notification"
            );
            return NotifyOutcome::Suppressed;
        }

        info!(
            product_id = event.product_id,
            product_name = %event.product_name,
            quantity_decreased = event.quantity_decreased,
            new_quantity = event.new_quantity,
            sale_total = %event.sale_total,
            "Sending stock change notification"
        );

        match self.publish(&event).await {
            Ok(()) => {
                info!(
                    product_id = event.product_id,
                    destination = %self.gate.destination(),
                    "Stock change notification sent"
                );
                NotifyOutcome::Published
            }
            Err(e) => {
                error!(
                    product_id = event.product_id,
                    destination = %self.gate.destination(),
                    error = %e,
                    "Failed to send stock change notification, dropping event"
                );
                NotifyOutcome::Failed
            }
        }
    }
}
