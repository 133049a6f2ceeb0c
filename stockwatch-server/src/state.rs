//! Application state shared across all request handlers.

use std::sync::Arc;
use stockwatch_core::catalog::ProductCatalog;
use stockwatch_core::processors::NotificationGate;
use stockwatch_core::transport::QueueInspector;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Read-only product catalog.
    pub catalog: Arc<dyn ProductCatalog>,
    /// The same gate instance the poller's notifier consults.
    pub gate: Arc<NotificationGate>,
    /// Broker access for dead-letter inspection.
    pub inspector: Arc<dyn QueueInspector>,
    /// Queue holding dead-lettered stock change messages.
    pub dead_letter_queue: Arc<str>,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn ProductCatalog>,
        gate: Arc<NotificationGate>,
        inspector: Arc<dyn QueueInspector>,
        dead_letter_queue: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            catalog,
            gate,
            inspector,
            dead_letter_queue: dead_letter_queue.into(),
        }
    }
}
