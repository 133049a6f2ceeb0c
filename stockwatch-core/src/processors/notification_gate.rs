//! Enable/disable switch for stock change notifications.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Process-wide switch deciding whether detected changes are published.
///
/// While disabled, events are discarded; they are never buffered or
/// replayed once the gate is enabled again.
#[derive(Debug)]
pub struct NotificationGate {
    enabled: AtomicBool,
    destination: String,
}

impl NotificationGate {
    pub fn new(enabled: bool, destination: impl Into<String>) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            destination: destination.into(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Flip the gate and log the transition.
    pub fn set_enabled(&self, enabled: bool) {
        let previous = self.enabled.swap(enabled, Ordering::AcqRel);
        if previous == enabled {
            debug!(enabled, "Stock change notifications already in requested state");
        } else if enabled {
            info!(destination = %self.destination, "Stock change notifications enabled");
        } else {
            info!(destination = %self.destination, "Stock change notifications disabled");
        }
    }

    /// Queue the events are published to.
    pub fn destination(&self) -> &str {
        &self.destination
    }
}
