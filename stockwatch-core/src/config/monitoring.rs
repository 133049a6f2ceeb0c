//! Stock monitoring configuration.

use std::time::Duration;

/// Settings for the poll-diff-notify pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoringConfig {
    /// Initial state of the notification gate.
    pub enabled: bool,
    /// Period between two poll cycles.
    pub poll_interval: Duration,
    /// Queue the change events are published to.
    pub queue_name: String,
    /// Upper bound for a single catalog fetch.
    pub fetch_timeout: Duration,
}

impl MonitoringConfig {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(30_000);
    pub const DEFAULT_QUEUE_NAME: &'static str = "stock-changes";
    pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(10_000);
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            queue_name: Self::DEFAULT_QUEUE_NAME.to_string(),
            fetch_timeout: Self::DEFAULT_FETCH_TIMEOUT,
        }
    }
}
