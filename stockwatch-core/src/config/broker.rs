//! Message broker configuration.

use std::time::Duration;
use url::Url;

/// Connection settings for the RabbitMQ management HTTP API.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Base URL of the management API, e.g. `http://rabbitmq:15672`.
    pub management_url: Url,
    pub vhost: String,
    pub username: String,
    pub password: String,
    /// Exchange used for publishing. Empty means the default exchange,
    /// which routes by queue name.
    pub exchange: String,
    /// Queue the broker dead-letters rejected stock change messages into.
    pub dead_letter_queue: String,
    /// HTTP timeout applied to every broker request.
    pub publish_timeout: Duration,
}
