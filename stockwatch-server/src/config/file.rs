//! TOML file configuration structures.
//!
//! These structs directly map to the `stockwatch.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    pub broker: BrokerConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Stock monitoring section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Initial state of the notification gate.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Queue stock change events are published to.
    #[serde(default = "default_queue_name")]
    pub queue_name: String,
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: default_poll_interval_ms(),
            queue_name: default_queue_name(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    30_000
}

fn default_queue_name() -> String {
    "stock-changes".to_string()
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

/// Broker section: RabbitMQ management API access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Base URL of the management API (e.g., "http://rabbitmq:15672").
    pub management_url: Url,
    #[serde(default = "default_vhost")]
    pub vhost: String,
    #[serde(default = "default_guest")]
    pub username: String,
    #[serde(default = "default_guest")]
    pub password: String,
    /// Exchange to publish through. Empty selects the default exchange.
    #[serde(default)]
    pub exchange: String,
    #[serde(default = "default_dead_letter_queue")]
    pub dead_letter_queue: String,
    #[serde(default = "default_publish_timeout_ms")]
    pub publish_timeout_ms: u64,
}

fn default_vhost() -> String {
    "/".to_string()
}

fn default_guest() -> String {
    "guest".to_string()
}

fn default_dead_letter_queue() -> String {
    "stock-change-dlq".to_string()
}

fn default_publish_timeout_ms() -> u64 {
    10_000
}
