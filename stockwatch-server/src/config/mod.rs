//! Configuration module for stockwatch-server.
//!
//! Handles loading configuration from the TOML file and applying CLI
//! overrides, then converts it into the runtime types of `stockwatch-core`.

pub mod file;

use crate::config::file::FileConfig;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use stockwatch_core::config::{BrokerConfig, MonitoringConfig};
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Values given on the command line that win over the file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub listen: Option<SocketAddr>,
    pub poll_interval_ms: Option<u64>,
    pub notifications_disabled: bool,
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub listen: SocketAddr,
    pub monitoring: MonitoringConfig,
    pub broker: BrokerConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    overrides: CliOverrides,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, overrides: CliOverrides) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            overrides,
        }
    }

    /// Read, override, validate and convert the configuration file.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        self.load_str(&config_content)
    }

    fn load_str(&self, content: &str) -> Result<LoadedConfig, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(content)?;
        self.apply_overrides(&mut file_config);
        validate(&file_config)?;
        Ok(build_loaded_config(file_config))
    }

    fn apply_overrides(&self, config: &mut FileConfig) {
        if let Some(listen) = self.overrides.listen {
            config.server.listen = listen;
        }
        if let Some(poll_interval_ms) = self.overrides.poll_interval_ms {
            config.monitoring.poll_interval_ms = poll_interval_ms;
        }
        if self.overrides.notifications_disabled {
            config.monitoring.enabled = false;
        }
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    let monitoring = &config.monitoring;
    if monitoring.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "monitoring.poll_interval_ms must be greater than zero".to_string(),
        ));
    }
    if monitoring.fetch_timeout_ms == 0 || config.broker.publish_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "timeouts must be greater than zero".to_string(),
        ));
    }
    if monitoring.queue_name.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "monitoring.queue_name must not be empty".to_string(),
        ));
    }
    if monitoring.fetch_timeout_ms > monitoring.poll_interval_ms {
        tracing::warn!(
            fetch_timeout_ms = monitoring.fetch_timeout_ms,
            poll_interval_ms = monitoring.poll_interval_ms,
            "Catalog fetch timeout exceeds the poll interval, cycles may be delayed"
        );
    }
    Ok(())
}

fn build_loaded_config(file_config: FileConfig) -> LoadedConfig {
    let monitoring = file_config.monitoring;
    let broker = file_config.broker;

    LoadedConfig {
        listen: file_config.server.listen,
        monitoring: MonitoringConfig {
            enabled: monitoring.enabled,
            poll_interval: Duration::from_millis(monitoring.poll_interval_ms),
            queue_name: monitoring.queue_name,
            fetch_timeout: Duration::from_millis(monitoring.fetch_timeout_ms),
        },
        broker: BrokerConfig {
            management_url: broker.management_url,
            vhost: broker.vhost,
            username: broker.username,
            password: broker.password,
            exchange: broker.exchange,
            dead_letter_queue: broker.dead_letter_queue,
            publish_timeout: Duration::from_millis(broker.publish_timeout_ms),
        },
    }
}
