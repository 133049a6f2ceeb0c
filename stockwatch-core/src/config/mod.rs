//! Configuration types for stockwatch.
//!
//! These are the validated runtime values consumed by the poller and the
//! transport. Parsing the TOML file is handled by the server crate.

mod broker;
mod monitoring;

pub use broker::BrokerConfig;
pub use monitoring::MonitoringConfig;
