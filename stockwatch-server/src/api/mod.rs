//! HTTP API handlers.

pub mod monitoring;
