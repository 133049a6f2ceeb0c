//! Monitoring API request and response types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::stock::StockChangedPayload;

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Product as exposed by the read API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub quantity: i32,
    pub price: Option<Decimal>,
    pub active: bool,
}

/// Current state of the notification gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationStatusResponse {
    pub enabled: bool,
    pub destination: String,
}

/// A message sitting in the dead-letter queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetterResponse {
    pub routing_key: String,
    pub redelivered: bool,
    /// Raw message body as stored by the broker.
    pub payload: String,
    /// The decoded event, when the body is a valid stock change message.
    pub event: Option<StockChangedPayload>,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `PUT /notifications`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetNotificationsRequest {
    pub enabled: bool,
}

const DEFAULT_DEAD_LETTER_LIMIT: u32 = 10;
const MAX_DEAD_LETTER_LIMIT: u32 = 100;

/// Query parameters for peeking the dead-letter queue.
#[derive(Debug, Clone, Deserialize)]
pub struct DeadLetterQuery {
    #[serde(default = "default_dead_letter_limit")]
    pub limit: u32,
}

fn default_dead_letter_limit() -> u32 {
    DEFAULT_DEAD_LETTER_LIMIT
}

/// Clamp a requested dead-letter peek size to `1..=100`.
pub fn clamp_dead_letter_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_DEAD_LETTER_LIMIT)
}
