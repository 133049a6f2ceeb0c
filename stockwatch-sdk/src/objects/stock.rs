//! Stock change message published to the queue.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Message body published for every detected quantity decrease.
///
/// Field names are camelCase on the wire so queue consumers written in
/// other ecosystems can bind it without custom mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockChangedPayload {
    pub product_id: i64,
    pub product_name: String,
    pub product_category: String,
    /// Always strictly positive.
    pub quantity_decreased: u32,
    pub new_quantity: i32,
    /// `quantity_decreased * price`, or zero when the product has no price.
    pub sale_total: Decimal,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}
