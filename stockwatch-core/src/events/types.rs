use crate::entities::ProductSnapshot;
use rust_decimal::Decimal;
use stockwatch_sdk::objects::StockChangedPayload;
use time::OffsetDateTime;

/// A detected decrease in the quantity of one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockChangeEvent {
    pub product_id: i64,
    pub product_name: String,
    pub product_category: String,
    /// `previous - current`, always strictly positive.
    pub quantity_decreased: u32,
    pub new_quantity: i32,
    pub sale_total: Decimal,
    pub timestamp: OffsetDateTime,
}

impl StockChangeEvent {
    /// Build an event if `product.quantity` is strictly below `previous`.
    ///
    /// Returns `None` for unchanged or increased quantities.
    pub fn detect(product: &ProductSnapshot, previous: i32) -> Option<Self> {
        Self::detect_at(product, previous, OffsetDateTime::now_utc())
    }

    fn detect_at(product: &ProductSnapshot, previous: i32, now: OffsetDateTime) -> Option<Self> {
        if product.quantity >= previous {
            return None;
        }
        let quantity_decreased = previous.abs_diff(product.quantity);
        let sale_total = product
            .price
            .map(|price| price * Decimal::from(quantity_decreased))
            .unwrap_or(Decimal::ZERO);

        Some(Self {
            product_id: product.id,
            product_name: product.name.clone(),
            product_category: product.category.clone(),
            quantity_decreased,
            new_quantity: product.quantity,
            sale_total,
            timestamp: now,
        })
    }

    /// Wire representation published to the queue.
    pub fn to_payload(&self) -> StockChangedPayload {
        StockChangedPayload {
            product_id: self.product_id,
            product_name: self.product_name.clone(),
            product_category: self.product_category.clone(),
            quantity_decreased: self.quantity_decreased,
            new_quantity: self.new_quantity,
            sale_total: self.sale_total,
            timestamp: self.timestamp,
        }
    }
}
