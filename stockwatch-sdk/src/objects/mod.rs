pub mod monitoring;
pub mod stock;

pub use monitoring::{
    DeadLetterQuery, DeadLetterResponse, NotificationStatusResponse, ProductResponse,
    SetNotificationsRequest, clamp_dead_letter_limit,
};
pub use stock::StockChangedPayload;
