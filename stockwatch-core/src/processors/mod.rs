//! Processors of the stock monitoring pipeline.
//!
//! - `NotificationGate`: on/off switch consulted before every publish
//! - `ChangeNotifier`: publishes one `StockChangeEvent` through a `QueueTransport`
//! - `StockPoller`: polls the catalog, diffs quantities, emits events

pub mod change_notifier;
pub mod notification_gate;
pub mod stock_poller;

pub use change_notifier::{ChangeNotifier, NotifyOutcome, QueueChangeNotifier};
pub use notification_gate::NotificationGate;
pub use stock_poller::{LastKnownQuantities, PollSummary, StockPoller};
