//! Events produced by the stock monitor.
//!
//! A `StockChangeEvent` is built by the poller for every detected quantity
//! decrease and handed to a `ChangeNotifier` exactly once. It is not kept
//! after delivery.

pub mod types;

pub use types::StockChangeEvent;
