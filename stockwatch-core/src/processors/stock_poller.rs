//! StockPoller processor.
//!
//! The StockPoller is responsible for:
//! - Fetching all active products from the `ProductCatalog` on a fixed period
//! - Comparing each quantity with the last quantity seen for that product
//! - Handing a `StockChangeEvent` to the `ChangeNotifier` for every decrease
//! - Recording the latest quantity as the baseline for the next cycle
//!
//! The last-known quantities live only in memory. After a restart the first
//! cycle records baselines and cannot detect decreases that happened while
//! the process was down.

use super::change_notifier::{ChangeNotifier, NotifyOutcome};
use crate::catalog::{CatalogError, ProductCatalog};
use crate::config::MonitoringConfig;
use crate::entities::ProductSnapshot;
use crate::events::StockChangeEvent;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Last observed quantity per product id.
///
/// Entries are never evicted: a product that leaves the active set keeps its
/// last value, so a later reactivation at a lower quantity is still reported.
#[derive(Debug, Default, Clone)]
pub struct LastKnownQuantities {
    quantities: HashMap<i64, i32>,
}

impl LastKnownQuantities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, product_id: i64) -> Option<i32> {
        self.quantities.get(&product_id).copied()
    }

    /// Store `quantity` for `product_id`, returning the previous value.
    pub fn record(&mut self, product_id: i64, quantity: i32) -> Option<i32> {
        self.quantities.insert(product_id, quantity)
    }

    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }
}

/// Counters for one poll cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollSummary {
    pub products_seen: usize,
    pub baselines_recorded: usize,
    pub decreases_detected: usize,
    pub published: usize,
    pub suppressed: usize,
    pub failed: usize,
    /// The catalog fetch failed and no product was evaluated.
    pub fetch_failed: bool,
}

/// Periodically diffs catalog quantities and notifies on decreases.
pub struct StockPoller {
    catalog: Arc<dyn ProductCatalog>,
    notifier: Arc<dyn ChangeNotifier>,
    /// Held for a whole cycle, so overlapping `poll_once` calls run one
    /// after another.
    last_known: Mutex<LastKnownQuantities>,
    poll_interval: Duration,
    fetch_timeout: Duration,
}

impl StockPoller {
    /// Create a new StockPoller.
    ///
    /// # Arguments
    ///
    /// * `catalog` - Source of active products
    /// * `notifier` - Receives one event per detected decrease
    /// * `last_known` - Initial quantity state, usually empty
    /// * `config` - Poll period and fetch timeout
    pub fn new(
        catalog: Arc<dyn ProductCatalog>,
        notifier: Arc<dyn ChangeNotifier>,
        last_known: LastKnownQuantities,
        config: &MonitoringConfig,
    ) -> Self {
        Self {
            catalog,
            notifier,
            last_known: Mutex::new(last_known),
            poll_interval: config.poll_interval,
            fetch_timeout: config.fetch_timeout,
        }
    }

    /// Run the StockPoller until shutdown is signaled.
    ///
    /// The first cycle starts immediately. A cycle that overruns the period
    /// delays the next tick instead of bursting to catch up.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "StockPoller started"
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("StockPoller received shutdown signal");
                        break;
                    }
                }

                _ = ticker.tick() => {
                    let summary = self.poll_once().await;
                    if summary.decreases_detected > 0 || summary.fetch_failed {
                        info!(?summary, "Stock poll cycle finished");
                    } else {
                        debug!(?summary, "Stock poll cycle finished");
                    }
                }
            }
        }

        info!("StockPoller shutdown complete");
    }

    /// Run one fetch-compare-notify-update cycle.
    ///
    /// Never fails: a catalog error ends the cycle early with the quantity
    /// map untouched, and publish failures are counted in the summary.
    pub async fn poll_once(&self) -> PollSummary {
        let mut last_known = self.last_known.lock().await;
        let mut summary = PollSummary::default();

        debug!("Starting stock change monitoring poll");

        let products = match self.fetch_active_products().await {
            Ok(products) => products,
            Err(e) => {
                error!(error = %e, "Error during stock monitoring poll");
                summary.fetch_failed = true;
                return summary;
            }
        };

        for product in products {
            summary.products_seen += 1;
            self.process_product(&mut last_known, &product, &mut summary)
                .await;
        }

        summary
    }

    /// Last quantity recorded for `product_id`, if it was ever observed.
    pub async fn last_known_quantity(&self, product_id: i64) -> Option<i32> {
        self.last_known.lock().await.get(product_id)
    }

    async fn fetch_active_products(&self) -> Result<Vec<ProductSnapshot>, CatalogError> {
        tokio::time::timeout(self.fetch_timeout, self.catalog.list_active_products())
            .await
            .map_err(|_| CatalogError::Timeout(self.fetch_timeout))?
    }

    async fn process_product(
        &self,
        last_known: &mut LastKnownQuantities,
        product: &ProductSnapshot,
        summary: &mut PollSummary,
    ) {
        match last_known.get(product.id) {
            None => {
                debug!(
                    product_id = product.id,
                    quantity = product.quantity,
                    "Recorded baseline quantity"
                );
                summary.baselines_recorded += 1;
            }
            Some(previous) => {
                if let Some(event) = StockChangeEvent::detect(product, previous) {
                    summary.decreases_detected += 1;
                    info!(
                        product_id = product.id,
                        quantity_decreased = event.quantity_decreased,
                        new_quantity = product.quantity,
                        "Stock decreased"
                    );
                    match self.notifier.notify(event).await {
                        NotifyOutcome::Published => summary.published += 1,
                        NotifyOutcome::Suppressed => summary.suppressed += 1,
                        NotifyOutcome::Failed => summary.failed += 1,
                    }
                }
            }
        }

        // Always advance the baseline, whatever the notification outcome.
        last_known.record(product.id, product.quantity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::{NotificationGate, QueueChangeNotifier};
    use crate::testing::{RecordingTransport, ScriptedCatalog, product};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    struct Harness {
        poller: StockPoller,
        catalog: Arc<ScriptedCatalog>,
        transport: Arc<RecordingTransport>,
        gate: Arc<NotificationGate>,
    }

    fn harness(catalog: ScriptedCatalog, transport: RecordingTransport, enabled: bool) -> Harness {
        let catalog = Arc::new(catalog);
        let transport = Arc::new(transport);
        let gate = Arc::new(NotificationGate::new(enabled, "stock-changes"));
        let notifier = Arc::new(QueueChangeNotifier::new(gate.clone(), transport.clone()));
        let poller = StockPoller::new(
            catalog.clone(),
            notifier,
            LastKnownQuantities::new(),
            &MonitoringConfig::default(),
        );
        Harness {
            poller,
            catalog,
            transport,
            gate,
        }
    }

    #[tokio::test]
    async fn test_first_observation_is_baseline_then_decrease_emits() {
        let h = harness(
            ScriptedCatalog::of_cycles([vec![product(1, 50, None)], vec![product(1, 42, None)]]),
            RecordingTransport::default(),
            true,
        );

        let first = h.poller.poll_once().await;
        assert_eq!(first.baselines_recorded, 1);
        assert_eq!(first.decreases_detected, 0);
        assert!(h.transport.published().is_empty());

        let second = h.poller.poll_once().await;
        assert_eq!(second.decreases_detected, 1);
        assert_eq!(second.published, 1);

        let payloads = h.transport.published_payloads();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].product_id, 1);
        assert_eq!(payloads[0].quantity_decreased, 8);
        assert_eq!(payloads[0].new_quantity, 42);
        assert_eq!(h.poller.last_known_quantity(1).await, Some(42));
    }

    #[tokio::test]
    async fn test_sale_total_from_price() {
        let price = Some(Decimal::from_str("10.00").unwrap());
        let h = harness(
            ScriptedCatalog::of_cycles([vec![product(2, 20, price)], vec![product(2, 15, price)]]),
            RecordingTransport::default(),
            true,
        );

        h.poller.poll_once().await;
        h.poller.poll_once().await;

        let payloads = h.transport.published_payloads();
        assert_eq!(payloads[0].quantity_decreased, 5);
        assert_eq!(payloads[0].sale_total, Decimal::from_str("50.00").unwrap());
    }

    #[tokio::test]
    async fn test_unchanged_and_increased_do_not_emit_but_update_map() {
        let h = harness(
            ScriptedCatalog::of_cycles([
                vec![product(3, 30, None), product(4, 10, None)],
                vec![product(3, 30, None), product(4, 12, None)],
            ]),
            RecordingTransport::default(),
            true,
        );

        h.poller.poll_once().await;
        let summary = h.poller.poll_once().await;

        assert_eq!(summary.products_seen, 2);
        assert_eq!(summary.decreases_detected, 0);
        assert_eq!(h.transport.attempts(), 0);
        assert_eq!(h.poller.last_known_quantity(3).await, Some(30));
        assert_eq!(h.poller.last_known_quantity(4).await, Some(12));
    }

    #[tokio::test]
    async fn test_disabled_gate_detects_but_does_not_publish() {
        let h = harness(
            ScriptedCatalog::of_cycles([
                vec![product(5, 8, None)],
                vec![product(5, 3, None)],
                vec![product(5, 3, None)],
            ]),
            RecordingTransport::default(),
            false,
        );

        h.poller.poll_once().await;
        let summary = h.poller.poll_once().await;
        assert_eq!(summary.decreases_detected, 1);
        assert_eq!(summary.suppressed, 1);
        assert_eq!(h.transport.attempts(), 0);
        assert_eq!(h.poller.last_known_quantity(5).await, Some(3));

        // Nothing missed is replayed after re-enabling.
        h.gate.set_enabled(true);
        let summary = h.poller.poll_once().await;
        assert_eq!(summary.decreases_detected, 0);
        assert_eq!(h.transport.attempts(), 0);
    }

    #[tokio::test]
    async fn test_fetch_error_skips_cycle_and_keeps_map() {
        let h = harness(
            ScriptedCatalog::new([
                Ok(vec![product(6, 10, None)]),
                Err(CatalogError::Timeout(Duration::from_secs(1))),
                Ok(vec![product(6, 7, None)]),
            ]),
            RecordingTransport::default(),
            true,
        );

        h.poller.poll_once().await;
        let failed = h.poller.poll_once().await;
        assert!(failed.fetch_failed);
        assert_eq!(failed.products_seen, 0);
        assert_eq!(h.poller.last_known_quantity(6).await, Some(10));

        let recovered = h.poller.poll_once().await;
        assert!(!recovered.fetch_failed);
        let payloads = h.transport.published_payloads();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].quantity_decreased, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_fetch_times_out() {
        let h = harness(
            ScriptedCatalog::of_cycles([vec![product(1, 1, None)]])
                .with_delay(MonitoringConfig::DEFAULT_FETCH_TIMEOUT * 2),
            RecordingTransport::default(),
            true,
        );

        let summary = h.poller.poll_once().await;
        assert!(summary.fetch_failed);
        assert_eq!(h.poller.last_known_quantity(1).await, None);
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_stop_later_products() {
        let h = harness(
            ScriptedCatalog::of_cycles([
                vec![product(7, 10, None), product(8, 10, None), product(9, 10, None)],
                vec![product(7, 9, None), product(8, 9, None), product(9, 9, None)],
            ]),
            RecordingTransport::failing_for([8]),
            true,
        );

        h.poller.poll_once().await;
        let summary = h.poller.poll_once().await;

        assert_eq!(summary.decreases_detected, 3);
        assert_eq!(summary.published, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(h.transport.attempts(), 3);
        let ids: Vec<i64> = h
            .transport
            .published_payloads()
            .iter()
            .map(|p| p.product_id)
            .collect();
        assert_eq!(ids, vec![7, 9]);
        // The failed product still advances its baseline.
        assert_eq!(h.poller.last_known_quantity(8).await, Some(9));
    }

    #[tokio::test]
    async fn test_inactive_products_keep_stale_entry() {
        let h = harness(
            ScriptedCatalog::of_cycles([
                vec![product(10, 20, None), product(11, 5, None)],
                vec![product(11, 5, None)],
                vec![product(10, 12, None), product(11, 5, None)],
            ]),
            RecordingTransport::default(),
            true,
        );

        h.poller.poll_once().await;
        h.poller.poll_once().await;
        assert_eq!(h.poller.last_known_quantity(10).await, Some(20));

        // Reactivated at a lower quantity: reported against the stale value.
        h.poller.poll_once().await;
        let payloads = h.transport.published_payloads();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].product_id, 10);
        assert_eq!(payloads[0].quantity_decreased, 8);
    }

    #[tokio::test]
    async fn test_emits_iff_strictly_below_previous_observation() {
        let quantities = [10, 10, 7, 9, 9, 1, 0, 0, 4, 2];
        let h = harness(
            ScriptedCatalog::of_cycles(quantities.iter().map(|q| vec![product(12, *q, None)])),
            RecordingTransport::default(),
            true,
        );

        for _ in quantities {
            h.poller.poll_once().await;
        }

        let decreases: Vec<u32> = h
            .transport
            .published_payloads()
            .iter()
            .map(|p| p.quantity_decreased)
            .collect();
        assert_eq!(decreases, vec![3, 8, 1, 2]);
    }

    #[tokio::test]
    async fn test_fresh_state_treats_everything_as_baseline() {
        let mut seeded = LastKnownQuantities::new();
        seeded.record(13, 100);

        let transport = Arc::new(RecordingTransport::default());
        let gate = Arc::new(NotificationGate::new(true, "stock-changes"));
        let notifier = Arc::new(QueueChangeNotifier::new(gate, transport.clone()));
        let catalog = Arc::new(ScriptedCatalog::of_cycles([
            vec![product(13, 90, None)],
            vec![product(13, 90, None)],
        ]));

        // An injected map is honoured ...
        let seeded_poller = StockPoller::new(
            catalog.clone(),
            notifier.clone(),
            seeded,
            &MonitoringConfig::default(),
        );
        assert_eq!(seeded_poller.poll_once().await.decreases_detected, 1);

        // ... and a new instance starts from nothing.
        let fresh_poller = StockPoller::new(
            catalog,
            notifier,
            LastKnownQuantities::new(),
            &MonitoringConfig::default(),
        );
        let summary = fresh_poller.poll_once().await;
        assert_eq!(summary.baselines_recorded, 1);
        assert_eq!(summary.decreases_detected, 0);
        assert_eq!(transport.published().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_polls_are_serialized() {
        let h = harness(
            ScriptedCatalog::of_cycles([vec![product(14, 10, None)], vec![product(14, 4, None)]]),
            RecordingTransport::default(),
            true,
        );

        let (a, b) = tokio::join!(h.poller.poll_once(), h.poller.poll_once());
        assert_eq!(a.baselines_recorded + b.baselines_recorded, 1);
        assert_eq!(a.decreases_detected + b.decreases_detected, 1);
        assert_eq!(h.catalog.fetches(), 2);
        assert_eq!(h.poller.last_known_quantity(14).await, Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_polls_on_schedule_until_shutdown() {
        let catalog = Arc::new(ScriptedCatalog::of_cycles([
            vec![product(15, 10, None)],
            vec![product(15, 6, None)],
        ]));
        let transport = Arc::new(RecordingTransport::default());
        let gate = Arc::new(NotificationGate::new(true, "stock-changes"));
        let notifier = Arc::new(QueueChangeNotifier::new(gate, transport.clone()));
        let poller = StockPoller::new(
            catalog.clone(),
            notifier,
            LastKnownQuantities::new(),
            &MonitoringConfig::default(),
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(poller.run(shutdown_rx));

        tokio::time::sleep(MonitoringConfig::DEFAULT_POLL_INTERVAL + Duration::from_millis(10))
            .await;
        assert_eq!(catalog.fetches(), 2);
        assert_eq!(transport.published().len(), 1);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
