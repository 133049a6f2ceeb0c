//! In-memory fakes shared by the unit tests.

use crate::catalog::{CatalogError, ProductCatalog};
use crate::entities::ProductSnapshot;
use crate::transport::{QueueTransport, TransportError};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use stockwatch_sdk::objects::StockChangedPayload;

pub fn product(id: i64, quantity: i32, price: Option<Decimal>) -> ProductSnapshot {
    ProductSnapshot {
        id,
        name: format!("product-{id}"),
        category: "general".to_string(),
        quantity,
        price,
        active: true,
    }
}

/// Catalog returning one scripted response per fetch, then empty lists.
#[derive(Default)]
pub struct ScriptedCatalog {
    responses: Mutex<VecDeque<Result<Vec<ProductSnapshot>, CatalogError>>>,
    delay: Option<Duration>,
    fetches: AtomicUsize,
}

impl ScriptedCatalog {
    pub fn new(
        responses: impl IntoIterator<Item = Result<Vec<ProductSnapshot>, CatalogError>>,
    ) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn of_cycles(cycles: impl IntoIterator<Item = Vec<ProductSnapshot>>) -> Self {
        Self::new(cycles.into_iter().map(Ok))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProductCatalog for ScriptedCatalog {
    async fn list_active_products(&self) -> Result<Vec<ProductSnapshot>, CatalogError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn get_product(&self, _id: i64) -> Result<Option<ProductSnapshot>, CatalogError> {
        Ok(None)
    }

    async fn list_active_products_by_category(
        &self,
        _category: &str,
    ) -> Result<Vec<ProductSnapshot>, CatalogError> {
        Ok(Vec::new())
    }
}

/// Transport recording every successful publish.
///
/// Publishes for product ids in `failing` are rejected.
#[derive(Default)]
pub struct RecordingTransport {
    published: Mutex<Vec<(String, String)>>,
    attempts: AtomicUsize,
    failing: HashSet<i64>,
}

impl RecordingTransport {
    pub fn failing_for(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            failing: ids.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }

    pub fn published_payloads(&self) -> Vec<StockChangedPayload> {
        self.published()
            .iter()
            .map(|(_, body)| serde_json::from_str(body).unwrap())
            .collect()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueueTransport for RecordingTransport {
    async fn publish(&self, destination: &str, payload: &str) -> Result<(), TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let decoded: StockChangedPayload = serde_json::from_str(payload)?;
        if self.failing.contains(&decoded.product_id) {
            return Err(TransportError::Rejected {
                status: 503,
                body: "broker unavailable".to_string(),
            });
        }
        self.published
            .lock()
            .unwrap()
            .push((destination.to_string(), payload.to_string()));
        Ok(())
    }
}
