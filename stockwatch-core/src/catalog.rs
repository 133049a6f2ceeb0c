//! Read access to the product catalog.
//!
//! The monitor only ever reads the catalog. `PgProductCatalog` is the
//! production implementation; anything else implementing `ProductCatalog`
//! can be plugged into the poller and the read API.

use crate::entities::{
    GetProductById, ListActiveProducts, ListActiveProductsByCategory, ProductSnapshot,
};
use crate::framework::DatabaseProcessor;
use async_trait::async_trait;
use kanau::processor::Processor;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while reading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The fetch did not complete in time
    #[error("catalog fetch timed out after {0:?}")]
    Timeout(Duration),
}

/// Read-only view of the product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// All products currently flagged active. Ordering is unspecified.
    async fn list_active_products(&self) -> Result<Vec<ProductSnapshot>, CatalogError>;

    /// A single product, active or not.
    async fn get_product(&self, id: i64) -> Result<Option<ProductSnapshot>, CatalogError>;

    /// Active products in `category`.
    async fn list_active_products_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<ProductSnapshot>, CatalogError>;
}

/// Catalog backed by the `products` table.
#[derive(Clone)]
pub struct PgProductCatalog {
    processor: DatabaseProcessor,
}

impl PgProductCatalog {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self {
            processor: DatabaseProcessor { pool },
        }
    }
}

#[async_trait]
impl ProductCatalog for PgProductCatalog {
    async fn list_active_products(&self) -> Result<Vec<ProductSnapshot>, CatalogError> {
        Ok(self.processor.process(ListActiveProducts).await?)
    }

    async fn get_product(&self, id: i64) -> Result<Option<ProductSnapshot>, CatalogError> {
        Ok(self.processor.process(GetProductById { id }).await?)
    }

    async fn list_active_products_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<ProductSnapshot>, CatalogError> {
        let query = ListActiveProductsByCategory {
            category: category.to_string(),
        };
        Ok(self.processor.process(query).await?)
    }
}
