use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use stockwatch_sdk::objects::ProductResponse;

/// A catalog row as seen by the monitor. Never written by this crate.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ProductSnapshot {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub quantity: i32,
    pub price: Option<Decimal>,
    pub active: bool,
}

impl From<ProductSnapshot> for ProductResponse {
    fn from(p: ProductSnapshot) -> Self {
        ProductResponse {
            id: p.id,
            name: p.name,
            category: p.category,
            quantity: p.quantity,
            price: p.price,
            active: p.active,
        }
    }
}

#[derive(Debug, Clone, Copy)]
/// List every product flagged as active.
pub struct ListActiveProducts;

impl Processor<ListActiveProducts> for DatabaseProcessor {
    type Output = Vec<ProductSnapshot>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListActiveProducts")]
    async fn process(
        &self,
        _query: ListActiveProducts,
    ) -> Result<Vec<ProductSnapshot>, sqlx::Error> {
        sqlx::query_as::<_, ProductSnapshot>(
            r#"
            SELECT id, name, category, quantity, price, active
            FROM products
            WHERE active = TRUE
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GetProductById {
    pub id: i64,
}

impl Processor<GetProductById> for DatabaseProcessor {
    type Output = Option<ProductSnapshot>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetProductById")]
    async fn process(
        &self,
        query: GetProductById,
    ) -> Result<Option<ProductSnapshot>, sqlx::Error> {
        sqlx::query_as::<_, ProductSnapshot>(
            r#"
            SELECT id, name, category, quantity, price, active
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(query.id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// List active products in one category.
pub struct ListActiveProductsByCategory {
    pub category: String,
}

impl Processor<ListActiveProductsByCategory> for DatabaseProcessor {
    type Output = Vec<ProductSnapshot>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListActiveProductsByCategory")]
    async fn process(
        &self,
        query: ListActiveProductsByCategory,
    ) -> Result<Vec<ProductSnapshot>, sqlx::Error> {
        sqlx::query_as::<_, ProductSnapshot>(
            r#"
            SELECT id, name, category, quantity, price, active
            FROM products
            WHERE category = $1 AND active = TRUE
            ORDER BY id
            "#,
        )
        .bind(query.category)
        .fetch_all(&self.pool)
        .await
    }
}
