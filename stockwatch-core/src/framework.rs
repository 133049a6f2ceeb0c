use sqlx::PgPool;

/// Runs `kanau` query objects against the connection pool.
#[derive(Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}
