//! `PostgreSQL` implementation of [`Store`].
//!
//! Queries are checked at runtime (`query_as` with `FromRow` row types) so
//! the crate builds without a live database. Multi-statement operations run
//! in a transaction and lock the user's `carts` row first, which serializes
//! every cart mutation and checkout for that user.

mod cart;
mod catalog;
mod orders;
mod users;

use async_trait::async_trait;
use sqlx::PgPool;

use super::{RepositoryError, Store};

/// Durable store over a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Map a unique-constraint failure to `Conflict`, anything else to `Database`.
fn unique_violation(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(err)
}
