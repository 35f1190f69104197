//! Database migration command.
//!
//! Migrations are embedded from `crates/api/migrations/` at build time:
//!
//! ```text
//! migrations/
//! ├── 20260301000001_create_users.sql
//! ├── 20260301000002_create_products.sql
//! ├── 20260301000003_create_carts.sql
//! └── 20260301000004_create_orders.sql
//! ```

use super::{CommandError, connect};

/// Errors that can occur while migrating.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a migration
/// fails.
pub async fn run() -> Result<(), MigrationError> {
    let store = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(store.pool()).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
