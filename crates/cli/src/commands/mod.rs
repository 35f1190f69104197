//! Subcommand implementations.

pub mod migrate;
pub mod seed;
pub mod user;

use emporium_api::config::get_database_url;
use emporium_api::db::{self, PgStore};

/// Errors shared by commands that need the database.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error(transparent)]
    Config(#[from] emporium_api::config::ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect to the database named by `EMPORIUM_DATABASE_URL`.
async fn connect() -> Result<PgStore, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = get_database_url("EMPORIUM_DATABASE_URL")?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;
    Ok(PgStore::new(pool))
}
