//! Database Connection Management
//!
//! PostgreSQL pool construction with SQLx.

use sqlx::PgPool;
use std::time::Duration;

use crate::config::DatabaseSettings;

/// Database connection pool type alias for convenience
pub type DatabasePool = PgPool;

/// Create a database connection pool from the loaded settings
pub async fn create_pool(settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.connect_timeout_seconds))
        .idle_timeout(Duration::from_secs(settings.idle_timeout_seconds))
        .max_lifetime(Duration::from_secs(settings.max_lifetime_seconds))
        .connect(&settings.url)
        .await
}

/// Run pending migrations from the bundled ./migrations directory
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
