//! PostgreSQL pool and schema management for games, rights, users and passwords.

use crate::config::DatabaseConfig;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Embedded schema migrations from `./migrations`.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Connecting to the admin database"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.url)
        .await?;

    tracing::info!("Admin database pool ready");
    Ok(pool)
}

/// Bring the games/rights/users schema up to date.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::info!(migrations = MIGRATOR.iter().count(), "Applying admin schema migrations");
    MIGRATOR.run(pool).await?;
    tracing::info!("Admin schema is current");
    Ok(())
}

/// Fails when the database is unreachable or the rights table is missing.
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1 FROM rights LIMIT 1")
        .fetch_optional(pool)
        .await?;
    Ok(())
}
