//! Postgres connection pool

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;

use crate::types::LaurelError;

/// Connect to Postgres and verify the connection with a ping query
pub async fn connect_postgres(url: &str, max_connections: u32) -> Result<PgPool, LaurelError> {
    info!("Connecting to Postgres");

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await
        .map_err(|e| LaurelError::Database(format!("Failed to connect to Postgres: {}", e)))?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| LaurelError::Database(format!("Postgres ping failed: {}", e)))?;

    info!("Connected to Postgres");
    Ok(pool)
}
