use std::time::Duration;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::DatabaseConfig;

pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .min_connections(cfg.min_connections)
        .idle_timeout(cfg.idle_timeout())
        .max_lifetime(cfg.max_lifetime())
        .acquire_timeout(cfg.acquire_timeout())
        .connect_with(cfg.connect_options()?)
        .await
        .context("connect to database")?;
    tracing::info!(
        host = %cfg.host,
        database = %cfg.name,
        max_connections = cfg.max_connections,
        "database connected"
    );
    Ok(db)
}

pub async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    Ok(())
}

/// Closes the pool, giving checked-out connections at most `grace` to come back.
pub async fn close(db: &PgPool, grace: Duration) {
    match tokio::time::timeout(grace, db.close()).await {
        Ok(()) => tracing::info!("database pool closed"),
        Err(_) => tracing::warn!(
            grace_ms = grace.as_millis() as u64,
            "database pool still busy after grace period; leaving remaining connections"
        ),
    }
}
