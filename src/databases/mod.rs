use anyhow::{Context, Result};
use chrono::Utc;
use log::{error, info};
use sqlx::{Executor, PgPool};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ServerConfig;

pub mod auth;

use auth::PendingStore;

const AUTH_SCHEMA: &str = include_str!("../../databases/auth/schema.sql");

const REQUIRED_TABLES: [&str; 2] = ["pending_signups", "users"];

/// Lists the required tables that are absent from the public schema.
async fn missing_tables(pool: &PgPool) -> Result<Vec<String>> {
    let present: Vec<(String,)> = sqlx::query_as(
        "SELECT table_name::text FROM information_schema.tables
         WHERE table_schema = 'public' AND table_name::text = ANY($1)",
    )
    .bind(&REQUIRED_TABLES[..])
    .fetch_all(pool)
    .await
    .context("Failed to inspect information_schema")?;

    Ok(absent_from(&present.into_iter().map(|(t,)| t).collect::<Vec<_>>()))
}

fn absent_from(present: &[String]) -> Vec<String> {
    REQUIRED_TABLES
        .iter()
        .filter(|table| !present.iter().any(|p| p == *table))
        .map(|table| table.to_string())
        .collect()
}

/// Connects to Postgres and applies the bundled auth schema when any of its tables is missing.
pub async fn setup_backend(config: &ServerConfig) -> Result<PgPool> {
    let pool = PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let missing = missing_tables(&pool).await?;
    if missing.is_empty() {
        info!("All required tables exist.");
    } else {
        info!("Creating missing tables: {}", missing.join(", "));
        pool.execute(AUTH_SCHEMA)
            .await
            .context("Failed to execute auth schema")?;
    }

    Ok(pool)
}

/// Deletes expired pending signups on a fixed interval until the runtime shuts down.
pub fn spawn_pending_sweeper(
    store: Arc<dyn PendingStore>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match store.purge_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(removed) => info!("Purged {} expired pending signup(s)", removed),
                Err(e) => error!("Failed to purge expired pending signups: {}", e),
            }
        }
    })
}
