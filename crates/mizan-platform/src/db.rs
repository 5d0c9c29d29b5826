use std::sync::Arc;

use anyhow::{Context, Result};
use mizan_core::RecordStore;
use mizan_store::{CachedRecordStore, InMemoryRecordStore, PgRecordStore};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::{info, warn};

use crate::ServiceConfig;

pub async fn connect_database(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Postgres behind a list cache when `DATABASE_URL` is set, otherwise a
/// process-local store that is lost on restart.
pub async fn build_record_store(config: &ServiceConfig) -> Result<Arc<dyn RecordStore>> {
    let Some(database_url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL not set, records are kept in memory only");
        return Ok(Arc::new(InMemoryRecordStore::new()));
    };

    let pool = connect_database(database_url)
        .await
        .context("failed to connect to postgres")?;
    let store = PgRecordStore::new(pool);
    store.migrate().await.context("failed to prepare records table")?;
    info!("using postgres record store");

    Ok(Arc::new(CachedRecordStore::new(store)))
}
