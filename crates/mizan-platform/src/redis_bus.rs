use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use mizan_core::{RecordChanged, RecordStore};
use redis::{AsyncCommands, Client};
use serde::Serialize;
use tracing::{error, info, warn};

pub const RECORDS_CHANGED_CHANNEL: &str = "records.changed";

#[derive(Clone)]
pub struct RedisBus {
    client: Client,
}

impl RedisBus {
    pub fn connect(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)?;
        Ok(Self { client })
    }

    pub async fn publish_json<T: Serialize>(&self, channel: &str, payload: &T) -> Result<()> {
        let mut connection = self.client.get_multiplexed_async_connection().await?;
        let serialized = serde_json::to_string(payload)?;
        let _: i64 = connection.publish(channel, serialized).await?;
        Ok(())
    }

    pub async fn publish_changes(&self, changes: &[RecordChanged]) -> Result<()> {
        for change in changes {
            self.publish_json(RECORDS_CHANGED_CHANNEL, change).await?;
        }
        Ok(())
    }

    /// Invalidates `store`'s cached tables for every change any instance publishes.
    pub async fn follow_changes(&self, store: Arc<dyn RecordStore>) -> Result<()> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(RECORDS_CHANGED_CHANNEL).await?;
        let mut messages = pubsub.on_message();

        info!("subscribed to {RECORDS_CHANGED_CHANNEL}");

        loop {
            let msg = messages
                .next()
                .await
                .context("records.changed stream ended unexpectedly")?;
            let applied = match msg.get_payload::<String>() {
                Ok(payload) => apply_change(store.as_ref(), &payload).await.map(|_| ()),
                Err(err) => Err(err.into()),
            };
            if let Err(err) = applied {
                warn!("ignoring malformed {RECORDS_CHANGED_CHANNEL} message: {err:#}");
            }
        }
    }

    /// Runs [`follow_changes`](Self::follow_changes) in the background.
    pub fn spawn_follower(&self, store: Arc<dyn RecordStore>) {
        let bus = self.clone();
        tokio::spawn(async move {
            if let Err(err) = bus.follow_changes(store).await {
                error!("stopped following record changes: {err:#}");
            }
        });
    }
}

/// Decodes one `records.changed` payload and drops the table it names from the cache.
pub async fn apply_change(store: &dyn RecordStore, payload: &str) -> Result<RecordChanged> {
    let change: RecordChanged = serde_json::from_str(payload)?;
    store.invalidate(change.tenant, change.kind).await;
    Ok(change)
}
