use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use mizan_core::{
    EntityKind, Filter, RecordStore, RecordWrite, StoreError, StoredRecord, TenantId,
    storage::merge_body,
};
use tokio::sync::RwLock;
use uuid::Uuid;

type TableKey = (TenantId, EntityKind);

/// Process-local store. Commits, preconditions included, apply under a single write lock.
#[derive(Default)]
pub struct InMemoryRecordStore {
    tables: RwLock<HashMap<TableKey, Vec<StoredRecord>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn list(
        &self,
        tenant: TenantId,
        kind: EntityKind,
        filter: &Filter,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&(tenant, kind))
            .map(|rows| {
                rows.iter()
                    .filter(|row| filter.matches(&row.body))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get(
        &self,
        tenant: TenantId,
        kind: EntityKind,
        id: Uuid,
    ) -> Result<Option<StoredRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&(tenant, kind))
            .and_then(|rows| rows.iter().find(|row| row.id == id).cloned()))
    }

    async fn commit(
        &self,
        tenant: TenantId,
        writes: Vec<RecordWrite>,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        if let Some(bad) = writes.iter().find(|write| !write.body.is_object()) {
            return Err(StoreError::Backend(format!(
                "{} record body must be a JSON object",
                bad.kind
            )));
        }

        let mut tables = self.tables.write().await;
        for write in writes.iter().filter(|write| write.expect.is_some()) {
            let current = write.id.and_then(|id| {
                tables
                    .get(&(tenant, write.kind))
                    .and_then(|rows| rows.iter().find(|row| row.id == id))
            });
            write.check(current.map(|row| &row.body))?;
        }

        let now = Utc::now();
        let mut stored = Vec::with_capacity(writes.len());

        for write in writes {
            let rows = tables.entry((tenant, write.kind)).or_default();
            let existing = write
                .id
                .and_then(|id| rows.iter_mut().find(|row| row.id == id));

            let row = match existing {
                Some(row) => {
                    merge_body(&mut row.body, write.body);
                    row.updated_at = now;
                    row.clone()
                }
                None => {
                    let row = StoredRecord {
                        id: write.id.unwrap_or_else(Uuid::new_v4),
                        kind: write.kind,
                        body: write.body,
                        created_at: now,
                        updated_at: now,
                    };
                    rows.push(row.clone());
                    row
                }
            };
            stored.push(row);
        }

        Ok(stored)
    }

    async fn remove(&self, tenant: TenantId, kind: EntityKind, id: Uuid) -> bool {
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(&(tenant, kind)) else {
            return false;
        };
        let before = rows.len();
        rows.retain(|row| row.id != id);
        rows.len() != before
    }
}
