use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use mizan_core::{EntityKind, Filter, RecordStore, RecordWrite, StoreError, StoredRecord, TenantId};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

type TableKey = (TenantId, EntityKind);

#[derive(Default)]
struct Lists {
    rows: HashMap<TableKey, Vec<StoredRecord>>,
    /// Bumped on every invalidation; a load started under an older value is discarded.
    generations: HashMap<TableKey, u64>,
}

impl Lists {
    fn generation(&self, key: &TableKey) -> u64 {
        self.generations.get(key).copied().unwrap_or_default()
    }
}

/// Keeps whole-table lists in memory until a local write, `invalidate` or
/// `refresh` drops them. Writes by other processes arrive through `invalidate`.
pub struct CachedRecordStore<S> {
    inner: S,
    lists: RwLock<Lists>,
}

impl<S: RecordStore> CachedRecordStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            lists: RwLock::new(Lists::default()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub async fn is_cached(&self, tenant: TenantId, kind: EntityKind) -> bool {
        self.lists.read().await.rows.contains_key(&(tenant, kind))
    }

    async fn table(&self, tenant: TenantId, kind: EntityKind) -> Result<Vec<StoredRecord>, StoreError> {
        let key = (tenant, kind);
        let generation = {
            let lists = self.lists.read().await;
            if let Some(rows) = lists.rows.get(&key) {
                return Ok(rows.clone());
            }
            lists.generation(&key)
        };

        let rows = self.inner.list(tenant, kind, &Filter::all()).await?;
        let mut lists = self.lists.write().await;
        if lists.generation(&key) == generation {
            debug!("cached {} {kind} rows for tenant {tenant}", rows.len());
            lists.rows.insert(key, rows.clone());
        } else {
            debug!("{kind} rows for tenant {tenant} changed while loading, not cached");
        }
        Ok(rows)
    }
}

#[async_trait]
impl<S: RecordStore> RecordStore for CachedRecordStore<S> {
    async fn list(
        &self,
        tenant: TenantId,
        kind: EntityKind,
        filter: &Filter,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        let rows = self.table(tenant, kind).await?;
        Ok(rows
            .into_iter()
            .filter(|row| filter.matches(&row.body))
            .collect())
    }

    async fn get(
        &self,
        tenant: TenantId,
        kind: EntityKind,
        id: Uuid,
    ) -> Result<Option<StoredRecord>, StoreError> {
        self.inner.get(tenant, kind, id).await
    }

    async fn commit(
        &self,
        tenant: TenantId,
        writes: Vec<RecordWrite>,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        let touched: BTreeSet<EntityKind> = writes.iter().map(|write| write.kind).collect();
        let stored = self.inner.commit(tenant, writes).await?;
        for kind in touched {
            self.invalidate(tenant, kind).await;
        }
        Ok(stored)
    }

    async fn remove(&self, tenant: TenantId, kind: EntityKind, id: Uuid) -> bool {
        let removed = self.inner.remove(tenant, kind, id).await;
        if removed {
            self.invalidate(tenant, kind).await;
        }
        removed
    }

    async fn refresh(&self, tenant: TenantId, kind: EntityKind) -> Result<(), StoreError> {
        self.invalidate(tenant, kind).await;
        self.inner.refresh(tenant, kind).await?;
        self.table(tenant, kind).await?;
        Ok(())
    }

    async fn invalidate(&self, tenant: TenantId, kind: EntityKind) {
        let key = (tenant, kind);
        let mut lists = self.lists.write().await;
        lists.rows.remove(&key);
        *lists.generations.entry(key).or_default() += 1;
        drop(lists);
        self.inner.invalidate(tenant, kind).await;
    }
}
