#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use mizan_core::{
    EgpProfile, EntityKind, Filter, RecordStore, RecordWrite, StoreError, StoredRecord, TenantId,
};
use mizan_store::InMemoryRecordStore;
use mizan_workflows::LedgerContext;
use uuid::Uuid;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn context_over(store: Arc<dyn RecordStore>) -> LedgerContext {
    LedgerContext::new(store, TenantId::new(), Arc::new(EgpProfile::default()))
}

pub fn memory_context() -> (LedgerContext, Arc<InMemoryRecordStore>) {
    let store = Arc::new(InMemoryRecordStore::new());
    (context_over(store.clone()), store)
}

/// Wraps a real store and rejects any commit that touches `poisoned`.
pub struct FailingStore {
    pub inner: InMemoryRecordStore,
    pub poisoned: EntityKind,
}

#[async_trait]
impl RecordStore for FailingStore {
    async fn list(
        &self,
        tenant: TenantId,
        kind: EntityKind,
        filter: &Filter,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        self.inner.list(tenant, kind, filter).await
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
        if writes.iter().any(|write| write.kind == self.poisoned) {
            return Err(StoreError::Backend(format!("{} table unavailable", self.poisoned)));
        }
        self.inner.commit(tenant, writes).await
    }

    async fn remove(&self, tenant: TenantId, kind: EntityKind, id: Uuid) -> bool {
        self.inner.remove(tenant, kind, id).await
    }
}

/// Hands control back to the scheduler after every read, so concurrent
/// workflows interleave between reading a row and committing over it.
pub struct YieldingStore {
    pub inner: InMemoryRecordStore,
}

#[async_trait]
impl RecordStore for YieldingStore {
    async fn list(
        &self,
        tenant: TenantId,
        kind: EntityKind,
        filter: &Filter,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        let rows = self.inner.list(tenant, kind, filter).await;
        tokio::task::yield_now().await;
        rows
    }

    async fn get(
        &self,
        tenant: TenantId,
        kind: EntityKind,
        id: Uuid,
    ) -> Result<Option<StoredRecord>, StoreError> {
        let row = self.inner.get(tenant, kind, id).await;
        tokio::task::yield_now().await;
        row
    }

    async fn commit(
        &self,
        tenant: TenantId,
        writes: Vec<RecordWrite>,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        self.inner.commit(tenant, writes).await
    }

    async fn remove(&self, tenant: TenantId, kind: EntityKind, id: Uuid) -> bool {
        self.inner.remove(tenant, kind, id).await
    }
}
