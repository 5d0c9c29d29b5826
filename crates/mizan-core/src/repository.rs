use std::{marker::PhantomData, ops::Deref, sync::Arc};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::{LedgerError, StoreError},
    storage::{
        Entity, Filter, Precondition, RecordStore, RecordWrite, StoredRecord, TenantId, merge_body,
    },
};

/// A decoded row together with the metadata the store assigned to it.
#[derive(Debug, Clone, Serialize)]
pub struct Stored<T> {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: T,
}

impl<T: Entity> Stored<T> {
    pub fn decode(stored: StoredRecord) -> Result<Self, StoreError> {
        let record = serde_json::from_value(stored.body).map_err(|source| StoreError::Decode {
            kind: stored.kind,
            id: stored.id,
            source,
        })?;
        Ok(Self {
            id: stored.id,
            created_at: stored.created_at,
            record,
        })
    }
}

impl<T> Deref for Stored<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.record
    }
}

/// Typed access to one entity table of one tenant.
pub struct Repository<T> {
    store: Arc<dyn RecordStore>,
    tenant: TenantId,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            tenant: self.tenant,
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(store: Arc<dyn RecordStore>, tenant: TenantId) -> Self {
        Self {
            store,
            tenant,
            _entity: PhantomData,
        }
    }

    pub fn tenant(&self) -> TenantId {
        self.tenant
    }

    pub async fn list(&self) -> Result<Vec<Stored<T>>, LedgerError> {
        self.list_where(&Filter::all()).await
    }

    pub async fn list_where(&self, filter: &Filter) -> Result<Vec<Stored<T>>, LedgerError> {
        let rows = self.store.list(self.tenant, T::KIND, filter).await?;
        rows.into_iter()
            .map(|row| Stored::decode(row).map_err(LedgerError::from))
            .collect()
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Stored<T>>, LedgerError> {
        match self.store.get(self.tenant, T::KIND, id).await? {
            Some(row) => Ok(Some(Stored::decode(row)?)),
            None => Ok(None),
        }
    }

    /// Like [`get`](Self::get), but a missing row is a `NotFound` error.
    pub async fn require(&self, id: Uuid) -> Result<Stored<T>, LedgerError> {
        self.get(id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("{} {id} not found", T::KIND)))
    }

    pub async fn upsert(&self, id: Option<Uuid>, record: &T) -> Result<Stored<T>, LedgerError> {
        record.validate()?;
        let body = serde_json::to_value(record).map_err(StoreError::from)?;
        let stored = self.store.upsert(self.tenant, T::KIND, id, body).await?;
        Ok(Stored::decode(stored)?)
    }

    /// Applies a partial JSON body. An existing row is merged with `patch`
    /// first, and the merged record must still decode and validate.
    pub async fn upsert_json(&self, id: Option<Uuid>, patch: Value) -> Result<Stored<T>, LedgerError> {
        let record = self.patched(id, patch).await?;
        self.upsert(id, &record).await
    }

    /// The record `patch` would produce over the stored row, without writing it.
    pub async fn patched(&self, id: Option<Uuid>, patch: Value) -> Result<T, LedgerError> {
        if !patch.is_object() {
            return Err(LedgerError::Validation(format!(
                "{} body must be a JSON object",
                T::KIND
            )));
        }

        let mut body = match id {
            Some(id) => match self.store.get(self.tenant, T::KIND, id).await? {
                Some(existing) => existing.body,
                None => Value::Object(Default::default()),
            },
            None => Value::Object(Default::default()),
        };
        merge_body(&mut body, patch);

        serde_json::from_value(body)
            .map_err(|err| LedgerError::Validation(format!("invalid {}: {err}", T::KIND)))
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.store.remove(self.tenant, T::KIND, id).await
    }

    pub async fn refresh(&self) -> Result<(), LedgerError> {
        self.store.refresh(self.tenant, T::KIND).await?;
        Ok(())
    }
}

/// Collects validated writes for several tables and commits them atomically.
pub struct UnitOfWork {
    store: Arc<dyn RecordStore>,
    tenant: TenantId,
    writes: Vec<RecordWrite>,
}

impl UnitOfWork {
    pub fn new(store: Arc<dyn RecordStore>, tenant: TenantId) -> Self {
        Self {
            store,
            tenant,
            writes: Vec::new(),
        }
    }

    /// Stages an upsert and returns the id the row will be stored under.
    pub fn stage<T: Entity>(&mut self, id: Option<Uuid>, record: &T) -> Result<Uuid, LedgerError> {
        record.validate()?;
        let id = id.unwrap_or_else(Uuid::new_v4);
        let body = serde_json::to_value(record).map_err(StoreError::from)?;
        self.writes.push(RecordWrite::new(T::KIND, Some(id), body));
        Ok(id)
    }

    /// Stages an update of row `id` that only applies while `expect` holds
    /// for the stored row at commit time.
    pub fn stage_guarded<T: Entity>(
        &mut self,
        id: Uuid,
        record: &T,
        expect: Precondition,
    ) -> Result<Uuid, LedgerError> {
        record.validate()?;
        let body = serde_json::to_value(record).map_err(StoreError::from)?;
        self.writes
            .push(RecordWrite::new(T::KIND, Some(id), body).expecting(expect));
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub async fn commit(self) -> Result<Vec<StoredRecord>, LedgerError> {
        if self.writes.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.store.commit(self.tenant, self.writes).await?)
    }
}
