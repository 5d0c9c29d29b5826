use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mizan_core::{
    EntityKind, Filter, Precondition, RecordStore, RecordWrite, StoreError, StoredRecord, TenantId,
};
use serde_json::Value;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::{info, warn};
use uuid::Uuid;

const CREATE_RECORDS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    tenant_id UUID NOT NULL,
    kind TEXT NOT NULL,
    id UUID NOT NULL,
    body JSONB NOT NULL,
    seq BIGSERIAL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (tenant_id, kind, id)
)
"#;

const UPSERT: &str = r#"
INSERT INTO records (tenant_id, kind, id, body, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $5)
ON CONFLICT (tenant_id, kind, id)
DO UPDATE SET body = records.body || EXCLUDED.body, updated_at = EXCLUDED.updated_at
RETURNING id, body, created_at, updated_at
"#;

const INSERT_ABSENT: &str = r#"
INSERT INTO records (tenant_id, kind, id, body, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $5)
ON CONFLICT (tenant_id, kind, id) DO NOTHING
RETURNING id, body, created_at, updated_at
"#;

/// Every entity table lives in one JSONB `records` table keyed by tenant and kind.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(CREATE_RECORDS_TABLE).execute(&self.pool).await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS records_body_idx ON records USING GIN (body)")
            .execute(&self.pool)
            .await?;
        info!("records table ready");
        Ok(())
    }
}

fn decode_row(kind: EntityKind, row: &PgRow) -> Result<StoredRecord, StoreError> {
    let id: Uuid = row.try_get("id").map_err(StoreError::backend)?;
    let body: Value = row.try_get("body").map_err(StoreError::backend)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(StoreError::backend)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(StoreError::backend)?;
    Ok(StoredRecord {
        id,
        kind,
        body,
        created_at,
        updated_at,
    })
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn list(
        &self,
        tenant: TenantId,
        kind: EntityKind,
        filter: &Filter,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, body, created_at, updated_at FROM records WHERE tenant_id = $1 AND kind = $2 AND body @> $3 ORDER BY seq",
        )
        .bind(tenant.0)
        .bind(kind.as_str())
        .bind(filter.as_json())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        rows.iter().map(|row| decode_row(kind, row)).collect()
    }

    async fn get(
        &self,
        tenant: TenantId,
        kind: EntityKind,
        id: Uuid,
    ) -> Result<Option<StoredRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT id, body, created_at, updated_at FROM records WHERE tenant_id = $1 AND kind = $2 AND id = $3",
        )
        .bind(tenant.0)
        .bind(kind.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        row.as_ref().map(|row| decode_row(kind, row)).transpose()
    }

    async fn commit(
        &self,
        tenant: TenantId,
        writes: Vec<RecordWrite>,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;
        let now = Utc::now();
        let mut stored = Vec::with_capacity(writes.len());

        for write in writes {
            let id = write.id.unwrap_or_else(Uuid::new_v4);
            if write.expect.is_some() {
                let current: Option<Value> = sqlx::query_scalar(
                    "SELECT body FROM records WHERE tenant_id = $1 AND kind = $2 AND id = $3 FOR UPDATE",
                )
                .bind(tenant.0)
                .bind(write.kind.as_str())
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(StoreError::backend)?;
                write.check(current.as_ref())?;
            }

            // A row inserted by a concurrent transaction after the check
            // must not be merged into when the write expects none.
            let statement = match write.expect {
                Some(Precondition::Absent) => INSERT_ABSENT,
                _ => UPSERT,
            };
            let row = sqlx::query(statement)
                .bind(tenant.0)
                .bind(write.kind.as_str())
                .bind(id)
                .bind(&write.body)
                .bind(now)
                .fetch_optional(&mut *tx)
                .await
                .map_err(StoreError::backend)?
                .ok_or(StoreError::Conflict {
                    kind: write.kind,
                    id: write.id,
                })?;

            stored.push(decode_row(write.kind, &row)?);
        }

        tx.commit().await.map_err(StoreError::backend)?;
        Ok(stored)
    }

    async fn remove(&self, tenant: TenantId, kind: EntityKind, id: Uuid) -> bool {
        let result =
            sqlx::query("DELETE FROM records WHERE tenant_id = $1 AND kind = $2 AND id = $3")
                .bind(tenant.0)
                .bind(kind.as_str())
                .bind(id)
                .execute(&self.pool)
                .await;

        match result {
            Ok(done) => done.rows_affected() > 0,
            Err(err) => {
                warn!("failed to remove {kind} {id}: {err}");
                false
            }
        }
    }
}
