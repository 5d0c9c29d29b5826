use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::{EntityKind, TenantId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChangeKind {
    Upserted,
    Removed,
}

/// Published after a commit so that listeners can refresh their cached lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordChanged {
    pub tenant: TenantId,
    pub kind: EntityKind,
    pub record_id: Uuid,
    pub change: ChangeKind,
    pub occurred_at: DateTime<Utc>,
}

impl RecordChanged {
    pub fn upserted(tenant: TenantId, kind: EntityKind, record_id: Uuid) -> Self {
        Self {
            tenant,
            kind,
            record_id,
            change: ChangeKind::Upserted,
            occurred_at: Utc::now(),
        }
    }

    pub fn removed(tenant: TenantId, kind: EntityKind, record_id: Uuid) -> Self {
        Self {
            tenant,
            kind,
            record_id,
            change: ChangeKind::Removed,
            occurred_at: Utc::now(),
        }
    }
}
