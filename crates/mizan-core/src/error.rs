use thiserror::Error;
use uuid::Uuid;

use crate::storage::EntityKind;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),
    #[error("malformed {kind} record {id}: {source}")]
    Decode {
        kind: EntityKind,
        id: Uuid,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("{kind} record {} changed concurrently", display_id(.id))]
    Conflict { kind: EntityKind, id: Option<Uuid> },
}

fn display_id(id: &Option<Uuid>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "(new)".to_string())
}

impl StoreError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Failures surfaced at the workflow boundary.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    pub fn missing(field: &str) -> Self {
        Self::Validation(format!("{field} is required"))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Store(StoreError::Conflict { .. }))
    }
}
