use std::{fmt, str::FromStr};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{LedgerError, StoreError};

/// Organisation that owns a record. Every store call is scoped to one tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub Uuid);

impl TenantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

macro_rules! entity_kinds {
    ($($variant:ident => $table:literal),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum EntityKind {
            $(
                #[serde(rename = $table)]
                $variant,
            )+
        }

        impl EntityKind {
            pub const ALL: &'static [EntityKind] = &[$(EntityKind::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(EntityKind::$variant => $table,)+
                }
            }
        }

        impl FromStr for EntityKind {
            type Err = LedgerError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($table => Ok(EntityKind::$variant),)+
                    other => Err(LedgerError::Validation(format!("unknown entity type {other}"))),
                }
            }
        }
    };
}

entity_kinds! {
    Staff => "staff",
    SalaryRegisters => "salary_registers",
    PayrollContracts => "payroll_contracts",
    SalaryAdvances => "salary_advances",
    SalarySlips => "salary_slips",
    PurchaseOrders => "purchase_orders",
    Expenses => "expenses",
    InstallmentRecords => "installment_records",
    Loans => "loans",
    StashTransactions => "stash_transactions",
    Projects => "projects",
    Quotations => "quotations",
    DebitNotes => "debit_notes",
    DebitNoteInstallments => "debit_note_installments",
    SupplierPayments => "supplier_payments",
    Customers => "customers",
    Units => "units",
    SalesInvoices => "sales_invoices",
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed row that lives in one entity table.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;

    /// Rejects records with missing required fields before they reach the store.
    fn validate(&self) -> Result<(), LedgerError> {
        Ok(())
    }
}

/// Untyped row as the store keeps it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: Uuid,
    pub kind: EntityKind,
    pub body: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One upsert inside an atomic commit. A missing id means "insert with a fresh id".
#[derive(Debug, Clone)]
pub struct RecordWrite {
    pub kind: EntityKind,
    pub id: Option<Uuid>,
    pub body: Value,
    /// Checked against the stored row inside the commit; a miss aborts every write.
    pub expect: Option<Precondition>,
}

impl RecordWrite {
    pub fn new(kind: EntityKind, id: Option<Uuid>, body: Value) -> Self {
        Self {
            kind,
            id,
            body,
            expect: None,
        }
    }

    pub fn expecting(mut self, expect: Precondition) -> Self {
        self.expect = Some(expect);
        self
    }

    /// Fails with [`StoreError::Conflict`] when the precondition does not hold
    /// for `current`, the row as stored before this commit.
    pub fn check(&self, current: Option<&Value>) -> Result<(), StoreError> {
        match &self.expect {
            Some(expect) if !expect.holds(current) => Err(StoreError::Conflict {
                kind: self.kind,
                id: self.id,
            }),
            _ => Ok(()),
        }
    }
}

/// State a row must be in for a guarded write to apply.
#[derive(Debug, Clone, PartialEq)]
pub enum Precondition {
    /// No row is stored under the id yet.
    Absent,
    /// A row is stored and its body matches the filter.
    Matches(Filter),
}

impl Precondition {
    pub fn holds(&self, current: Option<&Value>) -> bool {
        match (self, current) {
            (Self::Absent, current) => current.is_none(),
            (Self::Matches(filter), Some(body)) => filter.matches(body),
            (Self::Matches(_), None) => false,
        }
    }
}

/// Field-equality filter over the top-level keys of a record body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Map<String, Value>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.insert(field.to_string(), value.into());
        self
    }

    /// Equality on the serialized form of a typed value (ids, enums).
    pub fn eq_serialized(self, field: &str, value: &impl Serialize) -> Result<Self, StoreError> {
        let value = serde_json::to_value(value)?;
        Ok(self.eq(field, value))
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, body: &Value) -> bool {
        self.clauses
            .iter()
            .all(|(field, expected)| body.get(field).unwrap_or(&Value::Null) == expected)
    }

    /// The filter as a JSON object, usable as a containment pattern.
    pub fn as_json(&self) -> Value {
        Value::Object(self.clauses.clone())
    }
}

/// Row storage keyed by tenant, entity type and id.
///
/// Lists come back in insertion order. Upserts shallow-merge the new body
/// into an existing row. `remove` never errors; it reports `false` instead.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list(
        &self,
        tenant: TenantId,
        kind: EntityKind,
        filter: &Filter,
    ) -> Result<Vec<StoredRecord>, StoreError>;

    async fn get(
        &self,
        tenant: TenantId,
        kind: EntityKind,
        id: Uuid,
    ) -> Result<Option<StoredRecord>, StoreError>;

    /// Applies every write or none of them.
    async fn commit(
        &self,
        tenant: TenantId,
        writes: Vec<RecordWrite>,
    ) -> Result<Vec<StoredRecord>, StoreError>;

    async fn remove(&self, tenant: TenantId, kind: EntityKind, id: Uuid) -> bool;

    async fn refresh(&self, _tenant: TenantId, _kind: EntityKind) -> Result<(), StoreError> {
        Ok(())
    }

    /// Drops any view of the table held in front of the backing store.
    async fn invalidate(&self, _tenant: TenantId, _kind: EntityKind) {}

    async fn upsert(
        &self,
        tenant: TenantId,
        kind: EntityKind,
        id: Option<Uuid>,
        body: Value,
    ) -> Result<StoredRecord, StoreError> {
        let mut stored = self
            .commit(tenant, vec![RecordWrite::new(kind, id, body)])
            .await?;
        stored
            .pop()
            .ok_or_else(|| StoreError::Backend("commit returned no record".to_string()))
    }
}

/// Shallow merge of `patch` into `target`, the way a partial upsert behaves.
pub fn merge_body(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(existing), Value::Object(fields)) => {
            for (key, value) in fields {
                existing.insert(key, value);
            }
        }
        (target, patch) => *target = patch,
    }
}
