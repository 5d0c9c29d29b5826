//! Workflow actions: read what an action needs, apply the posting rules,
//! and commit every resulting write in one atomic unit.

use std::sync::Arc;

use mizan_core::{
    Entity, LedgerError, PostingProfile, RecordStore, Repository, Stored, StoredRecord, TenantId,
    UnitOfWork,
};
use uuid::Uuid;

pub mod cash;
pub mod forecast;
pub mod payroll;
pub mod purchasing;
pub mod sales;
pub mod suppliers;

pub use cash::CashWorkflow;
pub use forecast::ForecastWorkflow;
pub use payroll::{PayrollWorkflow, SalaryPaymentOutcome, SlipOutcome, StaffPayOutcome};
pub use purchasing::{OrderSaved, PurchasingWorkflow};
pub use sales::{SaleCompleted, SaleCustomer, SaleOrder, SalesWorkflow};
pub use suppliers::{DebitNoteCreated, InstallmentPaid, SupplierPaymentRecorded, SuppliersWorkflow};

/// Everything a workflow needs for one tenant: the store, the tenant and the
/// posting policy.
#[derive(Clone)]
pub struct LedgerContext {
    store: Arc<dyn RecordStore>,
    tenant: TenantId,
    profile: Arc<dyn PostingProfile>,
}

impl LedgerContext {
    pub fn new(
        store: Arc<dyn RecordStore>,
        tenant: TenantId,
        profile: Arc<dyn PostingProfile>,
    ) -> Self {
        Self {
            store,
            tenant,
            profile,
        }
    }

    pub fn tenant(&self) -> TenantId {
        self.tenant
    }

    pub fn profile(&self) -> &dyn PostingProfile {
        self.profile.as_ref()
    }

    pub fn repository<T: Entity>(&self) -> Repository<T> {
        Repository::new(Arc::clone(&self.store), self.tenant)
    }

    pub fn unit_of_work(&self) -> UnitOfWork {
        UnitOfWork::new(Arc::clone(&self.store), self.tenant)
    }
}

/// Picks the committed row for `id` out of a commit result.
pub(crate) fn committed<T: Entity>(
    records: &[StoredRecord],
    id: Uuid,
) -> Result<Stored<T>, LedgerError> {
    let record = records
        .iter()
        .find(|record| record.kind == T::KIND && record.id == id)
        .cloned()
        .ok_or_else(|| LedgerError::NotFound(format!("{} {id} missing from commit", T::KIND)))?;
    Ok(Stored::decode(record)?)
}
