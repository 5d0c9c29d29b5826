pub mod error;
pub mod events;
pub mod models;
pub mod payroll;
pub mod purchasing;
pub mod repository;
pub mod sales;
pub mod standards;
pub mod storage;

pub use error::{LedgerError, StoreError};
pub use events::{ChangeKind, RecordChanged};
pub use models::{
    BillingCycle, DebitNote, DebitNoteInstallment, DebitNoteInstallmentStatus, DebitNoteStatus,
    Expense, InstallmentRecord, InstallmentStatus, Loan, LoanStatus, Project, ProjectStatus,
    Quotation, QuotationStatus, StashDirection, StashTransaction, SupplierPayment,
};
pub use payroll::{
    AdvanceStatus, EmploymentType, PayPeriod, PayrollContract, SalaryAdvance, SalaryRegister,
    SalarySlip, SalaryStatus, Staff,
};
pub use purchasing::{PurchaseOrder, PurchaseOrderStatus, RequestType};
pub use repository::{Repository, Stored, UnitOfWork};
pub use sales::{Customer, InvoiceStatus, PropertyUnit, SalesInvoice, UnitStatus};
pub use standards::{EgpProfile, ExpenseCategories, PostingProfile};
pub use storage::{
    Entity, EntityKind, Filter, Precondition, RecordStore, RecordWrite, StoredRecord, TenantId,
};
