//! Ledger posting rules: pure functions mapping one entity's state change
//! to the rows it implies elsewhere. Nothing here touches a store.

pub mod display;
pub mod forecast;
pub mod ledger;
pub mod payroll;
pub mod purchasing;
pub mod sales;
pub mod suppliers;

pub use display::{format_money, format_outstanding};
pub use forecast::{Forecast, ForecastMonth, project_forecast};
pub use ledger::{LoanSummary, installments_outstanding, loan_summary, stash_balance};
pub use payroll::{
    SalaryPosting, SlipPosting, StaffPayPosting, apply_salary_payment, generate_slip,
    pay_staff_directly, select_active_contract,
};
pub use purchasing::completion_expense;
pub use sales::{SalePosting, sale_postings};
pub use suppliers::{
    debit_note_installments, debit_note_status, supplier_payment_expense,
};
