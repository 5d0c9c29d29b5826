use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::LedgerError,
    storage::{Entity, EntityKind},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    pub amount: Decimal,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub receipt_url: Option<String>,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub unit_id: Option<Uuid>,
    #[serde(default)]
    pub branch_id: Option<Uuid>,
}

impl Entity for Expense {
    const KIND: EntityKind = EntityKind::Expenses;

    fn validate(&self) -> Result<(), LedgerError> {
        if self.category.trim().is_empty() {
            return Err(LedgerError::missing("category"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StashDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StashTransaction {
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub direction: StashDirection,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    #[serde(default = "default_reference_type")]
    pub reference_type: String,
    #[serde(default)]
    pub reference_id: Option<Uuid>,
}

impl StashTransaction {
    /// Contribution of this transaction to the stash balance.
    pub fn signed_amount(&self) -> Decimal {
        match self.direction {
            StashDirection::In => self.amount,
            StashDirection::Out => -self.amount,
        }
    }
}

impl Entity for StashTransaction {
    const KIND: EntityKind = EntityKind::StashTransactions;
}

fn default_reference_type() -> String {
    "General".to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum LoanStatus {
    #[default]
    Active,
    #[serde(rename = "Paid Off")]
    PaidOff,
    Defaulted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub borrower_name: String,
    pub principal_amount: Decimal,
    #[serde(default)]
    pub interest_rate: Decimal,
    #[serde(default)]
    pub term_months: u32,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub status: LoanStatus,
    #[serde(default)]
    pub amount_paid: Decimal,
}

impl Loan {
    /// Unclamped; overpaid loans go negative.
    pub fn remaining(&self) -> Decimal {
        self.principal_amount - self.amount_paid
    }
}

impl Entity for Loan {
    const KIND: EntityKind = EntityKind::Loans;

    fn validate(&self) -> Result<(), LedgerError> {
        if self.borrower_name.trim().is_empty() {
            return Err(LedgerError::missing("borrower_name"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum InstallmentStatus {
    Collected,
    #[default]
    Pending,
    Overdue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallmentRecord {
    pub unit: String,
    pub customer: String,
    #[serde(default)]
    pub plan: String,
    #[serde(default)]
    pub unit_id: Option<Uuid>,
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    pub total_amount: Decimal,
    #[serde(default)]
    pub paid_amount: Decimal,
    #[serde(default)]
    pub next_due_at: Option<NaiveDate>,
    #[serde(default)]
    pub status: InstallmentStatus,
}

impl InstallmentRecord {
    pub fn balance(&self) -> Decimal {
        self.total_amount - self.paid_amount
    }
}

impl Entity for InstallmentRecord {
    const KIND: EntityKind = EntityKind::InstallmentRecords;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ProjectStatus {
    #[default]
    Active,
    #[serde(rename = "On Hold")]
    OnHold,
    Completed,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum BillingCycle {
    #[default]
    Monthly,
    Quarterly,
    Yearly,
    #[serde(rename = "One Time")]
    OneTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub revenue: Decimal,
    #[serde(default)]
    pub billing_cycle: Option<BillingCycle>,
    #[serde(default)]
    pub status: ProjectStatus,
}

impl Entity for Project {
    const KIND: EntityKind = EntityKind::Projects;

    fn validate(&self) -> Result<(), LedgerError> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::missing("name"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum QuotationStatus {
    #[default]
    Draft,
    Sent,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quotation {
    pub title: String,
    #[serde(default)]
    pub client_id: Option<Uuid>,
    #[serde(default)]
    pub project_id: Option<Uuid>,
    pub amount: Decimal,
    #[serde(default)]
    pub status: QuotationStatus,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub billing_cycle: Option<BillingCycle>,
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
}

impl Entity for Quotation {
    const KIND: EntityKind = EntityKind::Quotations;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DebitNoteStatus {
    #[default]
    Active,
    Settled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebitNote {
    pub supplier_id: Uuid,
    pub total_amount: Decimal,
    pub num_installments: u32,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub status: DebitNoteStatus,
}

impl Entity for DebitNote {
    const KIND: EntityKind = EntityKind::DebitNotes;

    fn validate(&self) -> Result<(), LedgerError> {
        if self.num_installments == 0 {
            return Err(LedgerError::Validation(
                "num_installments must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DebitNoteInstallmentStatus {
    #[default]
    Pending,
    Paid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebitNoteInstallment {
    pub debit_note_id: Uuid,
    pub sequence: u32,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub status: DebitNoteInstallmentStatus,
}

impl Entity for DebitNoteInstallment {
    const KIND: EntityKind = EntityKind::DebitNoteInstallments;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierPayment {
    pub supplier_id: Uuid,
    #[serde(default)]
    pub supplier_name: String,
    #[serde(default)]
    pub expense_id: Option<Uuid>,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub reference_no: String,
    #[serde(default)]
    pub status: String,
}

impl Entity for SupplierPayment {
    const KIND: EntityKind = EntityKind::SupplierPayments;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn project_keeps_free_form_status() {
        let project: Project =
            serde_json::from_value(json!({"name": "Marina", "status": "Planning"})).unwrap();
        assert_eq!(project.status, ProjectStatus::Other("Planning".to_string()));

        let project: Project =
            serde_json::from_value(json!({"name": "Marina", "status": "On Hold"})).unwrap();
        assert_eq!(project.status, ProjectStatus::OnHold);
    }
}
