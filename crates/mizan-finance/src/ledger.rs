use mizan_core::{InstallmentRecord, Loan, LoanStatus, StashTransaction};
use rust_decimal::Decimal;
use serde::Serialize;

/// Cash on hand: money in minus money out. Order of transactions is irrelevant.
pub fn stash_balance<'a, I>(transactions: I) -> Decimal
where
    I: IntoIterator<Item = &'a StashTransaction>,
{
    transactions
        .into_iter()
        .map(StashTransaction::signed_amount)
        .sum()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LoanSummary {
    pub active_count: usize,
    /// Σ (principal − paid) over active loans, unclamped.
    pub active_outstanding: Decimal,
    pub total_principal: Decimal,
    pub total_paid: Decimal,
}

pub fn loan_summary<'a, I>(loans: I) -> LoanSummary
where
    I: IntoIterator<Item = &'a Loan>,
{
    let mut summary = LoanSummary {
        active_count: 0,
        active_outstanding: Decimal::ZERO,
        total_principal: Decimal::ZERO,
        total_paid: Decimal::ZERO,
    };

    for loan in loans {
        summary.total_principal += loan.principal_amount;
        summary.total_paid += loan.amount_paid;
        if loan.status == LoanStatus::Active {
            summary.active_count += 1;
            summary.active_outstanding += loan.remaining();
        }
    }

    summary
}

pub fn installments_outstanding<'a, I>(records: I) -> Decimal
where
    I: IntoIterator<Item = &'a InstallmentRecord>,
{
    records.into_iter().map(InstallmentRecord::balance).sum()
}
