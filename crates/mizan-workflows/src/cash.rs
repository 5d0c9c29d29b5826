use mizan_core::{InstallmentRecord, LedgerError, Loan, Repository, StashTransaction, Stored};
use mizan_finance::{LoanSummary, installments_outstanding, loan_summary, stash_balance};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::LedgerContext;

/// Cash-on-hand, loans and customer installment plans.
pub struct CashWorkflow {
    stash: Repository<StashTransaction>,
    loans: Repository<Loan>,
    installments: Repository<InstallmentRecord>,
}

impl CashWorkflow {
    pub fn new(context: &LedgerContext) -> Self {
        Self {
            stash: context.repository(),
            loans: context.repository(),
            installments: context.repository(),
        }
    }

    /// Appends a stash movement. The balance is never stored.
    pub async fn record_stash(
        &self,
        transaction: StashTransaction,
    ) -> Result<Stored<StashTransaction>, LedgerError> {
        let stored = self.stash.upsert(None, &transaction).await?;
        info!(
            "stash {:?} {} recorded as {}",
            transaction.direction, transaction.amount, stored.id
        );
        Ok(stored)
    }

    pub async fn stash_balance(&self) -> Result<Decimal, LedgerError> {
        let transactions = self.stash.list().await?;
        Ok(stash_balance(transactions.iter().map(|stored| &stored.record)))
    }

    pub async fn save_loan(
        &self,
        loan_id: Option<Uuid>,
        loan: Loan,
    ) -> Result<Stored<Loan>, LedgerError> {
        self.loans.upsert(loan_id, &loan).await
    }

    pub async fn loans(&self) -> Result<Vec<Stored<Loan>>, LedgerError> {
        self.loans.list().await
    }

    pub async fn loan_summary(&self) -> Result<LoanSummary, LedgerError> {
        let loans = self.loans.list().await?;
        Ok(loan_summary(loans.iter().map(|stored| &stored.record)))
    }

    pub async fn installments_outstanding(&self) -> Result<Decimal, LedgerError> {
        let records = self.installments.list().await?;
        Ok(installments_outstanding(
            records.iter().map(|stored| &stored.record),
        ))
    }
}
