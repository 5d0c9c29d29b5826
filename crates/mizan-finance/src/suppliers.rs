use chrono::{Months, NaiveDate};
use mizan_core::{
    DebitNoteInstallment, DebitNoteInstallmentStatus, DebitNoteStatus, Expense, LedgerError,
    PostingProfile, SupplierPayment,
};
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

/// Monthly schedule for a debit note: `count` equal installments of
/// `round(total / count)`, the first due on `start_date`.
///
/// Due days past the end of a shorter month fall on its last day.
pub fn debit_note_installments(
    debit_note_id: Uuid,
    total_amount: Decimal,
    count: u32,
    start_date: NaiveDate,
) -> Result<Vec<DebitNoteInstallment>, LedgerError> {
    if count == 0 {
        return Err(LedgerError::Validation(
            "num_installments must be at least 1".to_string(),
        ));
    }

    let amount = (total_amount / Decimal::from(count))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    (0..count)
        .map(|offset| {
            let due_date = start_date
                .checked_add_months(Months::new(offset))
                .ok_or_else(|| {
                    LedgerError::Validation(format!("installment {} is out of range", offset + 1))
                })?;
            Ok(DebitNoteInstallment {
                debit_note_id,
                sequence: offset + 1,
                amount,
                due_date,
                status: DebitNoteInstallmentStatus::Pending,
            })
        })
        .collect()
}

/// A note is settled once it has installments and every one of them is paid.
pub fn debit_note_status(installments: &[DebitNoteInstallment]) -> DebitNoteStatus {
    let all_paid = installments
        .iter()
        .all(|installment| installment.status == DebitNoteInstallmentStatus::Paid);
    if !installments.is_empty() && all_paid {
        DebitNoteStatus::Settled
    } else {
        DebitNoteStatus::Active
    }
}

/// Expense booked for a supplier payment.
pub fn supplier_payment_expense(
    payment: &SupplierPayment,
    memo: &str,
    profile: &dyn PostingProfile,
) -> Expense {
    let supplier = if payment.supplier_name.trim().is_empty() {
        "unknown"
    } else {
        payment.supplier_name.trim()
    };
    let description = format!(
        "Payment to supplier {supplier}. Ref: {}. {}",
        payment.reference_no,
        memo.trim()
    );

    Expense {
        category: profile.expense_categories().supplier_payments,
        subcategory: None,
        amount: payment.amount,
        date: payment.payment_date,
        description: description.trim_end().to_string(),
        payment_method: Some(payment.payment_method.clone()),
        receipt_url: None,
        approved: true,
        project_id: None,
        unit_id: None,
        branch_id: None,
    }
}
