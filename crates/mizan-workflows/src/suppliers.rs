use mizan_core::{
    DebitNote, DebitNoteInstallment, DebitNoteInstallmentStatus, DebitNoteStatus, Filter,
    LedgerError, Repository, SupplierPayment,
};
use mizan_finance::{debit_note_installments, debit_note_status, supplier_payment_expense};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::LedgerContext;

#[derive(Debug, Clone, Serialize)]
pub struct SupplierPaymentRecorded {
    pub payment_id: Uuid,
    pub expense_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct DebitNoteCreated {
    pub debit_note_id: Uuid,
    pub installments: Vec<DebitNoteInstallment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallmentPaid {
    pub installment_id: Uuid,
    pub debit_note_id: Uuid,
    pub note_status: DebitNoteStatus,
}

pub struct SuppliersWorkflow {
    context: LedgerContext,
    notes: Repository<DebitNote>,
    installments: Repository<DebitNoteInstallment>,
}

impl SuppliersWorkflow {
    pub fn new(context: &LedgerContext) -> Self {
        Self {
            context: context.clone(),
            notes: context.repository(),
            installments: context.repository(),
        }
    }

    /// Books the expense first and links the payment row to it, in one commit.
    pub async fn record_payment(
        &self,
        payment: SupplierPayment,
        memo: &str,
    ) -> Result<SupplierPaymentRecorded, LedgerError> {
        let expense = supplier_payment_expense(&payment, memo, self.context.profile());

        let mut unit = self.context.unit_of_work();
        let expense_id = unit.stage(None, &expense)?;
        let payment = SupplierPayment {
            expense_id: Some(expense_id),
            status: "Completed".to_string(),
            ..payment
        };
        let payment_id = unit.stage(None, &payment)?;
        unit.commit().await?;

        info!(
            "supplier payment {payment_id} of {} booked as expense {expense_id}",
            payment.amount
        );

        Ok(SupplierPaymentRecorded {
            payment_id,
            expense_id,
        })
    }

    /// Creates a debit note together with its monthly installment schedule.
    pub async fn create_debit_note(&self, note: DebitNote) -> Result<DebitNoteCreated, LedgerError> {
        let note = DebitNote {
            status: DebitNoteStatus::Active,
            ..note
        };

        let mut unit = self.context.unit_of_work();
        let debit_note_id = unit.stage(None, &note)?;
        let installments = debit_note_installments(
            debit_note_id,
            note.total_amount,
            note.num_installments,
            note.start_date,
        )?;
        for installment in &installments {
            unit.stage(None, installment)?;
        }
        unit.commit().await?;

        info!(
            "debit note {debit_note_id} scheduled over {} installments",
            installments.len()
        );

        Ok(DebitNoteCreated {
            debit_note_id,
            installments,
        })
    }

    /// Marks one installment paid and settles the note when nothing is left.
    pub async fn pay_installment(&self, installment_id: Uuid) -> Result<InstallmentPaid, LedgerError> {
        let installment = self.installments.require(installment_id).await?;
        let debit_note_id = installment.debit_note_id;
        let note = self.notes.require(debit_note_id).await?;

        let by_note = Filter::all().eq_serialized("debit_note_id", &debit_note_id)?;
        let schedule: Vec<DebitNoteInstallment> = self
            .installments
            .list_where(&by_note)
            .await?
            .into_iter()
            .map(|stored| {
                let mut entry = stored.record;
                if stored.id == installment_id {
                    entry.status = DebitNoteInstallmentStatus::Paid;
                }
                entry
            })
            .collect();
        let note_status = debit_note_status(&schedule);

        let mut unit = self.context.unit_of_work();
        unit.stage(
            Some(installment_id),
            &DebitNoteInstallment {
                status: DebitNoteInstallmentStatus::Paid,
                ..installment.record
            },
        )?;
        if note_status != note.status {
            unit.stage(
                Some(debit_note_id),
                &DebitNote {
                    status: note_status,
                    ..note.record
                },
            )?;
        }
        unit.commit().await?;

        info!("debit note installment {installment_id} paid, note {debit_note_id} {note_status:?}");

        Ok(InstallmentPaid {
            installment_id,
            debit_note_id,
            note_status,
        })
    }
}
