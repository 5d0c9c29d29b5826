mod common;

use std::sync::Arc;

use common::{FailingStore, context_over, date, memory_context};
use mizan_core::{
    BillingCycle, DebitNote, DebitNoteInstallment, DebitNoteInstallmentStatus, DebitNoteStatus,
    EmploymentType, EntityKind, Expense, Filter, InstallmentRecord, InstallmentStatus, LedgerError,
    Loan, LoanStatus, Project, ProjectStatus, Quotation, QuotationStatus, RecordStore, Staff,
    StashDirection, StashTransaction, SupplierPayment,
};
use mizan_finance::format_outstanding;
use mizan_store::InMemoryRecordStore;
use mizan_workflows::{CashWorkflow, ForecastWorkflow, SuppliersWorkflow};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

fn stash(amount: i64, direction: StashDirection) -> StashTransaction {
    StashTransaction {
        amount: Decimal::from(amount),
        direction,
        source: "office".to_string(),
        description: String::new(),
        date: date(2024, 4, 1),
        reference_type: "General".to_string(),
        reference_id: None,
    }
}

#[tokio::test]
async fn stash_balance_is_folded_on_read() {
    let (context, _store) = memory_context();
    let cash = CashWorkflow::new(&context);

    cash.record_stash(stash(5000, StashDirection::In)).await.unwrap();
    cash.record_stash(stash(1200, StashDirection::Out)).await.unwrap();
    cash.record_stash(stash(300, StashDirection::In)).await.unwrap();

    assert_eq!(cash.stash_balance().await.unwrap(), Decimal::from(4100));
}

#[tokio::test]
async fn concurrent_stash_appends_all_count() {
    let (context, _store) = memory_context();

    let mut handles = Vec::new();
    for n in 0..20 {
        let context = context.clone();
        handles.push(tokio::spawn(async move {
            let direction = if n % 4 == 0 {
                StashDirection::Out
            } else {
                StashDirection::In
            };
            CashWorkflow::new(&context)
                .record_stash(stash(100, direction))
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // 15 in, 5 out
    let balance = CashWorkflow::new(&context).stash_balance().await.unwrap();
    assert_eq!(balance, Decimal::from(1000));
}

#[tokio::test]
async fn paid_off_loan_displays_zero() {
    let (context, _store) = memory_context();
    let cash = CashWorkflow::new(&context);

    let loan = cash
        .save_loan(
            None,
            Loan {
                borrower_name: "Dot Story".to_string(),
                principal_amount: Decimal::from(20000),
                interest_rate: Decimal::ZERO,
                term_months: 12,
                start_date: date(2024, 1, 1),
                status: LoanStatus::PaidOff,
                amount_paid: Decimal::from(20000),
            },
        )
        .await
        .unwrap();
    assert_eq!(loan.remaining(), Decimal::ZERO);
    assert_eq!(format_outstanding(loan.remaining(), "EGP"), "0 EGP");

    cash.save_loan(
        None,
        Loan {
            borrower_name: "Crystal".to_string(),
            principal_amount: Decimal::from(10000),
            interest_rate: Decimal::ZERO,
            term_months: 6,
            start_date: date(2024, 2, 1),
            status: LoanStatus::Active,
            amount_paid: Decimal::from(4000),
        },
    )
    .await
    .unwrap();

    let summary = cash.loan_summary().await.unwrap();
    assert_eq!(summary.active_count, 1);
    assert_eq!(summary.active_outstanding, Decimal::from(6000));
}

#[tokio::test]
async fn installment_plans_report_outstanding_balance() {
    let (context, _store) = memory_context();
    let plans = context.repository::<InstallmentRecord>();
    for (total, paid, status) in [
        (1_500_000, 450_000, InstallmentStatus::Pending),
        (2_500_000, 2_500_000, InstallmentStatus::Collected),
    ] {
        plans
            .upsert(
                None,
                &InstallmentRecord {
                    unit: "Apt 4B".to_string(),
                    customer: "Sameh Kamel".to_string(),
                    plan: "Standard".to_string(),
                    unit_id: None,
                    customer_id: None,
                    total_amount: Decimal::from(total),
                    paid_amount: Decimal::from(paid),
                    next_due_at: None,
                    status,
                },
            )
            .await
            .unwrap();
    }

    let outstanding = CashWorkflow::new(&context)
        .installments_outstanding()
        .await
        .unwrap();
    assert_eq!(outstanding, Decimal::from(1_050_000));
}

#[tokio::test]
async fn supplier_payment_links_to_its_expense() {
    let (context, _store) = memory_context();
    let recorded = SuppliersWorkflow::new(&context)
        .record_payment(
            SupplierPayment {
                supplier_id: Uuid::new_v4(),
                supplier_name: "Delta Steel".to_string(),
                expense_id: None,
                amount: Decimal::from(4200),
                payment_date: date(2024, 6, 3),
                payment_method: "Bank Transfer".to_string(),
                reference_no: "TRX-77".to_string(),
                status: String::new(),
            },
            "rebar batch 3",
        )
        .await
        .unwrap();

    let payment = context
        .repository::<SupplierPayment>()
        .require(recorded.payment_id)
        .await
        .unwrap();
    assert_eq!(payment.expense_id, Some(recorded.expense_id));
    assert_eq!(payment.status, "Completed");

    let expense = context
        .repository::<Expense>()
        .require(recorded.expense_id)
        .await
        .unwrap();
    assert_eq!(expense.category, "Cost of Goods Sold");
    assert_eq!(
        expense.description,
        "Payment to supplier Delta Steel. Ref: TRX-77. rebar batch 3"
    );
}

#[tokio::test]
async fn failed_payment_write_books_no_expense() {
    let store = Arc::new(FailingStore {
        inner: InMemoryRecordStore::new(),
        poisoned: EntityKind::SupplierPayments,
    });
    let context = context_over(store);

    let err = SuppliersWorkflow::new(&context)
        .record_payment(
            SupplierPayment {
                supplier_id: Uuid::new_v4(),
                supplier_name: "Delta Steel".to_string(),
                expense_id: None,
                amount: Decimal::from(4200),
                payment_date: date(2024, 6, 3),
                payment_method: "Cash".to_string(),
                reference_no: String::new(),
                status: String::new(),
            },
            "",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Store(_)));
    assert!(context.repository::<Expense>().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_schedule_write_leaves_no_debit_note() {
    let store = Arc::new(FailingStore {
        inner: InMemoryRecordStore::new(),
        poisoned: EntityKind::DebitNoteInstallments,
    });
    let context = context_over(store);

    let err = SuppliersWorkflow::new(&context)
        .create_debit_note(DebitNote {
            supplier_id: Uuid::new_v4(),
            total_amount: Decimal::from(1000),
            num_installments: 4,
            description: "returned rebar".to_string(),
            start_date: date(2024, 1, 15),
            status: DebitNoteStatus::Active,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Store(_)));
    assert!(context.repository::<DebitNote>().list().await.unwrap().is_empty());
    assert!(
        context
            .repository::<DebitNoteInstallment>()
            .list()
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn debit_note_schedules_and_settles() {
    let (context, _store) = memory_context();
    let suppliers = SuppliersWorkflow::new(&context);

    let created = suppliers
        .create_debit_note(DebitNote {
            supplier_id: Uuid::new_v4(),
            total_amount: Decimal::from(1000),
            num_installments: 3,
            description: "steel credit".to_string(),
            start_date: date(2024, 1, 15),
            status: DebitNoteStatus::Settled,
        })
        .await
        .unwrap();
    assert_eq!(created.installments.len(), 3);
    assert!(created.installments.iter().all(|i| i.amount == Decimal::from(333)));

    let note = context
        .repository::<DebitNote>()
        .require(created.debit_note_id)
        .await
        .unwrap();
    assert_eq!(note.status, DebitNoteStatus::Active);

    let schedule = context
        .repository::<DebitNoteInstallment>()
        .list_where(&Filter::all().eq("debit_note_id", created.debit_note_id.to_string()))
        .await
        .unwrap();
    assert_eq!(schedule.len(), 3);

    let mut last = None;
    for entry in &schedule {
        last = Some(suppliers.pay_installment(entry.id).await.unwrap());
    }
    let last = last.unwrap();
    assert_eq!(last.note_status, DebitNoteStatus::Settled);

    let note = context
        .repository::<DebitNote>()
        .require(created.debit_note_id)
        .await
        .unwrap();
    assert_eq!(note.status, DebitNoteStatus::Settled);
    let paid = context
        .repository::<DebitNoteInstallment>()
        .list_where(
            &Filter::all()
                .eq_serialized("status", &DebitNoteInstallmentStatus::Paid)
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(paid.len(), 3);
}

#[tokio::test]
async fn debit_note_without_installments_is_rejected() {
    let (context, _store) = memory_context();
    let err = SuppliersWorkflow::new(&context)
        .create_debit_note(DebitNote {
            supplier_id: Uuid::new_v4(),
            total_amount: Decimal::from(1000),
            num_installments: 0,
            description: String::new(),
            start_date: date(2024, 1, 15),
            status: DebitNoteStatus::Active,
        })
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert!(context.repository::<DebitNote>().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn forecast_reads_current_tenant_data() {
    let (context, _store) = memory_context();
    context
        .repository::<Project>()
        .upsert(
            None,
            &Project {
                name: "Marina".to_string(),
                revenue: Decimal::from(120_000),
                billing_cycle: Some(BillingCycle::Monthly),
                status: ProjectStatus::Active,
            },
        )
        .await
        .unwrap();
    context
        .repository::<Quotation>()
        .upsert(
            None,
            &Quotation {
                title: "Facility management".to_string(),
                client_id: None,
                project_id: None,
                amount: Decimal::from(2_000),
                status: QuotationStatus::Accepted,
                is_recurring: true,
                billing_cycle: Some(BillingCycle::Monthly),
                valid_until: None,
            },
        )
        .await
        .unwrap();
    context
        .repository::<Staff>()
        .upsert(
            None,
            &Staff {
                full_name: "Nadia Ali".to_string(),
                role: String::new(),
                employment_type: EmploymentType::FullTime,
                base_salary: Decimal::from(7_000),
                daily_rate: Decimal::ZERO,
                penalties: Decimal::ZERO,
                vacations: 0,
                project_id: None,
                hire_date: None,
                email: None,
                status: "Active".to_string(),
            },
        )
        .await
        .unwrap();
    context
        .repository::<Expense>()
        .upsert(
            None,
            &Expense {
                category: "Rent".to_string(),
                subcategory: None,
                amount: Decimal::from(3_000),
                date: date(2024, 1, 1),
                description: String::new(),
                payment_method: None,
                receipt_url: None,
                approved: true,
                project_id: None,
                unit_id: None,
                branch_id: None,
            },
        )
        .await
        .unwrap();

    let forecast = ForecastWorkflow::new(&context)
        .forecast(date(2024, 6, 10))
        .await
        .unwrap();
    assert_eq!(forecast.months.len(), 12);
    assert_eq!(forecast.months[0].label, "Jun 2024");
    assert_eq!(forecast.months[0].income, Decimal::from(12_000));
    assert_eq!(forecast.months[0].expense, Decimal::from(10_000));
    assert_eq!(forecast.months[0].profit, Decimal::from(2_000));
}

#[tokio::test]
async fn forecast_reads_rows_with_unlisted_labels() {
    let (context, store) = memory_context();
    let tenant = context.tenant();
    store
        .upsert(
            tenant,
            EntityKind::Staff,
            None,
            json!({"full_name": "Omar Said", "employment_type": "Temporary", "base_salary": "4000"}),
        )
        .await
        .unwrap();
    store
        .upsert(
            tenant,
            EntityKind::Projects,
            None,
            json!({"name": "Dunes", "revenue": "24000", "billing_cycle": "Monthly", "status": "Planning"}),
        )
        .await
        .unwrap();

    let forecast = ForecastWorkflow::new(&context)
        .forecast(date(2024, 6, 10))
        .await
        .unwrap();
    assert_eq!(forecast.months[0].income, Decimal::from(2_000));
    assert_eq!(forecast.months[0].expense, Decimal::from(4_000));
}
