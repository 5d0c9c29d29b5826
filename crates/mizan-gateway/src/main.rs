use std::{net::SocketAddr, sync::Arc};

use anyhow::Result as AnyResult;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use chrono::{NaiveDate, Utc};
use mizan_core::{
    Customer, DebitNote, DebitNoteInstallment, EgpProfile, Entity, EntityKind, Expense,
    InstallmentRecord, LedgerError, Loan, LoanStatus, PayrollContract, PostingProfile, Project,
    PropertyUnit, PurchaseOrder, Quotation, RecordChanged, RecordStore, SalaryAdvance,
    SalaryRegister, SalarySlip, SalesInvoice, Staff, StashTransaction, StoreError, Stored,
    StoredRecord, SupplierPayment, TenantId,
};
use mizan_finance::{Forecast, LoanSummary, format_money, format_outstanding};
use mizan_platform::{
    AdvanceStatusRequest, CompleteSaleRequest, ForecastQuery, RecordsQuery, RedisBus, RemovedResponse,
    SalaryPaymentRequest, ServiceConfig, StaffPaymentRequest, SupplierPaymentRequest,
    UpsertRecordRequest, build_record_store,
};
use mizan_workflows::{
    CashWorkflow, DebitNoteCreated, ForecastWorkflow, InstallmentPaid, LedgerContext, OrderSaved,
    PayrollWorkflow, PurchasingWorkflow, SalaryPaymentOutcome, SaleCompleted, SaleCustomer,
    SaleOrder, SalesWorkflow, SlipOutcome, StaffPayOutcome, SupplierPaymentRecorded,
    SuppliersWorkflow,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

/// Expands `$body` once per entity table with `$entity` bound to its record type.
macro_rules! for_entity {
    ($kind:expr, |$entity:ident| $body:expr) => {
        match $kind {
            EntityKind::Staff => {
                type $entity = Staff;
                $body
            }
            EntityKind::SalaryRegisters => {
                type $entity = SalaryRegister;
                $body
            }
            EntityKind::PayrollContracts => {
                type $entity = PayrollContract;
                $body
            }
            EntityKind::SalaryAdvances => {
                type $entity = SalaryAdvance;
                $body
            }
            EntityKind::SalarySlips => {
                type $entity = SalarySlip;
                $body
            }
            EntityKind::PurchaseOrders => {
                type $entity = PurchaseOrder;
                $body
            }
            EntityKind::Expenses => {
                type $entity = Expense;
                $body
            }
            EntityKind::InstallmentRecords => {
                type $entity = InstallmentRecord;
                $body
            }
            EntityKind::Loans => {
                type $entity = Loan;
                $body
            }
            EntityKind::StashTransactions => {
                type $entity = StashTransaction;
                $body
            }
            EntityKind::Projects => {
                type $entity = Project;
                $body
            }
            EntityKind::Quotations => {
                type $entity = Quotation;
                $body
            }
            EntityKind::DebitNotes => {
                type $entity = DebitNote;
                $body
            }
            EntityKind::DebitNoteInstallments => {
                type $entity = DebitNoteInstallment;
                $body
            }
            EntityKind::SupplierPayments => {
                type $entity = SupplierPayment;
                $body
            }
            EntityKind::Customers => {
                type $entity = Customer;
                $body
            }
            EntityKind::Units => {
                type $entity = PropertyUnit;
                $body
            }
            EntityKind::SalesInvoices => {
                type $entity = SalesInvoice;
                $body
            }
        }
    };
}

#[derive(Clone)]
struct AppState {
    store: Arc<dyn RecordStore>,
    profile: Arc<dyn PostingProfile>,
    bus: Option<RedisBus>,
}

impl AppState {
    fn ledger(&self, tenant: TenantId) -> LedgerContext {
        LedgerContext::new(Arc::clone(&self.store), tenant, Arc::clone(&self.profile))
    }

    /// Best effort: the writes are already committed when this runs.
    async fn notify(&self, changes: Vec<RecordChanged>) {
        let Some(bus) = &self.bus else {
            return;
        };
        if let Err(err) = bus.publish_changes(&changes).await {
            error!("failed to publish record changes: {err}");
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct StashBalanceView {
    balance: Decimal,
    display: String,
}

#[derive(Debug, Clone, Serialize)]
struct LoanRow {
    id: Uuid,
    borrower_name: String,
    status: LoanStatus,
    remaining: Decimal,
    remaining_display: String,
}

#[derive(Debug, Clone, Serialize)]
struct LoansSummaryView {
    #[serde(flatten)]
    summary: LoanSummary,
    outstanding_display: String,
    installments_outstanding: Decimal,
    loans: Vec<LoanRow>,
}

#[tokio::main]
async fn main() -> AnyResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| {
            "mizan_gateway=info,mizan_workflows=info,mizan_store=info".to_string()
        }))
        .init();

    let config = ServiceConfig::from_env("0.0.0.0:8080")?;
    let store = build_record_store(&config).await?;
    let bus = config
        .redis_url
        .as_deref()
        .map(RedisBus::connect)
        .transpose()?;
    let profile: Arc<dyn PostingProfile> =
        Arc::new(EgpProfile::with_currency(config.currency.clone()));

    if let Some(bus) = &bus {
        bus.spawn_follower(Arc::clone(&store));
    }

    let state = AppState {
        store,
        profile,
        bus,
    };

    let addr: SocketAddr = config.http_addr.parse()?;
    info!("gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/tenants/{tenant}/records/{kind}",
            get(list_records).post(upsert_record),
        )
        .route(
            "/tenants/{tenant}/records/{kind}/refresh",
            post(refresh_records),
        )
        .route(
            "/tenants/{tenant}/records/{kind}/{record_id}",
            delete(remove_record),
        )
        .route(
            "/tenants/{tenant}/payroll/registers/{register_id}/payments",
            post(process_salary_payment),
        )
        .route(
            "/tenants/{tenant}/payroll/registers/{register_id}/slips",
            post(generate_salary_slip),
        )
        .route(
            "/tenants/{tenant}/payroll/advances/{advance_id}/status",
            post(set_advance_status),
        )
        .route(
            "/tenants/{tenant}/payroll/staff/{staff_id}/payments",
            post(pay_staff),
        )
        .route("/tenants/{tenant}/purchasing/orders", post(create_order))
        .route(
            "/tenants/{tenant}/purchasing/orders/{order_id}",
            post(update_order).put(update_order),
        )
        .route("/tenants/{tenant}/sales", post(complete_sale))
        .route("/tenants/{tenant}/stash/transactions", post(record_stash))
        .route("/tenants/{tenant}/stash/balance", get(stash_balance))
        .route("/tenants/{tenant}/loans/summary", get(loans_summary))
        .route("/tenants/{tenant}/forecast", get(forecast))
        .route(
            "/tenants/{tenant}/suppliers/payments",
            post(record_supplier_payment),
        )
        .route(
            "/tenants/{tenant}/suppliers/debit-notes",
            post(create_debit_note),
        )
        .route(
            "/tenants/{tenant}/suppliers/debit-notes/installments/{installment_id}/pay",
            post(pay_debit_note_installment),
        )
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn list_records(
    State(state): State<AppState>,
    Path((tenant, kind)): Path<(TenantId, String)>,
    Query(query): Query<RecordsQuery>,
) -> Result<Json<Vec<StoredRecord>>, (StatusCode, String)> {
    let kind = kind.parse::<EntityKind>().map_err(ledger_error)?;
    let rows = state
        .store
        .list(tenant, kind, &query.to_filter())
        .await
        .map_err(|err| ledger_error(err.into()))?;

    Ok(Json(rows))
}

async fn upsert_record(
    State(state): State<AppState>,
    Path((tenant, kind)): Path<(TenantId, String)>,
    Json(payload): Json<UpsertRecordRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, String)> {
    let kind = kind.parse::<EntityKind>().map_err(ledger_error)?;
    let ledger = state.ledger(tenant);
    let status = if payload.id.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    // Completing an order books its purchase, so orders take the workflow path.
    if kind == EntityKind::PurchaseOrders {
        let order = ledger
            .repository::<PurchaseOrder>()
            .patched(payload.id, payload.body)
            .await
            .map_err(ledger_error)?;
        let saved = save_order(&state, tenant, payload.id, order).await?;
        let saved = serde_json::to_value(&saved)
            .map_err(|err| ledger_error(StoreError::from(err).into()))?;
        return Ok((status, Json(saved)));
    }

    let (record_id, saved) = for_entity!(kind, |E| {
        upsert_as::<E>(&ledger, payload.id, payload.body).await
    })
    .map_err(ledger_error)?;

    state
        .notify(vec![RecordChanged::upserted(tenant, kind, record_id)])
        .await;

    Ok((status, Json(saved)))
}

async fn upsert_as<T: Entity>(
    ledger: &LedgerContext,
    id: Option<Uuid>,
    body: Value,
) -> Result<(Uuid, Value), LedgerError> {
    let stored = ledger.repository::<T>().upsert_json(id, body).await?;
    let value = serde_json::to_value(&stored).map_err(StoreError::from)?;
    Ok((stored.id, value))
}

async fn remove_record(
    State(state): State<AppState>,
    Path((tenant, kind, record_id)): Path<(TenantId, String, Uuid)>,
) -> Result<Json<RemovedResponse>, (StatusCode, String)> {
    let kind = kind.parse::<EntityKind>().map_err(ledger_error)?;
    let removed = state.store.remove(tenant, kind, record_id).await;
    if removed {
        state
            .notify(vec![RecordChanged::removed(tenant, kind, record_id)])
            .await;
    }

    Ok(Json(RemovedResponse {
        id: record_id,
        removed,
    }))
}

async fn refresh_records(
    State(state): State<AppState>,
    Path((tenant, kind)): Path<(TenantId, String)>,
) -> Result<StatusCode, (StatusCode, String)> {
    let kind = kind.parse::<EntityKind>().map_err(ledger_error)?;
    state
        .store
        .refresh(tenant, kind)
        .await
        .map_err(|err| ledger_error(err.into()))?;

    Ok(StatusCode::NO_CONTENT)
}

async fn process_salary_payment(
    State(state): State<AppState>,
    Path((tenant, register_id)): Path<(TenantId, Uuid)>,
    Json(payload): Json<SalaryPaymentRequest>,
) -> Result<(StatusCode, Json<SalaryPaymentOutcome>), (StatusCode, String)> {
    let ledger = state.ledger(tenant);
    let amount = match payload.amount {
        Some(amount) => amount,
        None => ledger
            .repository::<SalaryRegister>()
            .require(register_id)
            .await
            .map_err(ledger_error)?
            .outstanding(),
    };
    let outcome = PayrollWorkflow::new(&ledger)
        .process_payment(register_id, amount, payload.paid_on.unwrap_or_else(today))
        .await
        .map_err(ledger_error)?;

    state
        .notify(vec![
            RecordChanged::upserted(tenant, EntityKind::SalaryRegisters, register_id),
            RecordChanged::upserted(tenant, EntityKind::Expenses, outcome.expense_id),
        ])
        .await;

    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn generate_salary_slip(
    State(state): State<AppState>,
    Path((tenant, register_id)): Path<(TenantId, Uuid)>,
) -> Result<(StatusCode, Json<SlipOutcome>), (StatusCode, String)> {
    let outcome = PayrollWorkflow::new(&state.ledger(tenant))
        .generate_slip(register_id)
        .await
        .map_err(ledger_error)?;

    state
        .notify(vec![
            RecordChanged::upserted(tenant, EntityKind::SalarySlips, outcome.slip_id),
            RecordChanged::upserted(tenant, EntityKind::SalaryRegisters, register_id),
        ])
        .await;

    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn set_advance_status(
    State(state): State<AppState>,
    Path((tenant, advance_id)): Path<(TenantId, Uuid)>,
    Json(payload): Json<AdvanceStatusRequest>,
) -> Result<Json<Stored<SalaryAdvance>>, (StatusCode, String)> {
    let advance = PayrollWorkflow::new(&state.ledger(tenant))
        .set_advance_status(advance_id, payload.status)
        .await
        .map_err(ledger_error)?;

    state
        .notify(vec![RecordChanged::upserted(
            tenant,
            EntityKind::SalaryAdvances,
            advance_id,
        )])
        .await;

    Ok(Json(advance))
}

async fn pay_staff(
    State(state): State<AppState>,
    Path((tenant, staff_id)): Path<(TenantId, Uuid)>,
    Json(payload): Json<StaffPaymentRequest>,
) -> Result<(StatusCode, Json<StaffPayOutcome>), (StatusCode, String)> {
    let outcome = PayrollWorkflow::new(&state.ledger(tenant))
        .pay_staff(
            staff_id,
            payload.days_worked,
            payload.paid_on.unwrap_or_else(today),
        )
        .await
        .map_err(ledger_error)?;

    state
        .notify(vec![
            RecordChanged::upserted(tenant, EntityKind::Staff, staff_id),
            RecordChanged::upserted(tenant, EntityKind::Expenses, outcome.expense_id),
        ])
        .await;

    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn create_order(
    State(state): State<AppState>,
    Path(tenant): Path<TenantId>,
    Json(order): Json<PurchaseOrder>,
) -> Result<(StatusCode, Json<OrderSaved>), (StatusCode, String)> {
    let saved = save_order(&state, tenant, None, order).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn update_order(
    State(state): State<AppState>,
    Path((tenant, order_id)): Path<(TenantId, Uuid)>,
    Json(order): Json<PurchaseOrder>,
) -> Result<Json<OrderSaved>, (StatusCode, String)> {
    let saved = save_order(&state, tenant, Some(order_id), order).await?;
    Ok(Json(saved))
}

async fn save_order(
    state: &AppState,
    tenant: TenantId,
    order_id: Option<Uuid>,
    order: PurchaseOrder,
) -> Result<OrderSaved, (StatusCode, String)> {
    let saved = PurchasingWorkflow::new(&state.ledger(tenant))
        .save_order(order_id, order)
        .await
        .map_err(ledger_error)?;

    let mut changes = vec![RecordChanged::upserted(
        tenant,
        EntityKind::PurchaseOrders,
        saved.order_id,
    )];
    if let Some(expense_id) = saved.expense_id {
        changes.push(RecordChanged::upserted(
            tenant,
            EntityKind::Expenses,
            expense_id,
        ));
    }
    state.notify(changes).await;

    Ok(saved)
}

async fn complete_sale(
    State(state): State<AppState>,
    Path(tenant): Path<TenantId>,
    Json(payload): Json<CompleteSaleRequest>,
) -> Result<(StatusCode, Json<SaleCompleted>), (StatusCode, String)> {
    let customer = match (payload.customer_id, payload.customer) {
        (Some(customer_id), _) => SaleCustomer::Existing(customer_id),
        (None, Some(customer)) => SaleCustomer::New(customer),
        (None, None) => return Err(ledger_error(LedgerError::missing("customer"))),
    };
    let completed = SalesWorkflow::new(&state.ledger(tenant))
        .complete_sale(SaleOrder {
            customer,
            unit_id: payload.unit_id,
            plan: payload.plan,
            sold_on: payload.sold_on.unwrap_or_else(today),
        })
        .await
        .map_err(ledger_error)?;

    let mut changes = vec![
        RecordChanged::upserted(tenant, EntityKind::SalesInvoices, completed.invoice_id),
        RecordChanged::upserted(tenant, EntityKind::Units, completed.unit_id),
    ];
    if completed.customer_created {
        changes.push(RecordChanged::upserted(
            tenant,
            EntityKind::Customers,
            completed.customer_id,
        ));
    }
    if let Some(installment_id) = completed.installment_id {
        changes.push(RecordChanged::upserted(
            tenant,
            EntityKind::InstallmentRecords,
            installment_id,
        ));
    }
    state.notify(changes).await;

    Ok((StatusCode::CREATED, Json(completed)))
}

async fn record_stash(
    State(state): State<AppState>,
    Path(tenant): Path<TenantId>,
    Json(transaction): Json<StashTransaction>,
) -> Result<(StatusCode, Json<Stored<StashTransaction>>), (StatusCode, String)> {
    let stored = CashWorkflow::new(&state.ledger(tenant))
        .record_stash(transaction)
        .await
        .map_err(ledger_error)?;

    state
        .notify(vec![RecordChanged::upserted(
            tenant,
            EntityKind::StashTransactions,
            stored.id,
        )])
        .await;

    Ok((StatusCode::CREATED, Json(stored)))
}

async fn stash_balance(
    State(state): State<AppState>,
    Path(tenant): Path<TenantId>,
) -> Result<Json<StashBalanceView>, (StatusCode, String)> {
    let balance = CashWorkflow::new(&state.ledger(tenant))
        .stash_balance()
        .await
        .map_err(ledger_error)?;

    Ok(Json(StashBalanceView {
        balance,
        display: format_money(balance, state.profile.currency()),
    }))
}

async fn loans_summary(
    State(state): State<AppState>,
    Path(tenant): Path<TenantId>,
) -> Result<Json<LoansSummaryView>, (StatusCode, String)> {
    let cash = CashWorkflow::new(&state.ledger(tenant));
    let summary = cash.loan_summary().await.map_err(ledger_error)?;
    let installments_outstanding = cash
        .installments_outstanding()
        .await
        .map_err(ledger_error)?;
    let currency = state.profile.currency();
    let loans = cash
        .loans()
        .await
        .map_err(ledger_error)?
        .into_iter()
        .map(|stored| {
            let remaining = stored.remaining();
            LoanRow {
                id: stored.id,
                remaining_display: format_outstanding(remaining, currency),
                remaining,
                borrower_name: stored.record.borrower_name,
                status: stored.record.status,
            }
        })
        .collect();

    Ok(Json(LoansSummaryView {
        outstanding_display: format_money(summary.active_outstanding, currency),
        summary,
        installments_outstanding,
        loans,
    }))
}

async fn forecast(
    State(state): State<AppState>,
    Path(tenant): Path<TenantId>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<Forecast>, (StatusCode, String)> {
    let forecast = ForecastWorkflow::new(&state.ledger(tenant))
        .forecast(query.today.unwrap_or_else(today))
        .await
        .map_err(ledger_error)?;

    Ok(Json(forecast))
}

async fn record_supplier_payment(
    State(state): State<AppState>,
    Path(tenant): Path<TenantId>,
    Json(payload): Json<SupplierPaymentRequest>,
) -> Result<(StatusCode, Json<SupplierPaymentRecorded>), (StatusCode, String)> {
    let recorded = SuppliersWorkflow::new(&state.ledger(tenant))
        .record_payment(payload.payment, &payload.memo)
        .await
        .map_err(ledger_error)?;

    state
        .notify(vec![
            RecordChanged::upserted(tenant, EntityKind::Expenses, recorded.expense_id),
            RecordChanged::upserted(tenant, EntityKind::SupplierPayments, recorded.payment_id),
        ])
        .await;

    Ok((StatusCode::CREATED, Json(recorded)))
}

async fn create_debit_note(
    State(state): State<AppState>,
    Path(tenant): Path<TenantId>,
    Json(note): Json<DebitNote>,
) -> Result<(StatusCode, Json<DebitNoteCreated>), (StatusCode, String)> {
    let created = SuppliersWorkflow::new(&state.ledger(tenant))
        .create_debit_note(note)
        .await
        .map_err(ledger_error)?;

    state
        .notify(vec![RecordChanged::upserted(
            tenant,
            EntityKind::DebitNotes,
            created.debit_note_id,
        )])
        .await;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn pay_debit_note_installment(
    State(state): State<AppState>,
    Path((tenant, installment_id)): Path<(TenantId, Uuid)>,
) -> Result<Json<InstallmentPaid>, (StatusCode, String)> {
    let paid = SuppliersWorkflow::new(&state.ledger(tenant))
        .pay_installment(installment_id)
        .await
        .map_err(ledger_error)?;

    state
        .notify(vec![
            RecordChanged::upserted(tenant, EntityKind::DebitNoteInstallments, installment_id),
            RecordChanged::upserted(tenant, EntityKind::DebitNotes, paid.debit_note_id),
        ])
        .await;

    Ok(Json(paid))
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn ledger_error(err: LedgerError) -> (StatusCode, String) {
    match err {
        LedgerError::Validation(message) => (StatusCode::BAD_REQUEST, message),
        LedgerError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        LedgerError::Store(err @ StoreError::Conflict { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        LedgerError::Store(err) => {
            error!("record store failure: {err}");
            internal_error(err)
        }
    }
}

fn internal_error<E: std::fmt::Display>(err: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}
