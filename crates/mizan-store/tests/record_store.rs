use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use chrono::NaiveDate;
use mizan_core::{
    EntityKind, Filter, Loan, LoanStatus, Precondition, RecordStore, RecordWrite, Repository,
    StoreError, StoredRecord, TenantId,
};
use mizan_store::{CachedRecordStore, InMemoryRecordStore};
use rust_decimal::Decimal;
use serde_json::json;
use tokio::sync::Notify;
use uuid::Uuid;

/// Holds the next `list` call after it has read, until `resume` is notified.
#[derive(Default)]
struct PausingStore {
    inner: InMemoryRecordStore,
    armed: AtomicBool,
    paused: Notify,
    resume: Notify,
}

#[async_trait]
impl RecordStore for PausingStore {
    async fn list(
        &self,
        tenant: TenantId,
        kind: EntityKind,
        filter: &Filter,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        let rows = self.inner.list(tenant, kind, filter).await;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.paused.notify_one();
            self.resume.notified().await;
        }
        rows
    }

    async fn get(
        &self,
        tenant: TenantId,
        kind: EntityKind,
        id: Uuid,
    ) -> Result<Option<StoredRecord>, StoreError> {
        self.inner.get(tenant, kind, id).await
    }

    async fn commit(
        &self,
        tenant: TenantId,
        writes: Vec<RecordWrite>,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        self.inner.commit(tenant, writes).await
    }

    async fn remove(&self, tenant: TenantId, kind: EntityKind, id: Uuid) -> bool {
        self.inner.remove(tenant, kind, id).await
    }
}

fn loan(borrower: &str, principal: i64) -> Loan {
    Loan {
        borrower_name: borrower.to_string(),
        principal_amount: Decimal::from(principal),
        interest_rate: Decimal::ZERO,
        term_months: 12,
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        status: LoanStatus::Active,
        amount_paid: Decimal::ZERO,
    }
}

#[tokio::test]
async fn list_preserves_insertion_order_and_filters() {
    let store = InMemoryRecordStore::new();
    let tenant = TenantId::new();

    for (name, status) in [("a", "In"), ("b", "Out"), ("c", "In")] {
        store
            .upsert(
                tenant,
                EntityKind::StashTransactions,
                None,
                json!({"source": name, "type": status}),
            )
            .await
            .unwrap();
    }

    let all = store
        .list(tenant, EntityKind::StashTransactions, &Filter::all())
        .await
        .unwrap();
    let sources: Vec<_> = all.iter().map(|row| row.body["source"].clone()).collect();
    assert_eq!(sources, vec![json!("a"), json!("b"), json!("c")]);

    let incoming = store
        .list(
            tenant,
            EntityKind::StashTransactions,
            &Filter::all().eq("type", "In"),
        )
        .await
        .unwrap();
    assert_eq!(incoming.len(), 2);
}

#[tokio::test]
async fn upsert_merges_into_existing_row() {
    let store = InMemoryRecordStore::new();
    let tenant = TenantId::new();

    let created = store
        .upsert(
            tenant,
            EntityKind::SalaryRegisters,
            None,
            json!({"net_pay": "5000", "paid_amount": "0", "status": "Pending"}),
        )
        .await
        .unwrap();

    let updated = store
        .upsert(
            tenant,
            EntityKind::SalaryRegisters,
            Some(created.id),
            json!({"paid_amount": "2000", "status": "Partial"}),
        )
        .await
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(
        updated.body,
        json!({"net_pay": "5000", "paid_amount": "2000", "status": "Partial"})
    );
}

#[tokio::test]
async fn tenants_do_not_see_each_other() {
    let store = InMemoryRecordStore::new();
    let (first, second) = (TenantId::new(), TenantId::new());

    let row = store
        .upsert(first, EntityKind::Loans, None, json!({"borrower_name": "x"}))
        .await
        .unwrap();

    assert!(
        store
            .list(second, EntityKind::Loans, &Filter::all())
            .await
            .unwrap()
            .is_empty()
    );
    assert!(store.get(second, EntityKind::Loans, row.id).await.unwrap().is_none());
    assert!(!store.remove(second, EntityKind::Loans, row.id).await);
    assert!(store.get(first, EntityKind::Loans, row.id).await.unwrap().is_some());
}

#[tokio::test]
async fn rejected_commit_writes_nothing() {
    let store = InMemoryRecordStore::new();
    let tenant = TenantId::new();

    let result = store
        .commit(
            tenant,
            vec![
                RecordWrite::new(EntityKind::Expenses, None, json!({"category": "Salaries"})),
                RecordWrite::new(EntityKind::SalaryRegisters, None, json!("not an object")),
            ],
        )
        .await;

    assert!(result.is_err());
    assert!(
        store
            .list(tenant, EntityKind::Expenses, &Filter::all())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn remove_reports_missing_rows_as_false() {
    let store = InMemoryRecordStore::new();
    let tenant = TenantId::new();
    let row = store
        .upsert(tenant, EntityKind::Loans, None, json!({"borrower_name": "x"}))
        .await
        .unwrap();

    assert!(store.remove(tenant, EntityKind::Loans, row.id).await);
    assert!(!store.remove(tenant, EntityKind::Loans, row.id).await);
}

#[tokio::test]
async fn repository_rejects_missing_required_fields() {
    let store: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::new());
    let loans = Repository::<Loan>::new(store, TenantId::new());

    let err = loans.upsert(None, &loan("  ", 1000)).await.unwrap_err();
    assert!(err.is_validation());
    assert!(loans.list().await.unwrap().is_empty());

    let saved = loans.upsert(None, &loan("Sameh", 1000)).await.unwrap();
    assert_eq!(saved.borrower_name, "Sameh");
    assert!(loans.require(saved.id).await.is_ok());
    assert!(
        loans
            .require(Uuid::new_v4())
            .await
            .unwrap_err()
            .is_not_found()
    );
}

#[tokio::test]
async fn json_patch_merges_then_validates() {
    let store: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::new());
    let loans = Repository::<Loan>::new(store, TenantId::new());

    let saved = loans
        .upsert_json(
            None,
            json!({
                "borrower_name": "Crystal",
                "principal_amount": "15000",
                "start_date": "2024-03-01"
            }),
        )
        .await
        .unwrap();
    assert_eq!(saved.status, LoanStatus::Active);

    let paid = loans
        .upsert_json(Some(saved.id), json!({"amount_paid": 5000}))
        .await
        .unwrap();
    assert_eq!(paid.borrower_name, "Crystal");
    assert_eq!(paid.remaining(), Decimal::from(10000));

    let err = loans
        .upsert_json(Some(saved.id), json!({"borrower_name": ""}))
        .await
        .unwrap_err();
    assert!(err.is_validation());
    let missing = loans
        .upsert_json(None, json!({"principal_amount": 1}))
        .await
        .unwrap_err();
    assert!(missing.is_validation());
    let not_object = loans.upsert_json(None, json!([1, 2])).await.unwrap_err();
    assert!(not_object.is_validation());
    assert_eq!(loans.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn cache_serves_lists_until_invalidated() {
    let cached = CachedRecordStore::new(InMemoryRecordStore::new());
    let tenant = TenantId::new();

    cached
        .upsert(tenant, EntityKind::Loans, None, json!({"borrower_name": "a"}))
        .await
        .unwrap();
    assert_eq!(
        cached
            .list(tenant, EntityKind::Loans, &Filter::all())
            .await
            .unwrap()
            .len(),
        1
    );
    assert!(cached.is_cached(tenant, EntityKind::Loans).await);

    // A write that bypasses the cache stays invisible until refresh.
    cached
        .inner()
        .upsert(tenant, EntityKind::Loans, None, json!({"borrower_name": "b"}))
        .await
        .unwrap();
    assert_eq!(
        cached
            .list(tenant, EntityKind::Loans, &Filter::all())
            .await
            .unwrap()
            .len(),
        1
    );

    cached.refresh(tenant, EntityKind::Loans).await.unwrap();
    assert_eq!(
        cached
            .list(tenant, EntityKind::Loans, &Filter::all())
            .await
            .unwrap()
            .len(),
        2
    );

    // Local writes invalidate on their own.
    cached
        .upsert(tenant, EntityKind::Loans, None, json!({"borrower_name": "c"}))
        .await
        .unwrap();
    assert!(!cached.is_cached(tenant, EntityKind::Loans).await);
    assert_eq!(
        cached
            .list(tenant, EntityKind::Loans, &Filter::all())
            .await
            .unwrap()
            .len(),
        3
    );
}

#[tokio::test]
async fn failed_precondition_aborts_the_whole_commit() {
    let store = InMemoryRecordStore::new();
    let tenant = TenantId::new();
    let order = store
        .upsert(tenant, EntityKind::PurchaseOrders, None, json!({"status": "Completed"}))
        .await
        .unwrap();

    let err = store
        .commit(
            tenant,
            vec![
                RecordWrite::new(EntityKind::Expenses, None, json!({"category": "Purchases"})),
                RecordWrite::new(
                    EntityKind::PurchaseOrders,
                    Some(order.id),
                    json!({"status": "Completed", "notes": "again"}),
                )
                .expecting(Precondition::Matches(Filter::all().eq("status", "Sent"))),
            ],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict { kind: EntityKind::PurchaseOrders, .. }));
    assert!(
        store
            .list(tenant, EntityKind::Expenses, &Filter::all())
            .await
            .unwrap()
            .is_empty()
    );

    let stored = store
        .get(tenant, EntityKind::PurchaseOrders, order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.body, json!({"status": "Completed"}));

    let taken = store
        .commit(
            tenant,
            vec![
                RecordWrite::new(EntityKind::PurchaseOrders, Some(order.id), json!({}))
                    .expecting(Precondition::Absent),
            ],
        )
        .await;
    assert!(matches!(taken, Err(StoreError::Conflict { .. })));
}

#[tokio::test]
async fn list_loaded_across_a_commit_is_not_cached() {
    let cached = Arc::new(CachedRecordStore::new(PausingStore::default()));
    let tenant = TenantId::new();
    cached.inner().armed.store(true, Ordering::SeqCst);

    let reader = tokio::spawn({
        let cached = Arc::clone(&cached);
        async move {
            cached
                .list(tenant, EntityKind::StashTransactions, &Filter::all())
                .await
                .unwrap()
                .len()
        }
    });

    cached.inner().paused.notified().await;
    cached
        .upsert(
            tenant,
            EntityKind::StashTransactions,
            None,
            json!({"amount": "500", "type": "In"}),
        )
        .await
        .unwrap();
    cached.inner().resume.notify_one();

    // The paused read saw the table before the commit and must not be kept.
    assert_eq!(reader.await.unwrap(), 0);
    assert!(!cached.is_cached(tenant, EntityKind::StashTransactions).await);
    let rows = cached
        .list(tenant, EntityKind::StashTransactions, &Filter::all())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn invalidate_drops_a_cached_table() {
    let cached = CachedRecordStore::new(InMemoryRecordStore::new());
    let tenant = TenantId::new();
    cached
        .list(tenant, EntityKind::Loans, &Filter::all())
        .await
        .unwrap();
    cached
        .inner()
        .upsert(tenant, EntityKind::Loans, None, json!({"borrower_name": "remote"}))
        .await
        .unwrap();

    cached.invalidate(tenant, EntityKind::Loans).await;
    assert!(!cached.is_cached(tenant, EntityKind::Loans).await);
    assert_eq!(
        cached
            .list(tenant, EntityKind::Loans, &Filter::all())
            .await
            .unwrap()
            .len(),
        1
    );
}
