use std::collections::BTreeMap;

use chrono::NaiveDate;
use mizan_core::{AdvanceStatus, Customer, Filter, SupplierPayment};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertRecordRequest {
    pub id: Option<Uuid>,
    pub body: Value,
}

/// Query-string equality filter for generic record listing. Values that parse
/// as JSON (numbers, booleans) match typed fields; anything else matches as text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordsQuery {
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl RecordsQuery {
    pub fn to_filter(&self) -> Filter {
        self.fields.iter().fold(Filter::all(), |filter, (field, raw)| {
            let value = match serde_json::from_str::<Value>(raw) {
                Ok(parsed @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => parsed,
                _ => Value::String(raw.clone()),
            };
            filter.eq(field, value)
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovedResponse {
    pub id: Uuid,
    pub removed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryPaymentRequest {
    /// Defaults to what the register still owes.
    pub amount: Option<Decimal>,
    pub paid_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffPaymentRequest {
    #[serde(default)]
    pub days_worked: u32,
    pub paid_on: Option<NaiveDate>,
}

/// A sale names either an existing `customer_id` or a new `customer` to create.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteSaleRequest {
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    #[serde(default)]
    pub customer: Option<Customer>,
    pub unit_id: Uuid,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub sold_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvanceStatusRequest {
    pub status: AdvanceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierPaymentRequest {
    pub payment: SupplierPayment,
    #[serde(default)]
    pub memo: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastQuery {
    pub today: Option<NaiveDate>,
}
