use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::LedgerError,
    storage::{Entity, EntityKind},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: Option<String>,
}

impl Entity for Customer {
    const KIND: EntityKind = EntityKind::Customers;

    fn validate(&self) -> Result<(), LedgerError> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::missing("name"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum UnitStatus {
    #[default]
    Available,
    Sold,
    Installments,
    #[serde(untagged)]
    Other(String),
}

/// A sellable real-estate unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyUnit {
    pub name: String,
    #[serde(default, rename = "type")]
    pub unit_type: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub status: UnitStatus,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub consumer_name: Option<String>,
    #[serde(default)]
    pub paid_amount: Decimal,
}

impl PropertyUnit {
    pub fn is_available(&self) -> bool {
        self.status == UnitStatus::Available
    }
}

impl Entity for PropertyUnit {
    const KIND: EntityKind = EntityKind::Units;

    fn validate(&self) -> Result<(), LedgerError> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::missing("name"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Pending,
    Paid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesInvoice {
    pub customer_id: Uuid,
    #[serde(default)]
    pub unit_id: Option<Uuid>,
    pub amount: Decimal,
    #[serde(default)]
    pub status: InvoiceStatus,
    pub due_date: NaiveDate,
}

impl Entity for SalesInvoice {
    const KIND: EntityKind = EntityKind::SalesInvoices;
}
