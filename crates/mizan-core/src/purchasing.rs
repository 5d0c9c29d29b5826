use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::LedgerError,
    storage::{Entity, EntityKind},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PurchaseOrderStatus {
    #[default]
    Draft,
    Sent,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum RequestType {
    Inventory,
    #[serde(rename = "Office Supplies")]
    OfficeSupplies,
    #[default]
    Items,
}

impl RequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inventory => "Inventory",
            Self::OfficeSupplies => "Office Supplies",
            Self::Items => "Items",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub order_number: String,
    #[serde(default)]
    pub supplier_id: Option<Uuid>,
    pub date: NaiveDate,
    #[serde(default)]
    pub expected_delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: PurchaseOrderStatus,
    pub total_amount: Decimal,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub request_type: RequestType,
    #[serde(default)]
    pub attachment_url: String,
    #[serde(default)]
    pub quotation_id: Option<Uuid>,
}

impl PurchaseOrder {
    pub fn is_completed(&self) -> bool {
        self.status == PurchaseOrderStatus::Completed
    }
}

impl Entity for PurchaseOrder {
    const KIND: EntityKind = EntityKind::PurchaseOrders;

    fn validate(&self) -> Result<(), LedgerError> {
        if self.order_number.trim().is_empty() {
            return Err(LedgerError::missing("order_number"));
        }
        Ok(())
    }
}
