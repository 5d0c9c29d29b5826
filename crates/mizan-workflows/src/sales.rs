use chrono::NaiveDate;
use mizan_core::{
    Customer, Filter, LedgerError, Precondition, PropertyUnit, Repository, UnitStatus,
};
use mizan_finance::sale_postings;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::LedgerContext;

/// Who is buying: a customer already on file, or one to create with the sale.
#[derive(Debug, Clone)]
pub enum SaleCustomer {
    Existing(Uuid),
    New(Customer),
}

#[derive(Debug, Clone)]
pub struct SaleOrder {
    pub customer: SaleCustomer,
    pub unit_id: Uuid,
    /// Payment plan name; `None` is a cash sale.
    pub plan: Option<String>,
    pub sold_on: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaleCompleted {
    pub customer_id: Uuid,
    pub customer_created: bool,
    pub invoice_id: Uuid,
    pub unit_id: Uuid,
    pub unit_status: UnitStatus,
    pub installment_id: Option<Uuid>,
}

pub struct SalesWorkflow {
    context: LedgerContext,
    customers: Repository<Customer>,
    units: Repository<PropertyUnit>,
}

impl SalesWorkflow {
    pub fn new(context: &LedgerContext) -> Self {
        Self {
            context: context.clone(),
            customers: context.repository(),
            units: context.repository(),
        }
    }

    /// Creates the customer if new, issues the invoice, moves the unit out of
    /// `Available` and opens the installment plan, all in one commit.
    ///
    /// The unit write only applies while the unit is still available, so two
    /// sales of one unit cannot both commit.
    pub async fn complete_sale(&self, sale: SaleOrder) -> Result<SaleCompleted, LedgerError> {
        let (customer_id, customer) = match sale.customer {
            SaleCustomer::Existing(id) => (id, None),
            SaleCustomer::New(customer) => (Uuid::new_v4(), Some(customer)),
        };
        let customer_name = match &customer {
            Some(customer) => customer.name.clone(),
            None => self.customers.require(customer_id).await?.record.name,
        };
        let unit = self.units.require(sale.unit_id).await?;

        let posting = sale_postings(
            customer_id,
            &customer_name,
            sale.unit_id,
            &unit,
            sale.plan.as_deref(),
            sale.sold_on,
        )?;

        let mut work = self.context.unit_of_work();
        if let Some(customer) = &customer {
            work.stage(Some(customer_id), customer)?;
        }
        let invoice_id = work.stage(None, &posting.invoice)?;
        let still_available = Filter::all().eq_serialized("status", &UnitStatus::Available)?;
        work.stage_guarded(
            sale.unit_id,
            &posting.unit,
            Precondition::Matches(still_available),
        )?;
        let installment_id = posting
            .installment
            .as_ref()
            .map(|installment| work.stage(None, installment))
            .transpose()?;
        work.commit().await?;

        info!(
            "unit {} sold to {customer_name} for {}, invoice {invoice_id}",
            unit.name, posting.invoice.amount
        );

        Ok(SaleCompleted {
            customer_id,
            customer_created: customer.is_some(),
            invoice_id,
            unit_id: sale.unit_id,
            unit_status: posting.unit.status,
            installment_id,
        })
    }
}
