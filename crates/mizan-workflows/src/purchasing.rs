use mizan_core::{Filter, LedgerError, Precondition, PurchaseOrder, Repository};
use mizan_finance::completion_expense;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{LedgerContext, committed};

const SAVE_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Serialize)]
pub struct OrderSaved {
    pub order_id: Uuid,
    pub order: PurchaseOrder,
    /// Set when this save moved the order into `Completed`.
    pub expense_id: Option<Uuid>,
}

pub struct PurchasingWorkflow {
    context: LedgerContext,
    orders: Repository<PurchaseOrder>,
}

impl PurchasingWorkflow {
    pub fn new(context: &LedgerContext) -> Self {
        Self {
            context: context.clone(),
            orders: context.repository(),
        }
    }

    /// Saves an order; the first save that completes it also books the purchase.
    ///
    /// A save that books is guarded on the status it read. If another save
    /// moved the order in between, the guard fails inside the commit and the
    /// save is re-evaluated against the new status.
    pub async fn save_order(
        &self,
        order_id: Option<Uuid>,
        order: PurchaseOrder,
    ) -> Result<OrderSaved, LedgerError> {
        let mut attempt = 1;
        loop {
            match self.try_save(order_id, &order).await {
                Err(err) if err.is_conflict() && attempt < SAVE_ATTEMPTS => {
                    debug!(
                        "purchase order {} changed during save, retrying: {err}",
                        order.order_number
                    );
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }

    async fn try_save(
        &self,
        order_id: Option<Uuid>,
        order: &PurchaseOrder,
    ) -> Result<OrderSaved, LedgerError> {
        let previous = match order_id {
            Some(id) => self.orders.get(id).await?,
            None => None,
        };
        let expense = completion_expense(
            previous.as_ref().map(|stored| &stored.record),
            order,
            self.context.profile(),
        );

        let mut unit = self.context.unit_of_work();
        let order_id = match (order_id, &expense) {
            (Some(id), Some(_)) => {
                let expect = match &previous {
                    Some(stored) => Precondition::Matches(
                        Filter::all().eq_serialized("status", &stored.status)?,
                    ),
                    None => Precondition::Absent,
                };
                unit.stage_guarded(id, order, expect)?
            }
            (order_id, _) => unit.stage(order_id, order)?,
        };
        let expense_id = expense
            .as_ref()
            .map(|expense| unit.stage(None, expense))
            .transpose()?;
        let records = unit.commit().await?;

        if let Some(expense_id) = expense_id {
            info!(
                "purchase order {} completed, expense {expense_id} booked for {}",
                order.order_number, order.total_amount
            );
        }

        let stored = committed::<PurchaseOrder>(&records, order_id)?;
        Ok(OrderSaved {
            order_id,
            order: stored.record,
            expense_id,
        })
    }
}
