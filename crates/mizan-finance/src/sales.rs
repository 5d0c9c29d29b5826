use chrono::{Days, NaiveDate};
use mizan_core::{
    InstallmentRecord, InstallmentStatus, InvoiceStatus, LedgerError, PropertyUnit, SalesInvoice,
    UnitStatus,
};
use rust_decimal::Decimal;
use uuid::Uuid;

const FIRST_INSTALLMENT_DAYS: u64 = 30;

#[derive(Debug, Clone)]
pub struct SalePosting {
    pub invoice: SalesInvoice,
    pub unit: PropertyUnit,
    pub installment: Option<InstallmentRecord>,
}

/// Rows implied by selling `unit` to a customer, optionally on a payment plan.
///
/// The invoice is issued paid and due on the sale date. Without a plan the
/// unit becomes `Sold`; with one it becomes `Installments` and a plan for the
/// full price opens, first due 30 days after the sale.
pub fn sale_postings(
    customer_id: Uuid,
    customer_name: &str,
    unit_id: Uuid,
    unit: &PropertyUnit,
    plan: Option<&str>,
    sold_on: NaiveDate,
) -> Result<SalePosting, LedgerError> {
    if !unit.is_available() {
        return Err(LedgerError::Validation(format!(
            "unit {} is not available",
            unit.name
        )));
    }
    let plan = plan.map(str::trim).filter(|plan| !plan.is_empty());

    let invoice = SalesInvoice {
        customer_id,
        unit_id: Some(unit_id),
        amount: unit.price,
        status: InvoiceStatus::Paid,
        due_date: sold_on,
    };

    let sold = PropertyUnit {
        status: if plan.is_some() {
            UnitStatus::Installments
        } else {
            UnitStatus::Sold
        },
        consumer_name: Some(customer_name.to_string()),
        paid_amount: Decimal::ZERO,
        ..unit.clone()
    };

    let installment = match plan {
        Some(plan) => {
            let next_due = sold_on
                .checked_add_days(Days::new(FIRST_INSTALLMENT_DAYS))
                .ok_or_else(|| LedgerError::Validation("sale date is out of range".to_string()))?;
            Some(InstallmentRecord {
                unit: unit.name.clone(),
                customer: customer_name.to_string(),
                plan: plan.to_string(),
                unit_id: Some(unit_id),
                customer_id: Some(customer_id),
                total_amount: unit.price,
                paid_amount: Decimal::ZERO,
                next_due_at: Some(next_due),
                status: InstallmentStatus::Pending,
            })
        }
        None => None,
    };

    Ok(SalePosting {
        invoice,
        unit: sold,
        installment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn unit(status: UnitStatus) -> PropertyUnit {
        PropertyUnit {
            name: "Apt 4B - Sunrise".to_string(),
            unit_type: "Apartment".to_string(),
            price: Decimal::from(1_500_000),
            status,
            project: Some("Sunrise".to_string()),
            consumer_name: None,
            paid_amount: Decimal::ZERO,
        }
    }

    #[test]
    fn cash_sale_marks_unit_sold() {
        let (customer_id, unit_id) = (Uuid::new_v4(), Uuid::new_v4());
        let posting = sale_postings(
            customer_id,
            "Sameh Kamel",
            unit_id,
            &unit(UnitStatus::Available),
            None,
            date(2024, 5, 2),
        )
        .unwrap();

        assert_eq!(posting.invoice.customer_id, customer_id);
        assert_eq!(posting.invoice.unit_id, Some(unit_id));
        assert_eq!(posting.invoice.amount, Decimal::from(1_500_000));
        assert_eq!(posting.invoice.status, InvoiceStatus::Paid);
        assert_eq!(posting.invoice.due_date, date(2024, 5, 2));
        assert_eq!(posting.unit.status, UnitStatus::Sold);
        assert_eq!(posting.unit.consumer_name.as_deref(), Some("Sameh Kamel"));
        assert_eq!(posting.unit.project.as_deref(), Some("Sunrise"));
        assert!(posting.installment.is_none());
    }

    #[test]
    fn plan_sale_opens_installments_thirty_days_out() {
        let posting = sale_postings(
            Uuid::new_v4(),
            "Nadia Ali",
            Uuid::new_v4(),
            &unit(UnitStatus::Available),
            Some("Standard 5 Years"),
            date(2024, 1, 15),
        )
        .unwrap();

        assert_eq!(posting.unit.status, UnitStatus::Installments);
        let plan = posting.installment.unwrap();
        assert_eq!(plan.plan, "Standard 5 Years");
        assert_eq!(plan.total_amount, Decimal::from(1_500_000));
        assert_eq!(plan.paid_amount, Decimal::ZERO);
        assert_eq!(plan.next_due_at, Some(date(2024, 2, 14)));
        assert_eq!(plan.status, InstallmentStatus::Pending);
        assert_eq!(plan.customer, "Nadia Ali");
    }

    #[test]
    fn blank_plan_is_a_cash_sale() {
        let posting = sale_postings(
            Uuid::new_v4(),
            "Nadia Ali",
            Uuid::new_v4(),
            &unit(UnitStatus::Available),
            Some("  "),
            date(2024, 1, 15),
        )
        .unwrap();
        assert_eq!(posting.unit.status, UnitStatus::Sold);
        assert!(posting.installment.is_none());
    }

    #[test]
    fn sold_unit_cannot_be_sold_again() {
        let err = sale_postings(
            Uuid::new_v4(),
            "Amr Ahmed",
            Uuid::new_v4(),
            &unit(UnitStatus::Sold),
            None,
            date(2024, 1, 15),
        )
        .unwrap_err();
        assert!(err.is_validation());
    }
}
