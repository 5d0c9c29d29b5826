use chrono::{Datelike, Months, NaiveDate};
use mizan_core::{
    BillingCycle, Expense, Project, ProjectStatus, Quotation, QuotationStatus, Staff,
};
use rust_decimal::Decimal;
use serde::Serialize;

const FORECAST_MONTHS: u32 = 12;
const OVERHEAD_WINDOW: usize = 3;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ForecastMonth {
    pub label: String,
    pub month_start: NaiveDate,
    pub income: Decimal,
    pub expense: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Forecast {
    pub months: Vec<ForecastMonth>,
    pub total_income: Decimal,
    pub total_expense: Decimal,
}

/// Twelve-month income and expense projection starting at the month of `today`.
///
/// Every month gets the same figures; the model has no seasonality.
pub fn project_forecast(
    today: NaiveDate,
    projects: &[Project],
    quotations: &[Quotation],
    staff: &[Staff],
    expenses: &[Expense],
) -> Forecast {
    let project_income: Decimal = projects
        .iter()
        .filter(|project| {
            project.status != ProjectStatus::Completed
                && project.billing_cycle == Some(BillingCycle::Monthly)
        })
        .map(|project| project.revenue / Decimal::from(12))
        .sum();

    let quote_income: Decimal = quotations
        .iter()
        .filter(|quote| {
            quote.status == QuotationStatus::Accepted
                && quote.is_recurring
                && quote.billing_cycle == Some(BillingCycle::Monthly)
        })
        .map(|quote| quote.amount)
        .sum();

    let payroll: Decimal = staff.iter().map(|member| member.base_salary).sum();

    let overhead = if expenses.is_empty() {
        Decimal::ZERO
    } else {
        let total: Decimal = expenses.iter().map(|expense| expense.amount).sum();
        total / Decimal::from(expenses.len().min(OVERHEAD_WINDOW))
    };

    let income = round_whole(project_income + quote_income);
    let expense = round_whole(payroll + overhead);

    let first = today.with_day(1).unwrap_or(today);
    let months: Vec<ForecastMonth> = (0..FORECAST_MONTHS)
        .filter_map(|offset| first.checked_add_months(Months::new(offset)))
        .map(|month_start| ForecastMonth {
            label: month_start.format("%b %Y").to_string(),
            month_start,
            income,
            expense,
            profit: income - expense,
        })
        .collect();

    Forecast {
        total_income: months.iter().map(|month| month.income).sum(),
        total_expense: months.iter().map(|month| month.expense).sum(),
        months,
    }
}

/// Halves round up toward positive infinity, so -2.5 becomes -2.
fn round_whole(value: Decimal) -> Decimal {
    (value + Decimal::new(5, 1)).floor()
}
