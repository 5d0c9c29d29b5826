use std::fmt;

use chrono::{Month, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::LedgerError,
    storage::{Entity, EntityKind},
};

/// Known contract kinds. Labels entered elsewhere are kept verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum EmploymentType {
    #[default]
    #[serde(rename = "Full Time")]
    FullTime,
    #[serde(rename = "Part Time")]
    PartTime,
    Temporary,
    Daily,
    Freelance,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    pub full_name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub employment_type: EmploymentType,
    #[serde(default)]
    pub base_salary: Decimal,
    #[serde(default)]
    pub daily_rate: Decimal,
    #[serde(default)]
    pub penalties: Decimal,
    #[serde(default)]
    pub vacations: u32,
    #[serde(default)]
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_staff_status")]
    pub status: String,
}

impl Entity for Staff {
    const KIND: EntityKind = EntityKind::Staff;

    fn validate(&self) -> Result<(), LedgerError> {
        if self.full_name.trim().is_empty() {
            return Err(LedgerError::missing("full_name"));
        }
        Ok(())
    }
}

fn default_staff_status() -> String {
    "Active".to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SalaryStatus {
    #[default]
    Pending,
    Partial,
    Transferred,
}

impl SalaryStatus {
    /// Status implied by how much of the net pay has been paid.
    ///
    /// Covering the net pay wins over a non-positive paid amount, so a
    /// register with a zero net pay reads as transferred.
    pub fn from_amounts(paid_amount: Decimal, net_pay: Decimal) -> Self {
        if paid_amount >= net_pay {
            Self::Transferred
        } else if paid_amount <= Decimal::ZERO {
            Self::Pending
        } else {
            Self::Partial
        }
    }
}

/// Calendar month a register or slip refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayPeriod {
    pub month: Month,
    pub year: i32,
}

impl PayPeriod {
    pub fn parse(month: &str, year: i32) -> Result<Self, LedgerError> {
        let month = month
            .trim()
            .parse::<Month>()
            .map_err(|_| LedgerError::Validation(format!("unknown month {month:?}")))?;
        let period = Self { month, year };
        period.first_day()?;
        Ok(period)
    }

    pub fn first_day(&self) -> Result<NaiveDate, LedgerError> {
        NaiveDate::from_ymd_opt(self.year, self.month.number_from_month(), 1).ok_or_else(|| {
            LedgerError::Validation(format!("{} {} is out of range", self.month.name(), self.year))
        })
    }
}

impl fmt::Display for PayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month.name(), self.year)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryRegister {
    pub employee_id: Uuid,
    pub month: String,
    pub year: i32,
    #[serde(default)]
    pub base_salary: Decimal,
    #[serde(default)]
    pub allowances: Decimal,
    #[serde(default)]
    pub deductions: Decimal,
    #[serde(default)]
    pub net_pay: Decimal,
    #[serde(default)]
    pub paid_amount: Decimal,
    #[serde(default)]
    pub status: SalaryStatus,
}

impl SalaryRegister {
    pub fn period(&self) -> Result<PayPeriod, LedgerError> {
        PayPeriod::parse(&self.month, self.year)
    }

    /// Status as derived from the amounts, regardless of what was stored.
    pub fn derived_status(&self) -> SalaryStatus {
        SalaryStatus::from_amounts(self.paid_amount, self.net_pay)
    }

    /// Amount still owed; the default offered for the next payment.
    pub fn outstanding(&self) -> Decimal {
        self.net_pay - self.paid_amount
    }
}

impl Entity for SalaryRegister {
    const KIND: EntityKind = EntityKind::SalaryRegisters;

    fn validate(&self) -> Result<(), LedgerError> {
        if self.month.trim().is_empty() {
            return Err(LedgerError::missing("month"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollContract {
    pub staff_id: Uuid,
    #[serde(default)]
    pub service_id: Option<Uuid>,
    #[serde(default)]
    pub tasks: String,
    #[serde(default)]
    pub employment_type: EmploymentType,
    pub base_salary: Decimal,
    #[serde(default)]
    pub yearly_increase_percent: Decimal,
    #[serde(default)]
    pub insurance_amount: Decimal,
    #[serde(default)]
    pub transportation_amount: Decimal,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl PayrollContract {
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        self.start_date <= day && self.end_date.is_none_or(|end| end >= day)
    }
}

impl Entity for PayrollContract {
    const KIND: EntityKind = EntityKind::PayrollContracts;

    fn validate(&self) -> Result<(), LedgerError> {
        if let Some(end) = self.end_date
            && end < self.start_date
        {
            return Err(LedgerError::Validation(
                "end_date must not precede start_date".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AdvanceStatus {
    #[default]
    Pending,
    Approved,
    Paid,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryAdvance {
    pub staff_id: Uuid,
    pub amount: Decimal,
    #[serde(default)]
    pub reason: String,
    pub repayment_start_date: NaiveDate,
    #[serde(default)]
    pub status: AdvanceStatus,
}

impl SalaryAdvance {
    pub fn deductible_on(&self, staff_id: Uuid, period_start: NaiveDate) -> bool {
        self.staff_id == staff_id
            && self.status == AdvanceStatus::Approved
            && self.repayment_start_date <= period_start
    }
}

impl Entity for SalaryAdvance {
    const KIND: EntityKind = EntityKind::SalaryAdvances;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SalarySlip {
    pub staff_id: Uuid,
    #[serde(default)]
    pub register_id: Option<Uuid>,
    pub month_year: String,
    pub base_salary: Decimal,
    pub vat_amount: Decimal,
    pub insurance_amount: Decimal,
    pub transportation_amount: Decimal,
    pub advances_deducted: Decimal,
    #[serde(default)]
    pub penalties_deducted: Decimal,
    pub net_salary: Decimal,
    pub days_served: u32,
}

impl Entity for SalarySlip {
    const KIND: EntityKind = EntityKind::SalarySlips;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_paid_against_net() {
        let net = Decimal::from(5000);
        assert_eq!(SalaryStatus::from_amounts(Decimal::ZERO, net), SalaryStatus::Pending);
        assert_eq!(SalaryStatus::from_amounts(Decimal::from(-10), net), SalaryStatus::Pending);
        assert_eq!(SalaryStatus::from_amounts(Decimal::from(2000), net), SalaryStatus::Partial);
        assert_eq!(SalaryStatus::from_amounts(net, net), SalaryStatus::Transferred);
        assert_eq!(SalaryStatus::from_amounts(Decimal::from(6000), net), SalaryStatus::Transferred);
    }

    #[test]
    fn zero_net_pay_reads_as_transferred() {
        assert_eq!(
            SalaryStatus::from_amounts(Decimal::ZERO, Decimal::ZERO),
            SalaryStatus::Transferred
        );
    }

    #[test]
    fn period_parses_month_names() {
        let period = PayPeriod::parse("February", 2024).unwrap();
        assert_eq!(period.first_day().unwrap(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(period.to_string(), "February 2024");

        let lower = PayPeriod::parse("march", 2025).unwrap();
        assert_eq!(lower.month, Month::March);

        let err = PayPeriod::parse("Smarch", 2024).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn contract_activity_window() {
        let contract = PayrollContract {
            staff_id: Uuid::new_v4(),
            service_id: None,
            tasks: String::new(),
            employment_type: EmploymentType::FullTime,
            base_salary: Decimal::from(10000),
            yearly_increase_percent: Decimal::ZERO,
            insurance_amount: Decimal::ZERO,
            transportation_amount: Decimal::ZERO,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            end_date: Some(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()),
        };
        assert!(!contract.is_active_on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        assert!(contract.is_active_on(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()));
        assert!(!contract.is_active_on(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()));
    }

    #[test]
    fn status_serializes_as_plain_name() {
        let json = serde_json::to_string(&SalaryStatus::Transferred).unwrap();
        assert_eq!(json, "\"Transferred\"");
        let parsed: EmploymentType = serde_json::from_str("\"Full Time\"").unwrap();
        assert_eq!(parsed, EmploymentType::FullTime);
    }

    #[test]
    fn unlisted_employment_types_survive_a_round_trip() {
        let parsed: EmploymentType = serde_json::from_str("\"Temporary\"").unwrap();
        assert_eq!(parsed, EmploymentType::Temporary);

        let parsed: EmploymentType = serde_json::from_str("\"Seasonal\"").unwrap();
        assert_eq!(parsed, EmploymentType::Other("Seasonal".to_string()));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"Seasonal\"");
    }
}
