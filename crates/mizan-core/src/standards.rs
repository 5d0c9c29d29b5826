use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExpenseCategories {
    pub salaries: String,
    pub purchases: String,
    pub supplier_payments: String,
}

/// Fixed policy values the posting rules read.
pub trait PostingProfile: Send + Sync {
    fn name(&self) -> &'static str;
    fn currency(&self) -> &str;
    fn expense_categories(&self) -> ExpenseCategories;
    /// Share of the contract base withheld as VAT on every slip.
    fn salary_vat_rate(&self) -> Decimal;
    fn default_days_served(&self) -> u32;
}

#[derive(Debug, Clone)]
pub struct EgpProfile {
    currency: String,
}

impl EgpProfile {
    pub fn with_currency(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }
}

impl Default for EgpProfile {
    fn default() -> Self {
        Self::with_currency("EGP")
    }
}

impl PostingProfile for EgpProfile {
    fn name(&self) -> &'static str {
        "EGP-payroll"
    }

    fn currency(&self) -> &str {
        &self.currency
    }

    fn expense_categories(&self) -> ExpenseCategories {
        ExpenseCategories {
            salaries: "Salaries".to_string(),
            purchases: "Purchases".to_string(),
            supplier_payments: "Cost of Goods Sold".to_string(),
        }
    }

    fn salary_vat_rate(&self) -> Decimal {
        Decimal::new(14, 2)
    }

    fn default_days_served(&self) -> u32 {
        30
    }
}
