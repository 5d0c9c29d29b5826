use chrono::NaiveDate;
use mizan_core::{
    EmploymentType, Expense, LedgerError, PayrollContract, PostingProfile, SalaryAdvance,
    SalaryRegister, SalarySlip, SalaryStatus, Staff,
};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Rows produced by paying part of a salary register.
#[derive(Debug, Clone)]
pub struct SalaryPosting {
    pub register: SalaryRegister,
    pub expense: Expense,
}

/// Adds `amount` to the register's paid total and books it as a salary expense.
///
/// The expense carries the payment amount, not the new running total.
/// Negative amounts are not rejected and reduce the paid total.
pub fn apply_salary_payment(
    register: &SalaryRegister,
    amount: Decimal,
    employee_name: Option<&str>,
    paid_on: NaiveDate,
    profile: &dyn PostingProfile,
) -> SalaryPosting {
    let paid_amount = register.paid_amount + amount;
    let updated = SalaryRegister {
        paid_amount,
        status: SalaryStatus::from_amounts(paid_amount, register.net_pay),
        ..register.clone()
    };

    let expense = Expense {
        category: profile.expense_categories().salaries,
        subcategory: None,
        amount,
        date: paid_on,
        description: format!(
            "Salary payment for {} - {} {}",
            employee_name.unwrap_or("employee"),
            register.month,
            register.year
        ),
        payment_method: None,
        receipt_url: None,
        approved: true,
        project_id: None,
        unit_id: None,
        branch_id: None,
    };

    SalaryPosting {
        register: updated,
        expense,
    }
}

/// Contract of `staff_id` in force on `day`; the most recently started wins.
pub fn select_active_contract<'a>(
    contracts: &'a [PayrollContract],
    staff_id: Uuid,
    day: NaiveDate,
) -> Option<&'a PayrollContract> {
    contracts
        .iter()
        .filter(|contract| contract.staff_id == staff_id && contract.is_active_on(day))
        .max_by_key(|contract| contract.start_date)
}

/// A generated slip and the register carrying its net as the new net pay.
#[derive(Debug, Clone)]
pub struct SlipPosting {
    pub slip: SalarySlip,
    pub register: SalaryRegister,
}

/// Itemises the register's period from the active contract and approved advances.
///
/// The register's `status` is left as stored; callers read
/// [`SalaryRegister::derived_status`] to see the effect of the new net pay.
pub fn generate_slip(
    register_id: Uuid,
    register: &SalaryRegister,
    contracts: &[PayrollContract],
    advances: &[SalaryAdvance],
    profile: &dyn PostingProfile,
) -> Result<SlipPosting, LedgerError> {
    let period = register.period()?;
    let period_start = period.first_day()?;

    let contract = select_active_contract(contracts, register.employee_id, period_start)
        .ok_or_else(|| {
            LedgerError::NotFound(format!(
                "no active contract for employee {} in {period}",
                register.employee_id
            ))
        })?;

    let base = contract.base_salary;
    let vat = base * profile.salary_vat_rate();
    let insurance = contract.insurance_amount;
    let transport = contract.transportation_amount;
    let advances_deducted: Decimal = advances
        .iter()
        .filter(|advance| advance.deductible_on(register.employee_id, period_start))
        .map(|advance| advance.amount)
        .sum();

    let net = base + transport - vat - insurance - advances_deducted;

    let slip = SalarySlip {
        staff_id: register.employee_id,
        register_id: Some(register_id),
        month_year: format!("{} {}", register.month, register.year),
        base_salary: base,
        vat_amount: vat,
        insurance_amount: insurance,
        transportation_amount: transport,
        advances_deducted,
        penalties_deducted: Decimal::ZERO,
        net_salary: net,
        days_served: profile.default_days_served(),
    };

    Ok(SlipPosting {
        slip,
        register: SalaryRegister {
            net_pay: net,
            ..register.clone()
        },
    })
}

#[derive(Debug, Clone)]
pub struct StaffPayPosting {
    pub staff: Staff,
    pub expense: Expense,
}

/// Pays a staff member outside the register and clears their penalties.
///
/// Daily workers earn `daily_rate * days_worked`; everyone else the base salary.
pub fn pay_staff_directly(
    staff: &Staff,
    days_worked: u32,
    paid_on: NaiveDate,
    profile: &dyn PostingProfile,
) -> StaffPayPosting {
    let is_daily = staff.employment_type == EmploymentType::Daily;
    let gross = if is_daily {
        staff.daily_rate * Decimal::from(days_worked)
    } else {
        staff.base_salary
    };
    let amount = gross - staff.penalties;

    let mut description = format!("Salary Payment for {}.", staff.full_name);
    if is_daily {
        description.push_str(&format!(" Days Worked: {days_worked}"));
    }

    StaffPayPosting {
        staff: Staff {
            penalties: Decimal::ZERO,
            vacations: 0,
            ..staff.clone()
        },
        expense: Expense {
            category: profile.expense_categories().salaries,
            subcategory: None,
            amount,
            date: paid_on,
            description,
            payment_method: None,
            receipt_url: None,
            approved: true,
            project_id: staff.project_id,
            unit_id: None,
            branch_id: None,
        },
    }
}
