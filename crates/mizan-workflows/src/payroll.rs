use chrono::NaiveDate;
use mizan_core::{
    AdvanceStatus, Expense, Filter, LedgerError, PayrollContract, Repository, SalaryAdvance,
    SalaryRegister, SalarySlip, Staff, Stored,
};
use mizan_finance::{apply_salary_payment, generate_slip, pay_staff_directly};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::{LedgerContext, committed};

#[derive(Debug, Clone, Serialize)]
pub struct SalaryPaymentOutcome {
    pub register_id: Uuid,
    pub register: SalaryRegister,
    pub expense_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlipOutcome {
    pub slip_id: Uuid,
    pub slip: SalarySlip,
    pub register: SalaryRegister,
}

#[derive(Debug, Clone, Serialize)]
pub struct StaffPayOutcome {
    pub staff_id: Uuid,
    pub expense_id: Uuid,
    pub amount: Decimal,
}

pub struct PayrollWorkflow {
    context: LedgerContext,
    registers: Repository<SalaryRegister>,
    staff: Repository<Staff>,
    contracts: Repository<PayrollContract>,
    advances: Repository<SalaryAdvance>,
}

impl PayrollWorkflow {
    pub fn new(context: &LedgerContext) -> Self {
        Self {
            context: context.clone(),
            registers: context.repository(),
            staff: context.repository(),
            contracts: context.repository(),
            advances: context.repository(),
        }
    }

    async fn employee_name(&self, staff_id: Uuid) -> Result<Option<String>, LedgerError> {
        Ok(self.staff.get(staff_id).await?.map(|staff| staff.record.full_name))
    }

    /// Records a payment against a register and books it as a salary expense.
    pub async fn process_payment(
        &self,
        register_id: Uuid,
        amount: Decimal,
        paid_on: NaiveDate,
    ) -> Result<SalaryPaymentOutcome, LedgerError> {
        let register = self.registers.require(register_id).await?;
        let name = self.employee_name(register.employee_id).await?;

        let posting = apply_salary_payment(
            &register,
            amount,
            name.as_deref(),
            paid_on,
            self.context.profile(),
        );

        let mut unit = self.context.unit_of_work();
        unit.stage(Some(register_id), &posting.register)?;
        let expense_id = unit.stage::<Expense>(None, &posting.expense)?;
        let records = unit.commit().await?;

        let stored: Stored<SalaryRegister> = committed(&records, register_id)?;
        info!(
            "salary register {register_id} paid {amount}, now {:?} ({} of {})",
            stored.status, stored.paid_amount, stored.net_pay
        );

        Ok(SalaryPaymentOutcome {
            register_id,
            register: stored.record,
            expense_id,
        })
    }

    /// Builds the slip for a register's period and copies its net into the register.
    pub async fn generate_slip(&self, register_id: Uuid) -> Result<SlipOutcome, LedgerError> {
        let register = self.registers.require(register_id).await?;
        let staff_filter = Filter::all().eq_serialized("staff_id", &register.employee_id)?;
        let contracts: Vec<PayrollContract> = self
            .contracts
            .list_where(&staff_filter)
            .await?
            .into_iter()
            .map(|stored| stored.record)
            .collect();
        let advances: Vec<SalaryAdvance> = self
            .advances
            .list_where(&staff_filter.eq_serialized("status", &AdvanceStatus::Approved)?)
            .await?
            .into_iter()
            .map(|stored| stored.record)
            .collect();

        let posting = generate_slip(
            register_id,
            &register,
            &contracts,
            &advances,
            self.context.profile(),
        )?;

        let mut unit = self.context.unit_of_work();
        let slip_id = unit.stage(None, &posting.slip)?;
        unit.stage(Some(register_id), &posting.register)?;
        unit.commit().await?;

        info!(
            "salary slip {slip_id} generated for register {register_id}: net {}",
            posting.slip.net_salary
        );

        Ok(SlipOutcome {
            slip_id,
            slip: posting.slip,
            register: posting.register,
        })
    }

    pub async fn set_advance_status(
        &self,
        advance_id: Uuid,
        status: AdvanceStatus,
    ) -> Result<Stored<SalaryAdvance>, LedgerError> {
        let advance = self.advances.require(advance_id).await?;
        let updated = SalaryAdvance {
            status,
            ..advance.record
        };
        let stored = self.advances.upsert(Some(advance_id), &updated).await?;
        info!("salary advance {advance_id} set to {status:?}");
        Ok(stored)
    }

    /// Pays a staff member directly, outside any register.
    pub async fn pay_staff(
        &self,
        staff_id: Uuid,
        days_worked: u32,
        paid_on: NaiveDate,
    ) -> Result<StaffPayOutcome, LedgerError> {
        let staff = self.staff.require(staff_id).await?;
        let posting = pay_staff_directly(&staff, days_worked, paid_on, self.context.profile());

        let mut unit = self.context.unit_of_work();
        let expense_id = unit.stage(None, &posting.expense)?;
        unit.stage(Some(staff_id), &posting.staff)?;
        unit.commit().await?;

        info!(
            "staff {staff_id} paid {} directly",
            posting.expense.amount
        );

        Ok(StaffPayOutcome {
            staff_id,
            expense_id,
            amount: posting.expense.amount,
        })
    }
}
