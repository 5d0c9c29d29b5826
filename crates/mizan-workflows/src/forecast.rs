use chrono::NaiveDate;
use mizan_core::{Expense, LedgerError, Project, Quotation, Repository, Staff, Stored};
use mizan_finance::{Forecast, project_forecast};

use crate::LedgerContext;

pub struct ForecastWorkflow {
    projects: Repository<Project>,
    quotations: Repository<Quotation>,
    staff: Repository<Staff>,
    expenses: Repository<Expense>,
}

impl ForecastWorkflow {
    pub fn new(context: &LedgerContext) -> Self {
        Self {
            projects: context.repository(),
            quotations: context.repository(),
            staff: context.repository(),
            expenses: context.repository(),
        }
    }

    pub async fn forecast(&self, today: NaiveDate) -> Result<Forecast, LedgerError> {
        let projects = records(self.projects.list().await?);
        let quotations = records(self.quotations.list().await?);
        let staff = records(self.staff.list().await?);
        let expenses = records(self.expenses.list().await?);

        Ok(project_forecast(today, &projects, &quotations, &staff, &expenses))
    }
}

fn records<T>(stored: Vec<Stored<T>>) -> Vec<T> {
    stored.into_iter().map(|stored| stored.record).collect()
}
