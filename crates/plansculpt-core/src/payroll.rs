//! Monthly salary runs for fixed employees

use chrono::{Datelike, NaiveDate, Utc};
use plansculpt_db::entities::{
    employee::{self, EmployeeStatus, EmploymentType},
    payroll_run,
    transaction::{self, TransactionKind},
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::access::Caller;
use crate::audit::AuditAction;
use crate::error::{CoreError, CoreResult};
use crate::money;
use crate::store::Store;

/// Expense category used for salary payments
pub const SALARY_CATEGORY: &str = "Salary";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum PayrollStatus {
    /// Every eligible employee was paid
    Completed,
    /// Some salary inserts failed (see `failures`) or the run totals were not saved
    Partial,
    /// The month was already processed; nothing was created
    AlreadyRun,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PayrollFailure {
    pub employee_id: Uuid,
    pub name: String,
    pub error: String,
}

/// Outcome of a payroll run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PayrollReport {
    pub year: i32,
    pub month: u32,
    pub status: PayrollStatus,
    pub run_id: Option<Uuid>,
    /// Salary transactions created by this call
    pub created: usize,
    pub total: Decimal,
    pub failures: Vec<PayrollFailure>,
}

/// Whether a month has been processed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PayrollMonthStatus {
    pub year: i32,
    pub month: u32,
    pub processed: bool,
    pub run_id: Option<Uuid>,
    pub transaction_count: usize,
    pub total: Decimal,
}

/// First day of the period, rejecting months outside 1..=12
pub fn period_start(year: i32, month: u32) -> CoreResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| CoreError::Validation(format!("Invalid payroll period {}-{}", year, month)))
}

/// `Monthly Salary - Jane (March 2026)`
pub fn salary_description(name: &str, period: NaiveDate) -> String {
    format!("Monthly Salary - {} ({})", name, period.format("%B %Y"))
}

impl Store {
    /// Pay every active fixed employee with a salary for one month.
    ///
    /// Defaults to the current month. Eligible employees are read first, then
    /// the `payroll_runs` row is inserted; a duplicate period means the month
    /// was already processed and the call reports `AlreadyRun` without
    /// creating anything. Once the month is claimed nothing is raised: salary
    /// insert failures and a failed summary update make the run `Partial`.
    pub async fn run_payroll(
        &self,
        caller: &Caller,
        period: Option<(i32, u32)>,
    ) -> CoreResult<PayrollReport> {
        caller.require_admin("run payroll")?;

        let today = Utc::now().date_naive();
        let (year, month) = period.unwrap_or((today.year(), today.month()));
        let start = period_start(year, month)?;

        // Read before claiming the month
        let employees = employee::Entity::find()
            .filter(employee::Column::Status.eq(EmployeeStatus::Active))
            .filter(employee::Column::EmploymentType.eq(EmploymentType::Fixed))
            .filter(employee::Column::Salary.is_not_null())
            .order_by_asc(employee::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let run = payroll_run::ActiveModel {
            id: Set(Uuid::new_v4()),
            year: Set(year),
            month: Set(month as i32),
            employee_count: Set(0),
            total: Set(Decimal::ZERO),
            triggered_by: Set(caller.user_id),
            created_at: Set(Utc::now()),
        };
        let run = match run.insert(&self.db).await.map_err(CoreError::from) {
            Ok(run) => run,
            Err(CoreError::Conflict(_)) => {
                info!("Payroll for {} already processed", start.format("%Y-%m"));
                return Ok(PayrollReport {
                    year,
                    month,
                    status: PayrollStatus::AlreadyRun,
                    run_id: None,
                    created: 0,
                    total: Decimal::ZERO,
                    failures: Vec::new(),
                });
            }
            Err(e) => return Err(e),
        };

        let mut created = 0usize;
        let mut total = Decimal::ZERO;
        let mut failures = Vec::new();

        for employee in employees {
            let salary = match employee.salary.map(money::round) {
                Some(salary) if salary > Decimal::ZERO => salary,
                _ => continue,
            };

            let expense = transaction::ActiveModel {
                id: Set(Uuid::new_v4()),
                kind: Set(TransactionKind::Expense),
                amount: Set(salary),
                category: Set(SALARY_CATEGORY.to_string()),
                description: Set(salary_description(&employee.name, start)),
                date: Set(today),
                project_id: Set(None),
                employee_id: Set(Some(employee.id)),
                invoice_id: Set(None),
                payroll_run_id: Set(Some(run.id)),
                created_at: Set(Utc::now()),
            };

            match expense.insert(&self.db).await {
                Ok(_) => {
                    created += 1;
                    total += salary;
                }
                Err(e) => {
                    warn!("Salary for {} ({}) failed: {}", employee.name, employee.id, e);
                    failures.push(PayrollFailure {
                        employee_id: employee.id,
                        name: employee.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let total = money::round(total);
        let run_id = run.id;
        let mut active: payroll_run::ActiveModel = run.into();
        active.employee_count = Set(created as i32);
        active.total = Set(total);

        // The salaries are already committed; a stale summary row is reported, not raised
        let summary_saved = match active.update(&self.db).await {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    "Payroll run {} paid {} employees but its totals were not saved: {}",
                    run_id, created, e
                );
                false
            }
        };

        let status = if failures.is_empty() && summary_saved {
            PayrollStatus::Completed
        } else {
            PayrollStatus::Partial
        };

        info!(
            "Payroll for {} paid {} employees, total {} ({} failed)",
            start.format("%Y-%m"),
            created,
            total,
            failures.len()
        );
        self.audit
            .record(
                caller,
                AuditAction::RunPayroll,
                format!(
                    "Ran payroll for {}: {} employees, total {}",
                    start.format("%B %Y"),
                    created,
                    total
                ),
            )
            .await;

        Ok(PayrollReport {
            year,
            month,
            status,
            run_id: Some(run_id),
            created,
            total,
            failures,
        })
    }

    pub async fn payroll_status(&self, year: i32, month: u32) -> CoreResult<PayrollMonthStatus> {
        period_start(year, month)?;

        let run = payroll_run::Entity::find()
            .filter(payroll_run::Column::Year.eq(year))
            .filter(payroll_run::Column::Month.eq(month as i32))
            .one(&self.db)
            .await?;

        let Some(run) = run else {
            return Ok(PayrollMonthStatus {
                year,
                month,
                processed: false,
                run_id: None,
                transaction_count: 0,
                total: Decimal::ZERO,
            });
        };

        let salaries = transaction::Entity::find()
            .filter(transaction::Column::PayrollRunId.eq(run.id))
            .all(&self.db)
            .await?;

        Ok(PayrollMonthStatus {
            year,
            month,
            processed: true,
            run_id: Some(run.id),
            transaction_count: salaries.len(),
            total: money::sum(salaries.iter().map(|t| t.amount)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salary_description() {
        let period = period_start(2026, 3).unwrap();
        assert_eq!(
            salary_description("Jane Doe", period),
            "Monthly Salary - Jane Doe (March 2026)"
        );
    }

    #[test]
    fn test_period_start_rejects_bad_month() {
        assert!(period_start(2026, 0).is_err());
        assert!(period_start(2026, 13).is_err());
        assert!(period_start(2026, 12).is_ok());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&PayrollStatus::AlreadyRun).unwrap();
        assert_eq!(json, "\"already_run\"");
    }
}
