//! Derived financial figures
//!
//! Nothing here is persisted: every figure is recomputed from transactions,
//! tasks and invoices on each call.

use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use plansculpt_db::entities::{
    employee::{self, EmploymentType},
    invoice::{self, InvoiceStatus},
    task::{self, PaymentStatus, TaskStatus},
    transaction::{self, TransactionKind},
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::error::{CoreError, CoreResult};
use crate::money;
use crate::store::Store;

/// Number of rows in the dashboard's recent activity list
pub const RECENT_TRANSACTIONS: u64 = 5;

/// Earliest date covered by the all-time statement
pub fn all_time_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Company-wide totals shown on the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub revenue: Decimal,
    pub expenses: Decimal,
    pub net_income: Decimal,
    /// Total of invoices issued but not yet paid
    pub pending_invoice_total: Decimal,
    pub employee_count: u64,
    pub recent_transactions: Vec<transaction::Model>,
}

/// Budget and progress figures for one project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ProjectRollup {
    pub actual_income: Decimal,
    pub actual_expenses: Decimal,
    /// Budget minus income received so far
    pub remaining_budget: Decimal,
    pub profit: Decimal,
    pub task_count: u64,
    pub completed_task_count: u64,
    /// Percentage of completed tasks, 0 when the project has no tasks
    pub progress: u32,
}

impl ProjectRollup {
    pub fn compute<'a, T, K>(budget: Decimal, transactions: T, tasks: K) -> Self
    where
        T: IntoIterator<Item = &'a transaction::Model>,
        K: IntoIterator<Item = &'a task::Model>,
    {
        let mut income = Decimal::ZERO;
        let mut expenses = Decimal::ZERO;
        for txn in transactions {
            match txn.kind {
                TransactionKind::Income => income += txn.amount,
                TransactionKind::Expense => expenses += txn.amount,
            }
        }

        let mut task_count = 0u64;
        let mut completed = 0u64;
        for task in tasks {
            task_count += 1;
            if task.status == TaskStatus::Completed {
                completed += 1;
            }
        }

        Self {
            actual_income: money::round(income),
            actual_expenses: money::round(expenses),
            remaining_budget: money::round(budget - income),
            profit: money::round(income - expenses),
            task_count,
            completed_task_count: completed,
            progress: progress_percent(completed, task_count),
        }
    }
}

fn progress_percent(completed: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    // Half-up rounding in integers
    ((completed * 200 + total) / (2 * total)) as u32
}

/// Pay received and owed for one employee
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct EmployeeEarnings {
    pub employee_id: Uuid,
    /// Sum of expense transactions linked to the employee
    pub total_paid: Decimal,
    /// Completed but unpaid task cost (freelancers only)
    pub pending_pay: Decimal,
}

/// One ledger line of a statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct StatementRow {
    pub transaction_id: Uuid,
    pub date: NaiveDate,
    pub category: String,
    pub description: String,
    pub credit: Decimal,
    pub debit: Decimal,
    /// Balance after this row
    pub balance: Decimal,
}

/// Financial statement for an inclusive date range
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Statement {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub opening_balance: Decimal,
    pub rows: Vec<StatementRow>,
    pub total_credits: Decimal,
    pub total_debits: Decimal,
    pub closing_balance: Decimal,
}

impl Statement {
    /// Build a statement from the opening balance and the in-range rows,
    /// which must already be ordered by date then creation time.
    pub fn build(
        start: NaiveDate,
        end: NaiveDate,
        opening_balance: Decimal,
        transactions: &[transaction::Model],
    ) -> Self {
        let mut balance = money::round(opening_balance);
        let mut total_credits = Decimal::ZERO;
        let mut total_debits = Decimal::ZERO;

        let rows = transactions
            .iter()
            .map(|txn| {
                let amount = money::round(txn.amount);
                let (credit, debit) = match txn.kind {
                    TransactionKind::Income => (amount, money::round(Decimal::ZERO)),
                    TransactionKind::Expense => (money::round(Decimal::ZERO), amount),
                };
                total_credits += credit;
                total_debits += debit;
                balance = money::round(balance + credit - debit);

                StatementRow {
                    transaction_id: txn.id,
                    date: txn.date,
                    category: txn.category.clone(),
                    description: txn.description.clone(),
                    credit,
                    debit,
                    balance,
                }
            })
            .collect();

        Self {
            start,
            end,
            opening_balance: money::round(opening_balance),
            rows,
            total_credits: money::round(total_credits),
            total_debits: money::round(total_debits),
            closing_balance: balance,
        }
    }
}

/// Named statement ranges relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementPreset {
    ThisMonth,
    LastMonth,
    Last6Months,
    Last1Year,
    /// July 1 to June 30 of the most recently completed financial year
    LastFinancialYear,
    AllTime,
}

impl StatementPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementPreset::ThisMonth => "this-month",
            StatementPreset::LastMonth => "last-month",
            StatementPreset::Last6Months => "last-6-months",
            StatementPreset::Last1Year => "last-1-year",
            StatementPreset::LastFinancialYear => "last-financial-year",
            StatementPreset::AllTime => "all-time",
        }
    }

    /// Inclusive (start, end) for the preset as seen on `today`
    pub fn resolve(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let first_of_month = today.with_day(1).unwrap_or(today);

        match self {
            StatementPreset::ThisMonth => (first_of_month, today),
            StatementPreset::LastMonth => {
                let end = first_of_month.pred_opt().unwrap_or(first_of_month);
                (end.with_day(1).unwrap_or(end), end)
            }
            StatementPreset::Last6Months => (
                today.checked_sub_months(Months::new(6)).unwrap_or(today),
                today,
            ),
            StatementPreset::Last1Year => (
                today.checked_sub_months(Months::new(12)).unwrap_or(today),
                today,
            ),
            StatementPreset::LastFinancialYear => {
                let end_year = if today.month() >= 7 {
                    today.year()
                } else {
                    today.year() - 1
                };
                let start = NaiveDate::from_ymd_opt(end_year - 1, 7, 1).unwrap_or(today);
                let end = NaiveDate::from_ymd_opt(end_year, 6, 30).unwrap_or(today);
                (start, end)
            }
            StatementPreset::AllTime => (all_time_start(), today),
        }
    }
}

impl FromStr for StatementPreset {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "this-month" => Ok(StatementPreset::ThisMonth),
            "last-month" => Ok(StatementPreset::LastMonth),
            "last-6-months" => Ok(StatementPreset::Last6Months),
            "last-1-year" => Ok(StatementPreset::Last1Year),
            "last-financial-year" => Ok(StatementPreset::LastFinancialYear),
            "all-time" => Ok(StatementPreset::AllTime),
            other => Err(CoreError::Validation(format!(
                "Unknown statement preset: {}",
                other
            ))),
        }
    }
}

impl Store {
    pub async fn dashboard(&self) -> CoreResult<DashboardSummary> {
        let transactions = transaction::Entity::find().all(&self.db).await?;
        let revenue = money::sum(
            transactions
                .iter()
                .filter(|t| t.kind == TransactionKind::Income)
                .map(|t| t.amount),
        );
        let expenses = money::sum(
            transactions
                .iter()
                .filter(|t| t.kind == TransactionKind::Expense)
                .map(|t| t.amount),
        );

        let pending = invoice::Entity::find()
            .filter(invoice::Column::Status.eq(InvoiceStatus::Sent))
            .all(&self.db)
            .await?;
        let pending_invoice_total = money::sum(pending.iter().map(|i| i.total));

        let employee_count = employee::Entity::find().count(&self.db).await?;

        let recent_transactions = transaction::Entity::find()
            .order_by_desc(transaction::Column::Date)
            .order_by_desc(transaction::Column::CreatedAt)
            .limit(RECENT_TRANSACTIONS)
            .all(&self.db)
            .await?
            .into_iter()
            .map(normalize_transaction)
            .collect();

        debug!(
            "Dashboard over {} transactions, {} pending invoices",
            transactions.len(),
            pending.len()
        );

        Ok(DashboardSummary {
            revenue,
            expenses,
            net_income: money::round(revenue - expenses),
            pending_invoice_total,
            employee_count,
            recent_transactions,
        })
    }

    pub async fn employee_earnings(&self, employee_id: Uuid) -> CoreResult<EmployeeEarnings> {
        let employee = employee::Entity::find_by_id(employee_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("Employee", employee_id))?;

        let paid = transaction::Entity::find()
            .filter(transaction::Column::EmployeeId.eq(employee_id))
            .filter(transaction::Column::Kind.eq(TransactionKind::Expense))
            .all(&self.db)
            .await?;

        let pending_pay = if employee.employment_type == EmploymentType::Freelance {
            let owed = task::Entity::find()
                .filter(task::Column::AssigneeId.eq(employee_id))
                .filter(task::Column::Status.eq(TaskStatus::Completed))
                .filter(task::Column::PaymentStatus.ne(PaymentStatus::Paid))
                .all(&self.db)
                .await?;
            money::sum(owed.iter().map(|t| t.cost))
        } else {
            money::round(Decimal::ZERO)
        };

        Ok(EmployeeEarnings {
            employee_id,
            total_paid: money::sum(paid.iter().map(|t| t.amount)),
            pending_pay,
        })
    }

    /// Statement for `[start, end]`, both inclusive
    pub async fn statement(&self, start: NaiveDate, end: NaiveDate) -> CoreResult<Statement> {
        if start > end {
            return Err(CoreError::Validation(format!(
                "Statement start {} is after end {}",
                start, end
            )));
        }

        let earlier = transaction::Entity::find()
            .filter(transaction::Column::Date.lt(start))
            .all(&self.db)
            .await?;
        let opening = money::sum(earlier.iter().map(|t| money::signed(t.kind, t.amount)));

        let in_range = transaction::Entity::find()
            .filter(transaction::Column::Date.gte(start))
            .filter(transaction::Column::Date.lte(end))
            .order_by_asc(transaction::Column::Date)
            .order_by_asc(transaction::Column::CreatedAt)
            .all(&self.db)
            .await?;

        debug!(
            "Statement {} to {}: {} rows, {} before range",
            start,
            end,
            in_range.len(),
            earlier.len()
        );

        Ok(Statement::build(start, end, opening, &in_range))
    }

    pub async fn statement_for_preset(
        &self,
        preset: StatementPreset,
        today: NaiveDate,
    ) -> CoreResult<Statement> {
        let (start, end) = preset.resolve(today);
        self.statement(start, end).await
    }
}

/// Amounts come back from SQLite through f64
pub(crate) fn normalize_transaction(mut model: transaction::Model) -> transaction::Model {
    model.amount = money::round(model.amount);
    model
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn txn(kind: TransactionKind, amount: Decimal, on: NaiveDate, seq: u32) -> transaction::Model {
        transaction::Model {
            id: Uuid::new_v4(),
            kind,
            amount,
            category: "General".to_string(),
            description: String::new(),
            date: on,
            project_id: None,
            employee_id: None,
            invoice_id: None,
            payroll_run_id: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, seq).unwrap(),
        }
    }

    fn task(status: TaskStatus) -> task::Model {
        task::Model {
            id: Uuid::new_v4(),
            title: "Task".to_string(),
            project_id: Uuid::new_v4(),
            assignee_id: None,
            assignee_name: None,
            cost: dec!(0),
            status,
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_statement_running_balance() {
        let rows = vec![
            txn(TransactionKind::Income, dec!(1000), date(2024, 1, 5), 1),
            txn(TransactionKind::Expense, dec!(400), date(2024, 1, 10), 2),
            txn(TransactionKind::Income, dec!(200), date(2024, 1, 20), 3),
        ];

        let statement = Statement::build(date(2024, 1, 1), date(2024, 1, 31), dec!(0), &rows);
        let balances: Vec<Decimal> = statement.rows.iter().map(|r| r.balance).collect();

        assert_eq!(balances, vec![dec!(1000), dec!(600), dec!(800)]);
        assert_eq!(statement.total_credits, dec!(1200));
        assert_eq!(statement.total_debits, dec!(400));
        assert_eq!(statement.closing_balance, dec!(800));
        assert_eq!(statement.rows[1].credit, dec!(0));
        assert_eq!(statement.rows[1].debit, dec!(400));
    }

    #[test]
    fn test_statement_starts_from_opening_balance() {
        let rows = vec![txn(TransactionKind::Expense, dec!(50), date(2024, 2, 1), 1)];
        let statement = Statement::build(date(2024, 2, 1), date(2024, 2, 29), dec!(300), &rows);

        assert_eq!(statement.opening_balance, dec!(300));
        assert_eq!(statement.closing_balance, dec!(250));
    }

    #[test]
    fn test_empty_statement() {
        let statement = Statement::build(date(2024, 2, 1), date(2024, 2, 29), dec!(-10), &[]);

        assert!(statement.rows.is_empty());
        assert_eq!(statement.closing_balance, dec!(-10));
        assert_eq!(statement.total_credits, dec!(0));
    }

    #[test]
    fn test_presets() {
        let today = date(2026, 3, 15);

        assert_eq!(
            StatementPreset::ThisMonth.resolve(today),
            (date(2026, 3, 1), today)
        );
        assert_eq!(
            StatementPreset::LastMonth.resolve(today),
            (date(2026, 2, 1), date(2026, 2, 28))
        );
        assert_eq!(
            StatementPreset::Last6Months.resolve(today),
            (date(2025, 9, 15), today)
        );
        assert_eq!(
            StatementPreset::Last1Year.resolve(today),
            (date(2025, 3, 15), today)
        );
        assert_eq!(
            StatementPreset::LastFinancialYear.resolve(today),
            (date(2024, 7, 1), date(2025, 6, 30))
        );
        assert_eq!(
            StatementPreset::AllTime.resolve(today),
            (date(2020, 1, 1), today)
        );
    }

    #[test]
    fn test_presets_around_year_boundaries() {
        assert_eq!(
            StatementPreset::LastMonth.resolve(date(2026, 1, 10)),
            (date(2025, 12, 1), date(2025, 12, 31))
        );
        assert_eq!(
            StatementPreset::LastFinancialYear.resolve(date(2025, 8, 1)),
            (date(2024, 7, 1), date(2025, 6, 30))
        );
        assert_eq!(
            StatementPreset::LastFinancialYear.resolve(date(2025, 7, 1)),
            (date(2024, 7, 1), date(2025, 6, 30))
        );
        // Month-end clamps instead of overflowing
        assert_eq!(
            StatementPreset::Last6Months.resolve(date(2026, 8, 31)),
            (date(2026, 2, 28), date(2026, 8, 31))
        );
    }

    #[test]
    fn test_preset_parsing() {
        for preset in [
            StatementPreset::ThisMonth,
            StatementPreset::LastMonth,
            StatementPreset::Last6Months,
            StatementPreset::Last1Year,
            StatementPreset::LastFinancialYear,
            StatementPreset::AllTime,
        ] {
            assert_eq!(preset.as_str().parse::<StatementPreset>().unwrap(), preset);
        }
        assert!("next-week".parse::<StatementPreset>().is_err());
    }

    #[test]
    fn test_project_rollup() {
        let transactions = vec![
            txn(TransactionKind::Income, dec!(3000), date(2024, 1, 1), 1),
            txn(TransactionKind::Expense, dec!(1200), date(2024, 1, 2), 2),
        ];
        let tasks = vec![
            task(TaskStatus::Completed),
            task(TaskStatus::Pending),
            task(TaskStatus::InProgress),
        ];

        let rollup = ProjectRollup::compute(dec!(10000), &transactions, &tasks);

        assert_eq!(rollup.actual_income, dec!(3000));
        assert_eq!(rollup.actual_expenses, dec!(1200));
        assert_eq!(rollup.remaining_budget, dec!(7000));
        assert_eq!(rollup.profit, dec!(1800));
        assert_eq!(rollup.task_count, 3);
        assert_eq!(rollup.completed_task_count, 1);
        assert_eq!(rollup.progress, 33);
    }

    #[test]
    fn test_project_rollup_without_tasks() {
        let rollup = ProjectRollup::compute(
            dec!(500),
            &Vec::<transaction::Model>::new(),
            &Vec::<task::Model>::new(),
        );

        assert_eq!(rollup.progress, 0);
        assert_eq!(rollup.remaining_budget, dec!(500));
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(1, 2), 50);
    }

    #[test]
    fn test_progress_rounds_half_up() {
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(1, 8), 13);
        assert_eq!(progress_percent(3, 8), 38);
        assert_eq!(progress_percent(1, 200), 1);
        assert_eq!(progress_percent(0, 7), 0);
        assert_eq!(progress_percent(7, 7), 100);
    }
}
