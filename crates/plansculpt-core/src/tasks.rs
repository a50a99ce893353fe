//! Project tasks and the atomic task payment

use chrono::Utc;
use plansculpt_db::entities::{
    employee, project,
    task::{self, PaymentStatus, TaskStatus},
    transaction::{self, TransactionKind},
};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::access::Caller;
use crate::audit::AuditAction;
use crate::error::{CoreError, CoreResult};
use crate::money;
use crate::store::Store;

/// Expense category used for task payments
pub const LABOR_CATEGORY: &str = "Labor";

/// Create or full-update request for a task
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct TaskInput {
    pub title: String,
    pub project_id: Uuid,
    /// Employee on record doing the work
    #[serde(default)]
    pub assignee_id: Option<Uuid>,
    /// Free-text assignee for people without an employee record
    #[serde(default)]
    pub assignee_name: Option<String>,
    /// Defaults to 0
    #[serde(default)]
    pub cost: Option<Decimal>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

impl TaskInput {
    pub(crate) fn validate(&self) -> CoreResult<(String, Decimal)> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(CoreError::validation("Task title is required"));
        }
        let cost = money::require_non_negative("Cost", self.cost.unwrap_or(Decimal::ZERO))?;
        Ok((title.to_string(), cost))
    }
}

/// Filters for the task list
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub project_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Name shown in the payment description
fn payee_name(assignee: Option<&employee::Model>, label: Option<&str>) -> String {
    match (assignee, label) {
        (Some(employee), _) => employee.name.clone(),
        (None, Some(label)) if !label.trim().is_empty() => label.trim().to_string(),
        _ => "Unassigned".to_string(),
    }
}

pub fn payment_description(title: &str, payee: &str) -> String {
    format!("Task Payment: {} ({})", title, payee)
}

impl Store {
    pub async fn list_tasks(&self, filter: TaskFilter) -> CoreResult<Vec<task::Model>> {
        let mut query = task::Entity::find();
        if let Some(project_id) = filter.project_id {
            query = query.filter(task::Column::ProjectId.eq(project_id));
        }
        if let Some(assignee_id) = filter.assignee_id {
            query = query.filter(task::Column::AssigneeId.eq(assignee_id));
        }

        let tasks = query
            .order_by_desc(task::Column::CreatedAt)
            .all(&self.db)
            .await?;
        debug!("Listed {} tasks", tasks.len());
        Ok(tasks.into_iter().map(normalize).collect())
    }

    pub async fn get_task(&self, id: Uuid) -> CoreResult<task::Model> {
        task::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(normalize)
            .ok_or_else(|| CoreError::not_found("Task", id))
    }

    /// Project must exist; an assignee id must name an existing employee
    async fn check_task_refs<C>(&self, conn: &C, input: &TaskInput) -> CoreResult<()>
    where
        C: ConnectionTrait,
    {
        if project::Entity::find_by_id(input.project_id)
            .one(conn)
            .await?
            .is_none()
        {
            return Err(CoreError::validation(format!(
                "Project {} does not exist",
                input.project_id
            )));
        }

        if let Some(assignee_id) = input.assignee_id {
            if employee::Entity::find_by_id(assignee_id)
                .one(conn)
                .await?
                .is_none()
            {
                return Err(CoreError::validation(format!(
                    "Employee {} does not exist",
                    assignee_id
                )));
            }
        }

        Ok(())
    }

    pub async fn create_task(&self, caller: &Caller, input: TaskInput) -> CoreResult<task::Model> {
        let (title, cost) = input.validate()?;
        self.check_task_refs(&self.db, &input).await?;

        let created = task::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title),
            project_id: Set(input.project_id),
            assignee_id: Set(input.assignee_id),
            assignee_name: Set(non_blank(&input.assignee_name)),
            cost: Set(cost),
            status: Set(input.status.unwrap_or_default()),
            payment_status: Set(PaymentStatus::Pending),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await?;

        info!("Created task {} for project {}", created.id, created.project_id);
        self.audit
            .record(
                caller,
                AuditAction::CreateTask,
                format!(
                    "Created task {} for Project {}",
                    created.id, created.project_id
                ),
            )
            .await;

        Ok(normalize(created))
    }

    /// Replace the editable fields. Payment status only changes through
    /// [`Store::pay_task`], and a paid task keeps its cost.
    pub async fn update_task(
        &self,
        caller: &Caller,
        id: Uuid,
        input: TaskInput,
    ) -> CoreResult<task::Model> {
        let (title, cost) = input.validate()?;
        let existing = self.get_task(id).await?;
        self.check_task_refs(&self.db, &input).await?;

        if existing.payment_status == PaymentStatus::Paid && cost != existing.cost {
            return Err(CoreError::validation(
                "Cost of a paid task cannot be changed",
            ));
        }

        let mut active: task::ActiveModel = existing.into();
        active.title = Set(title);
        active.project_id = Set(input.project_id);
        active.assignee_id = Set(input.assignee_id);
        active.assignee_name = Set(non_blank(&input.assignee_name));
        active.cost = Set(cost);
        if let Some(status) = input.status {
            active.status = Set(status);
        }

        let updated = active.update(&self.db).await?;

        info!("Updated task {}", id);
        self.audit
            .record(
                caller,
                AuditAction::UpdateTask,
                format!("Updated task ID: {}", id),
            )
            .await;

        Ok(normalize(updated))
    }

    pub async fn delete_task(&self, caller: &Caller, id: Uuid) -> CoreResult<()> {
        let existing = self.get_task(id).await?;
        task::Entity::delete_by_id(id).exec(&self.db).await?;

        info!("Deleted task {}", id);
        self.audit
            .record(
                caller,
                AuditAction::DeleteTask,
                format!("Deleted task {} (ID: {})", existing.title, id),
            )
            .await;

        Ok(())
    }

    /// Mark a task paid and book its cost as a Labor expense.
    ///
    /// Both writes happen in one store transaction. The status flip is
    /// guarded on `payment_status <> 'Paid'`, so a second payment finds no
    /// row to update and fails with `Conflict`.
    pub async fn pay_task(&self, caller: &Caller, id: Uuid) -> CoreResult<transaction::Model> {
        let task = task::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::InvalidTask(format!("Invalid task: {} not found", id)))?;

        let cost = money::round(task.cost);
        if cost <= Decimal::ZERO {
            return Err(CoreError::InvalidTask(format!(
                "Invalid task: {} has no cost to pay",
                task.title
            )));
        }
        if task.payment_status == PaymentStatus::Paid {
            return Err(CoreError::Conflict(format!(
                "Task {} is already paid",
                task.title
            )));
        }

        let assignee = match task.assignee_id {
            Some(assignee_id) => employee::Entity::find_by_id(assignee_id).one(&self.db).await?,
            None => None,
        };
        let payee = payee_name(assignee.as_ref(), task.assignee_name.as_deref());

        let txn = self.db.begin().await?;

        let flipped = task::Entity::update_many()
            .col_expr(
                task::Column::PaymentStatus,
                Expr::value(PaymentStatus::Paid.to_value()),
            )
            .filter(task::Column::Id.eq(id))
            .filter(task::Column::PaymentStatus.ne(PaymentStatus::Paid))
            .exec(&txn)
            .await?;

        if flipped.rows_affected != 1 {
            return Err(CoreError::Conflict(format!(
                "Task {} is already paid",
                task.title
            )));
        }

        let expense = transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            kind: Set(TransactionKind::Expense),
            amount: Set(cost),
            category: Set(LABOR_CATEGORY.to_string()),
            description: Set(payment_description(&task.title, &payee)),
            date: Set(Utc::now().date_naive()),
            project_id: Set(Some(task.project_id)),
            employee_id: Set(task.assignee_id),
            invoice_id: Set(None),
            payroll_run_id: Set(None),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!("Paid task {} ({}) to {}", task.title, cost, payee);
        self.audit
            .record(
                caller,
                AuditAction::PayTask,
                format!("Paid task {} ({}) to {}", task.title, cost, payee),
            )
            .await;

        Ok(crate::finance::normalize_transaction(expense))
    }
}

/// Costs come back from SQLite through f64
fn normalize(mut model: task::Model) -> task::Model {
    model.cost = money::round(model.cost);
    model
}
