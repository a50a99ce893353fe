//! Best-effort activity trail

use chrono::Utc;
use plansculpt_db::entities::activity_log;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::access::Caller;
use crate::error::CoreResult;

/// Tags stored in `activity_logs.action`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Login,
    CreateUser,
    DeleteUser,
    ChangePassword,
    ChangeRole,
    CreateEmployee,
    UpdateEmployee,
    DeleteEmployee,
    CreateProject,
    UpdateProject,
    DeleteProject,
    CreateTask,
    UpdateTask,
    DeleteTask,
    PayTask,
    CreateInvoice,
    UpdateInvoice,
    DeleteInvoice,
    CreateTransaction,
    DeleteTransaction,
    RunPayroll,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "LOGIN",
            AuditAction::CreateUser => "CREATE_USER",
            AuditAction::DeleteUser => "DELETE_USER",
            AuditAction::ChangePassword => "CHANGE_PASSWORD",
            AuditAction::ChangeRole => "CHANGE_ROLE",
            AuditAction::CreateEmployee => "CREATE_EMPLOYEE",
            AuditAction::UpdateEmployee => "UPDATE_EMPLOYEE",
            AuditAction::DeleteEmployee => "DELETE_EMPLOYEE",
            AuditAction::CreateProject => "CREATE_PROJECT",
            AuditAction::UpdateProject => "UPDATE_PROJECT",
            AuditAction::DeleteProject => "DELETE_PROJECT",
            AuditAction::CreateTask => "CREATE_TASK",
            AuditAction::UpdateTask => "UPDATE_TASK",
            AuditAction::DeleteTask => "DELETE_TASK",
            AuditAction::PayTask => "PAY_TASK",
            AuditAction::CreateInvoice => "CREATE_INVOICE",
            AuditAction::UpdateInvoice => "UPDATE_INVOICE",
            AuditAction::DeleteInvoice => "DELETE_INVOICE",
            AuditAction::CreateTransaction => "CREATE_TRANSACTION",
            AuditAction::DeleteTransaction => "DELETE_TRANSACTION",
            AuditAction::RunPayroll => "RUN_PAYROLL",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Appends rows to `activity_logs`
#[derive(Clone)]
pub struct AuditLog {
    db: DatabaseConnection,
}

impl AuditLog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Record an action after the business operation committed.
    ///
    /// Failures are logged and swallowed; they never fail the operation.
    pub async fn record(&self, caller: &Caller, action: AuditAction, details: impl Into<String>) {
        let details = details.into();
        debug!(
            "Audit {} by {} ({}): {}",
            action, caller.username, caller.user_id, details
        );

        let entry = activity_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(caller.user_id),
            action: Set(action.as_str().to_string()),
            details: Set(Some(details)),
            ip: Set(caller.ip.clone()),
            created_at: Set(Utc::now()),
        };

        if let Err(e) = entry.insert(&self.db).await {
            warn!(
                "Failed to record activity {} for user {}: {}",
                action, caller.user_id, e
            );
        }
    }

    /// Activity of one user, newest first
    pub async fn for_user(&self, user_id: Uuid) -> CoreResult<Vec<activity_log::Model>> {
        Ok(activity_log::Entity::find()
            .filter(activity_log::Column::UserId.eq(user_id))
            .order_by_desc(activity_log::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }
}
