use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use plansculpt_core::{
    entities::{
        activity_log,
        employee::{self, EmployeeStatus, EmploymentType},
        invoice::InvoiceStatus,
        invoice_line_item,
        project::{self, ProjectStatus},
        task::{self, PaymentStatus, TaskStatus},
        transaction::{self, TransactionKind},
        user::{self, UserRole},
    },
    money, DashboardSummary, InvoiceDetail, ProjectRollup, ProjectSummary, TransactionInput,
};

// ==================== System ====================

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Whether the database answered a ping
    pub database: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

// ==================== Auth & users ====================

/// User account as returned by the API; never carries the password hash
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for User {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            role: model.role,
            full_name: model.full_name,
            email: model.email,
            phone: model.phone,
            dob: model.dob,
            created_at: model.created_at,
        }
    }
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login and registration response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    /// Session token for the `Authorization: Bearer` header
    pub token: String,
    /// Token expiration timestamp
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// Admin password reset
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PasswordResetRequest {
    pub password: String,
}

/// Admin role change
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleChangeRequest {
    pub role: UserRole,
}

/// One activity log entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Action tag such as `LOGIN`
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<activity_log::Model> for ActivityEntry {
    fn from(model: activity_log::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            action: model.action,
            details: model.details,
            ip: model.ip,
            created_at: model.created_at,
        }
    }
}

// ==================== Employees ====================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Employee {
    pub id: Uuid,
    /// `E-{seq}-{year}`
    pub custom_id: Option<String>,
    pub name: String,
    pub role: String,
    pub department: String,
    pub employment_type: EmploymentType,
    pub salary: Option<Decimal>,
    pub status: EmployeeStatus,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<employee::Model> for Employee {
    fn from(model: employee::Model) -> Self {
        Self {
            id: model.id,
            custom_id: model.custom_id,
            name: model.name,
            role: model.role,
            department: model.department,
            employment_type: model.employment_type,
            salary: model.salary,
            status: model.status,
            email: model.email,
            phone: model.phone,
            dob: model.dob,
            gender: model.gender,
            created_at: model.created_at,
        }
    }
}

/// Query for the employee list
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct EmployeeQuery {
    pub status: Option<EmployeeStatus>,
}

// ==================== Projects ====================

/// Project with its derived budget and progress figures
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Project {
    pub id: Uuid,
    /// `P-{5 digits}-{year}`
    pub custom_id: Option<String>,
    pub name: String,
    pub client: String,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub description: Option<String>,
    pub budget: Decimal,
    pub start_date: Option<NaiveDate>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub rollup: Rollup,
}

/// Derived project figures
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Rollup {
    pub actual_income: Decimal,
    pub actual_expenses: Decimal,
    pub remaining_budget: Decimal,
    pub profit: Decimal,
    pub task_count: u64,
    pub completed_task_count: u64,
    /// Percentage of completed tasks
    pub progress: u32,
}

impl From<ProjectRollup> for Rollup {
    fn from(rollup: ProjectRollup) -> Self {
        Self {
            actual_income: rollup.actual_income,
            actual_expenses: rollup.actual_expenses,
            remaining_budget: rollup.remaining_budget,
            profit: rollup.profit,
            task_count: rollup.task_count,
            completed_task_count: rollup.completed_task_count,
            progress: rollup.progress,
        }
    }
}

impl Project {
    fn from_parts(model: project::Model, rollup: ProjectRollup) -> Self {
        Self {
            id: model.id,
            custom_id: model.custom_id,
            name: model.name,
            client: model.client,
            client_email: model.client_email,
            client_phone: model.client_phone,
            description: model.description,
            budget: model.budget,
            start_date: model.start_date,
            status: model.status,
            created_at: model.created_at,
            rollup: rollup.into(),
        }
    }
}

impl From<ProjectSummary> for Project {
    fn from(summary: ProjectSummary) -> Self {
        Self::from_parts(summary.project, summary.rollup)
    }
}

// ==================== Tasks ====================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub project_id: Uuid,
    pub assignee_id: Option<Uuid>,
    /// Free-text assignee label
    pub assignee_name: Option<String>,
    pub cost: Decimal,
    pub status: TaskStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl From<task::Model> for Task {
    fn from(model: task::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            project_id: model.project_id,
            assignee_id: model.assignee_id,
            assignee_name: model.assignee_name,
            cost: model.cost,
            status: model.status,
            payment_status: model.payment_status,
            created_at: model.created_at,
        }
    }
}

/// Query for the task list
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TaskQuery {
    pub project_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
}

// ==================== Transactions ====================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub category: String,
    pub description: String,
    pub date: NaiveDate,
    pub project_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub invoice_id: Option<Uuid>,
    pub payroll_run_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<transaction::Model> for Transaction {
    fn from(model: transaction::Model) -> Self {
        Self {
            id: model.id,
            kind: model.kind,
            amount: model.amount,
            category: model.category,
            description: model.description,
            date: model.date,
            project_id: model.project_id,
            employee_id: model.employee_id,
            invoice_id: model.invoice_id,
            payroll_run_id: model.payroll_run_id,
            created_at: model.created_at,
        }
    }
}

/// Body of `POST /api/transactions`: one transaction or an array of them
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum TransactionPayload {
    Many(Vec<TransactionInput>),
    One(TransactionInput),
}

/// Result of `POST /api/transactions`, shaped like the request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum TransactionCreated {
    Many(Vec<Transaction>),
    One(Transaction),
}

/// Query for the transaction list; dates are inclusive
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TransactionQuery {
    pub project_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub kind: Option<TransactionKind>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

// ==================== Invoices ====================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LineItem {
    pub id: Uuid,
    pub position: i32,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// quantity × unit price
    pub subtotal: Decimal,
}

impl From<invoice_line_item::Model> for LineItem {
    fn from(model: invoice_line_item::Model) -> Self {
        Self {
            subtotal: money::round(model.subtotal()),
            id: model.id,
            position: model.position,
            description: model.description,
            quantity: model.quantity,
            unit_price: model.unit_price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Invoice {
    pub id: Uuid,
    pub project_id: Option<Uuid>,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    /// Always recomputed from the line items
    pub total: Decimal,
    pub status: InvoiceStatus,
    pub date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<LineItem>,
}

impl From<InvoiceDetail> for Invoice {
    fn from(detail: InvoiceDetail) -> Self {
        let invoice = detail.invoice;
        Self {
            id: invoice.id,
            project_id: invoice.project_id,
            client_name: invoice.client_name,
            client_email: invoice.client_email,
            total: invoice.total,
            status: invoice.status,
            date: invoice.date,
            due_date: invoice.due_date,
            created_at: invoice.created_at,
            items: detail.items.into_iter().map(LineItem::from).collect(),
        }
    }
}

// ==================== Finance & payroll ====================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Dashboard {
    pub revenue: Decimal,
    pub expenses: Decimal,
    pub net_income: Decimal,
    /// Total of sent, unpaid invoices
    pub pending_invoice_total: Decimal,
    pub employee_count: u64,
    pub recent_transactions: Vec<Transaction>,
}

impl From<DashboardSummary> for Dashboard {
    fn from(summary: DashboardSummary) -> Self {
        Self {
            revenue: summary.revenue,
            expenses: summary.expenses,
            net_income: summary.net_income,
            pending_invoice_total: summary.pending_invoice_total,
            employee_count: summary.employee_count,
            recent_transactions: summary
                .recent_transactions
                .into_iter()
                .map(Transaction::from)
                .collect(),
        }
    }
}

/// Query for the statement: either `start` and `end`, or a `preset`
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct StatementQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// this-month, last-month, last-6-months, last-1-year,
    /// last-financial-year or all-time
    pub preset: Option<String>,
}

/// Body of `POST /api/payroll/run`; omitted fields mean the current month
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PayrollRunRequest {
    pub year: Option<i32>,
    pub month: Option<u32>,
}
