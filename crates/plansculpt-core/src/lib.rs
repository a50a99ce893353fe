//! Business operations for Plansculpt
//!
//! Every operation is a method on [`Store`], which wraps the database
//! connection opened at start-up. Callers identify themselves with a
//! [`Caller`]; admin-only operations check its role before touching the
//! store, and successful mutations are recorded in the activity log.
//!
//! Multi-row mutations (cascade deletes, task payment, invoice payment
//! linkage, bulk transactions, user deletion) each run in a single store
//! transaction. Payroll is the exception: its salary inserts are independent
//! and failures are reported per employee.

pub mod access;
pub mod audit;
pub mod employees;
pub mod error;
pub mod finance;
pub mod ids;
pub mod invoices;
pub mod money;
pub mod payroll;
pub mod projects;
pub mod store;
pub mod tasks;
pub mod transactions;
pub mod users;

pub use access::Caller;
pub use audit::{AuditAction, AuditLog};
pub use employees::EmployeeInput;
pub use error::{CoreError, CoreResult};
pub use finance::{
    DashboardSummary, EmployeeEarnings, ProjectRollup, Statement, StatementPreset, StatementRow,
};
pub use ids::BackfillReport;
pub use invoices::{InvoiceDetail, InvoiceInput, LineItemInput};
pub use payroll::{PayrollFailure, PayrollMonthStatus, PayrollReport, PayrollStatus};
pub use projects::{ProjectInput, ProjectSummary};
pub use store::Store;
pub use tasks::{TaskFilter, TaskInput};
pub use transactions::{TransactionFilter, TransactionInput};
pub use users::UserInput;

// Entities and enums used in operation signatures
pub use plansculpt_db::entities;
