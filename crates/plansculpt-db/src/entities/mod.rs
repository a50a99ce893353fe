//! Database entities

pub mod activity_log;
pub mod employee;
pub mod id_sequence;
pub mod invoice;
pub mod invoice_line_item;
pub mod payroll_run;
pub mod project;
pub mod task;
pub mod transaction;
pub mod user;

pub use activity_log::Entity as ActivityLog;
pub use employee::Entity as Employee;
pub use id_sequence::Entity as IdSequence;
pub use invoice::Entity as Invoice;
pub use invoice_line_item::Entity as InvoiceLineItem;
pub use payroll_run::Entity as PayrollRun;
pub use project::Entity as Project;
pub use task::Entity as Task;
pub use transaction::Entity as Transaction;
pub use user::Entity as User;

pub mod prelude {
    pub use super::activity_log::Entity as ActivityLog;
    pub use super::employee::Entity as Employee;
    pub use super::id_sequence::Entity as IdSequence;
    pub use super::invoice::Entity as Invoice;
    pub use super::invoice_line_item::Entity as InvoiceLineItem;
    pub use super::payroll_run::Entity as PayrollRun;
    pub use super::project::Entity as Project;
    pub use super::task::Entity as Task;
    pub use super::transaction::Entity as Transaction;
    pub use super::user::Entity as User;
}
