//! Initial schema: accounts, audit trail, HR, projects, invoicing and ledger

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // 1. Create users table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(User::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(User::Username)
                            .string_len(150)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(User::PasswordHash).string_len(255).not_null())
                    .col(
                        ColumnDef::new(User::Role)
                            .string_len(16)
                            .not_null()
                            .default("user"),
                    )
                    .col(ColumnDef::new(User::FullName).string_len(255).null())
                    .col(ColumnDef::new(User::Email).string_len(255).null())
                    .col(ColumnDef::new(User::Phone).string_len(64).null())
                    .col(ColumnDef::new(User::Dob).date().null())
                    .col(
                        ColumnDef::new(User::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 2. Create activity_logs table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(ActivityLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivityLog::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ActivityLog::UserId).uuid().not_null())
                    .col(ColumnDef::new(ActivityLog::Action).string_len(64).not_null())
                    .col(ColumnDef::new(ActivityLog::Details).text().null())
                    .col(ColumnDef::new(ActivityLog::Ip).string_len(64).null())
                    .col(
                        ColumnDef::new(ActivityLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_logs_user_id")
                            .from(ActivityLog::Table, ActivityLog::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_activity_logs_user_id")
                    .table(ActivityLog::Table)
                    .col(ActivityLog::UserId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 3. Create employees table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Employee::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Employee::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Employee::CustomId)
                            .string_len(32)
                            .null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Employee::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Employee::Role).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Employee::Department)
                            .string_len(255)
                            .not_null()
                            .default("General"),
                    )
                    .col(
                        ColumnDef::new(Employee::EmploymentType)
                            .string_len(20)
                            .not_null()
                            .default("fixed"),
                    )
                    .col(ColumnDef::new(Employee::Salary).decimal_len(12, 2).null())
                    .col(
                        ColumnDef::new(Employee::Status)
                            .string_len(20)
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Employee::Email).string_len(255).null())
                    .col(ColumnDef::new(Employee::Phone).string_len(64).null())
                    .col(ColumnDef::new(Employee::Dob).string_len(32).null())
                    .col(ColumnDef::new(Employee::Gender).string_len(32).null())
                    .col(
                        ColumnDef::new(Employee::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 4. Create projects table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Project::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Project::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Project::CustomId)
                            .string_len(32)
                            .null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Project::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Project::Client).string_len(255).not_null())
                    .col(ColumnDef::new(Project::ClientEmail).string_len(255).null())
                    .col(ColumnDef::new(Project::ClientPhone).string_len(64).null())
                    .col(ColumnDef::new(Project::Description).text().null())
                    .col(
                        ColumnDef::new(Project::Budget)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Project::StartDate).date().null())
                    .col(
                        ColumnDef::new(Project::Status)
                            .string_len(32)
                            .not_null()
                            .default("In Progress"),
                    )
                    .col(
                        ColumnDef::new(Project::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 5. Create tasks table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Task::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Task::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Task::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Task::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(Task::AssigneeId).uuid().null())
                    .col(ColumnDef::new(Task::AssigneeName).string_len(255).null())
                    .col(
                        ColumnDef::new(Task::Cost)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Task::Status)
                            .string_len(32)
                            .not_null()
                            .default("Pending"),
                    )
                    .col(
                        ColumnDef::new(Task::PaymentStatus)
                            .string_len(16)
                            .not_null()
                            .default("Pending"),
                    )
                    .col(
                        ColumnDef::new(Task::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_project_id")
                            .from(Task::Table, Task::ProjectId)
                            .to(Project::Table, Project::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_assignee_id")
                            .from(Task::Table, Task::AssigneeId)
                            .to(Employee::Table, Employee::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tasks_project_id")
                    .table(Task::Table)
                    .col(Task::ProjectId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tasks_assignee_id")
                    .table(Task::Table)
                    .col(Task::AssigneeId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 6. Create payroll_runs table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(PayrollRun::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PayrollRun::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PayrollRun::Year).integer().not_null())
                    .col(ColumnDef::new(PayrollRun::Month).integer().not_null())
                    .col(
                        ColumnDef::new(PayrollRun::EmployeeCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PayrollRun::Total)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(PayrollRun::TriggeredBy).uuid().not_null())
                    .col(
                        ColumnDef::new(PayrollRun::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_payroll_runs_period")
                    .table(PayrollRun::Table)
                    .col(PayrollRun::Year)
                    .col(PayrollRun::Month)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 7. Create invoices table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Invoice::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Invoice::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Invoice::ProjectId).uuid().null())
                    .col(ColumnDef::new(Invoice::ClientName).string_len(255).null())
                    .col(ColumnDef::new(Invoice::ClientEmail).string_len(255).null())
                    .col(
                        ColumnDef::new(Invoice::Total)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Invoice::Status)
                            .string_len(16)
                            .not_null()
                            .default("Draft"),
                    )
                    .col(ColumnDef::new(Invoice::Date).date().not_null())
                    .col(ColumnDef::new(Invoice::DueDate).date().null())
                    .col(
                        ColumnDef::new(Invoice::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invoices_project_id")
                            .from(Invoice::Table, Invoice::ProjectId)
                            .to(Project::Table, Project::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_invoices_project_id")
                    .table(Invoice::Table)
                    .col(Invoice::ProjectId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 8. Create invoice_line_items table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(InvoiceLineItem::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InvoiceLineItem::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(InvoiceLineItem::InvoiceId).uuid().not_null())
                    .col(
                        ColumnDef::new(InvoiceLineItem::Position)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(InvoiceLineItem::Description)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InvoiceLineItem::Quantity)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InvoiceLineItem::UnitPrice)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invoice_line_items_invoice_id")
                            .from(InvoiceLineItem::Table, InvoiceLineItem::InvoiceId)
                            .to(Invoice::Table, Invoice::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_invoice_line_items_invoice_id")
                    .table(InvoiceLineItem::Table)
                    .col(InvoiceLineItem::InvoiceId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 9. Create transactions table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Transaction::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transaction::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transaction::Kind).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Transaction::Amount)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transaction::Category)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transaction::Description)
                            .string_len(255)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Transaction::Date).date().not_null())
                    .col(ColumnDef::new(Transaction::ProjectId).uuid().null())
                    .col(ColumnDef::new(Transaction::EmployeeId).uuid().null())
                    .col(ColumnDef::new(Transaction::InvoiceId).uuid().null())
                    .col(ColumnDef::new(Transaction::PayrollRunId).uuid().null())
                    .col(
                        ColumnDef::new(Transaction::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_project_id")
                            .from(Transaction::Table, Transaction::ProjectId)
                            .to(Project::Table, Project::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_employee_id")
                            .from(Transaction::Table, Transaction::EmployeeId)
                            .to(Employee::Table, Employee::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_invoice_id")
                            .from(Transaction::Table, Transaction::InvoiceId)
                            .to(Invoice::Table, Invoice::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_payroll_run_id")
                            .from(Transaction::Table, Transaction::PayrollRunId)
                            .to(PayrollRun::Table, PayrollRun::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one settling transaction per invoice (NULLs are distinct)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_transactions_invoice_id")
                    .table(Transaction::Table)
                    .col(Transaction::InvoiceId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_transactions_project_id")
                    .table(Transaction::Table)
                    .col(Transaction::ProjectId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_transactions_employee_id")
                    .table(Transaction::Table)
                    .col(Transaction::EmployeeId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_transactions_date")
                    .table(Transaction::Table)
                    .col(Transaction::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order (respecting foreign keys)
        manager
            .drop_table(Table::drop().table(Transaction::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(InvoiceLineItem::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Invoice::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(PayrollRun::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Task::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Project::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Employee::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ActivityLog::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await?;

        Ok(())
    }
}

// ============================================================
// Table identifiers
// ============================================================

#[derive(DeriveIden)]
enum User {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Username,
    PasswordHash,
    Role,
    FullName,
    Email,
    Phone,
    Dob,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ActivityLog {
    #[sea_orm(iden = "activity_logs")]
    Table,
    Id,
    UserId,
    Action,
    Details,
    Ip,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Employee {
    #[sea_orm(iden = "employees")]
    Table,
    Id,
    CustomId,
    Name,
    Role,
    Department,
    EmploymentType,
    Salary,
    Status,
    Email,
    Phone,
    Dob,
    Gender,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Project {
    #[sea_orm(iden = "projects")]
    Table,
    Id,
    CustomId,
    Name,
    Client,
    ClientEmail,
    ClientPhone,
    Description,
    Budget,
    StartDate,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Task {
    #[sea_orm(iden = "tasks")]
    Table,
    Id,
    Title,
    ProjectId,
    AssigneeId,
    AssigneeName,
    Cost,
    Status,
    PaymentStatus,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PayrollRun {
    #[sea_orm(iden = "payroll_runs")]
    Table,
    Id,
    Year,
    Month,
    EmployeeCount,
    Total,
    TriggeredBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Invoice {
    #[sea_orm(iden = "invoices")]
    Table,
    Id,
    ProjectId,
    ClientName,
    ClientEmail,
    Total,
    Status,
    Date,
    DueDate,
    CreatedAt,
}

#[derive(DeriveIden)]
enum InvoiceLineItem {
    #[sea_orm(iden = "invoice_line_items")]
    Table,
    Id,
    InvoiceId,
    Position,
    Description,
    Quantity,
    UnitPrice,
}

#[derive(DeriveIden)]
enum Transaction {
    #[sea_orm(iden = "transactions")]
    Table,
    Id,
    Kind,
    Amount,
    Category,
    Description,
    Date,
    ProjectId,
    EmployeeId,
    InvoiceId,
    PayrollRunId,
    CreatedAt,
}
