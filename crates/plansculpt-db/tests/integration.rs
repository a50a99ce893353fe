//! Integration tests for plansculpt-db
//!
//! Tests schema constraints with real SQLite in-memory database

use chrono::{NaiveDate, Utc};
use plansculpt_db::{
    connect,
    entities::{
        activity_log, employee, invoice, invoice_line_item, payroll_run, project, task,
        transaction, user,
    },
    migrate,
};
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

/// Helper to create a test database
async fn setup_test_db() -> sea_orm::DatabaseConnection {
    let db = connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    migrate(&db).await.expect("Failed to run migrations");

    db
}

async fn insert_project(db: &sea_orm::DatabaseConnection, custom_id: &str) -> project::Model {
    project::ActiveModel {
        id: Set(Uuid::new_v4()),
        custom_id: Set(Some(custom_id.to_string())),
        name: Set("Warehouse refit".to_string()),
        client: Set("Acme".to_string()),
        client_email: Set(None),
        client_phone: Set(None),
        description: Set(None),
        budget: Set(dec!(10000)),
        start_date: Set(None),
        status: Set(project::ProjectStatus::InProgress),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to insert project")
}

async fn insert_user(db: &sea_orm::DatabaseConnection, username: &str) -> user::Model {
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        password_hash: Set("$argon2id$placeholder".to_string()),
        role: Set(user::UserRole::User),
        full_name: Set(None),
        email: Set(None),
        phone: Set(None),
        dob: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to insert user")
}

fn income(amount: rust_decimal::Decimal, invoice_id: Option<Uuid>) -> transaction::ActiveModel {
    transaction::ActiveModel {
        id: Set(Uuid::new_v4()),
        kind: Set(transaction::TransactionKind::Income),
        amount: Set(amount),
        category: Set("Invoice Payment".to_string()),
        description: Set(String::new()),
        date: Set(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()),
        project_id: Set(None),
        employee_id: Set(None),
        invoice_id: Set(invoice_id),
        payroll_run_id: Set(None),
        created_at: Set(Utc::now()),
    }
}

#[tokio::test]
async fn test_database_connection() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    let backend = db.get_database_backend();
    assert!(matches!(backend, sea_orm::DatabaseBackend::Sqlite));
}

#[tokio::test]
async fn test_migrations_run_successfully() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    let result = migrate(&db).await;
    assert!(result.is_ok());

    // Running twice is a no-op
    assert!(migrate(&db).await.is_ok());
}

#[tokio::test]
async fn test_employee_defaults_and_decimal_salary() {
    let db = setup_test_db().await;

    let inserted = employee::ActiveModel {
        id: Set(Uuid::new_v4()),
        custom_id: Set(Some("E-001-2026".to_string())),
        name: Set("Jane Doe".to_string()),
        role: Set("Engineer".to_string()),
        department: Set("General".to_string()),
        employment_type: Set(employee::EmploymentType::default()),
        salary: Set(Some(dec!(1500.50))),
        status: Set(employee::EmployeeStatus::default()),
        email: Set(None),
        phone: Set(None),
        dob: Set(None),
        gender: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(&db)
    .await
    .expect("Failed to insert employee");

    let found = employee::Entity::find_by_id(inserted.id)
        .one(&db)
        .await
        .expect("Failed to query")
        .expect("Employee not found");

    assert_eq!(found.employment_type, employee::EmploymentType::Fixed);
    assert_eq!(found.status, employee::EmployeeStatus::Active);
    assert_eq!(found.salary.map(|s| s.round_dp(2)), Some(dec!(1500.50)));
}

#[tokio::test]
async fn test_project_custom_id_is_unique() {
    let db = setup_test_db().await;

    insert_project(&db, "P-12345-2026").await;

    let duplicate = project::ActiveModel {
        id: Set(Uuid::new_v4()),
        custom_id: Set(Some("P-12345-2026".to_string())),
        name: Set("Other".to_string()),
        client: Set("Other".to_string()),
        client_email: Set(None),
        client_phone: Set(None),
        description: Set(None),
        budget: Set(dec!(0)),
        start_date: Set(None),
        status: Set(project::ProjectStatus::NotStarted),
        created_at: Set(Utc::now()),
    }
    .insert(&db)
    .await;

    let err = duplicate.expect_err("duplicate custom id must be rejected");
    assert!(matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    ));
}

#[tokio::test]
async fn test_task_requires_existing_project() {
    let db = setup_test_db().await;

    let orphan = task::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set("Orphan".to_string()),
        project_id: Set(Uuid::new_v4()),
        assignee_id: Set(None),
        assignee_name: Set(None),
        cost: Set(dec!(0)),
        status: Set(task::TaskStatus::Pending),
        payment_status: Set(task::PaymentStatus::Pending),
        created_at: Set(Utc::now()),
    }
    .insert(&db)
    .await;

    assert!(orphan.is_err());
}

#[tokio::test]
async fn test_project_with_tasks_cannot_be_deleted_directly() {
    let db = setup_test_db().await;
    let project = insert_project(&db, "P-10001-2026").await;

    task::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set("Survey".to_string()),
        project_id: Set(project.id),
        assignee_id: Set(None),
        assignee_name: Set(Some("Contractor".to_string())),
        cost: Set(dec!(250)),
        status: Set(task::TaskStatus::Completed),
        payment_status: Set(task::PaymentStatus::Pending),
        created_at: Set(Utc::now()),
    }
    .insert(&db)
    .await
    .expect("Failed to insert task");

    // Children must be removed first
    assert!(project.clone().delete(&db).await.is_err());

    let tasks = task::Entity::find()
        .filter(task::Column::ProjectId.eq(project.id))
        .count(&db)
        .await
        .expect("Failed to count");
    assert_eq!(tasks, 1);
}

#[tokio::test]
async fn test_one_transaction_per_invoice() {
    let db = setup_test_db().await;

    let invoice = invoice::ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(None),
        client_name: Set(Some("Acme".to_string())),
        client_email: Set(None),
        total: Set(dec!(750)),
        status: Set(invoice::InvoiceStatus::Paid),
        date: Set(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()),
        due_date: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(&db)
    .await
    .expect("Failed to insert invoice");

    income(dec!(750), Some(invoice.id))
        .insert(&db)
        .await
        .expect("first linked transaction");

    let second = income(dec!(750), Some(invoice.id)).insert(&db).await;
    let err = second.expect_err("second linked transaction must be rejected");
    assert!(matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    ));

    // Unlinked transactions are unconstrained
    income(dec!(10), None).insert(&db).await.expect("unlinked 1");
    income(dec!(20), None).insert(&db).await.expect("unlinked 2");
}

#[tokio::test]
async fn test_invoice_line_items_follow_invoice() {
    let db = setup_test_db().await;

    let invoice = invoice::ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(None),
        client_name: Set(None),
        client_email: Set(None),
        total: Set(dec!(30)),
        status: Set(invoice::InvoiceStatus::Draft),
        date: Set(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()),
        due_date: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(&db)
    .await
    .expect("Failed to insert invoice");

    for (position, price) in [dec!(10), dec!(20)].into_iter().enumerate() {
        invoice_line_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_id: Set(invoice.id),
            position: Set(position as i32),
            description: Set(format!("Item {}", position + 1)),
            quantity: Set(dec!(1)),
            unit_price: Set(price),
        }
        .insert(&db)
        .await
        .expect("Failed to insert line item");
    }

    let items = invoice
        .find_related(invoice_line_item::Entity)
        .all(&db)
        .await
        .expect("Failed to query items");
    assert_eq!(items.len(), 2);

    invoice.delete(&db).await.expect("Failed to delete invoice");

    let remaining = invoice_line_item::Entity::find()
        .count(&db)
        .await
        .expect("Failed to count");
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn test_payroll_period_is_unique() {
    let db = setup_test_db().await;
    let admin = insert_user(&db, "admin").await;

    let run = |year: i32, month: i32| payroll_run::ActiveModel {
        id: Set(Uuid::new_v4()),
        year: Set(year),
        month: Set(month),
        employee_count: Set(0),
        total: Set(dec!(0)),
        triggered_by: Set(admin.id),
        created_at: Set(Utc::now()),
    };

    run(2024, 3).insert(&db).await.expect("first run");
    run(2024, 4).insert(&db).await.expect("other month");

    let err = run(2024, 3)
        .insert(&db)
        .await
        .expect_err("same period must be rejected");
    assert!(matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    ));
}

#[tokio::test]
async fn test_activity_log_cascades_with_user() {
    let db = setup_test_db().await;
    let user = insert_user(&db, "alice").await;

    activity_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        action: Set("LOGIN".to_string()),
        details: Set(Some("User logged in".to_string())),
        ip: Set(Some("127.0.0.1".to_string())),
        created_at: Set(Utc::now()),
    }
    .insert(&db)
    .await
    .expect("Failed to insert activity");

    user.delete(&db).await.expect("Failed to delete user");

    let remaining = activity_log::Entity::find()
        .count(&db)
        .await
        .expect("Failed to count");
    assert_eq!(remaining, 0);
}
