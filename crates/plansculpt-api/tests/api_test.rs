//! HTTP-level tests for the Plansculpt router

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use plansculpt_api::{
    models::{AuthResponse, Transaction, User},
    ApiServer, ApiServerConfig,
};
use plansculpt_core::{entities::user::UserRole, Store};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt; // For `oneshot` method

const ADMIN_PASSWORD: &str = "admin-pass-1";

/// Router over a fresh in-memory database with an `admin` account
async fn create_test_app() -> (Router, Store) {
    let db = plansculpt_db::open("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    let store = Store::new(db);
    store
        .create_admin("admin", ADMIN_PASSWORD, Some("Admin".to_string()))
        .await
        .expect("Failed to seed admin");

    let config = ApiServerConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        enable_cors: true,
        cors_origins: None,
        jwt_secret: "test-secret".to_string(),
    };

    (ApiServer::new(config, store.clone()).build_router(), store)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(uri).method(method);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    let auth: AuthResponse = serde_json::from_value(body).unwrap();
    auth.token
}

async fn register(app: &Router, username: &str) -> AuthResponse {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": username, "password": "member-pass-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
    serde_json::from_value(body).unwrap()
}

#[tokio::test]
async fn test_health_check_is_public() {
    let (app, _) = create_test_app().await;

    let (status, body) = send(&app, "GET", "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (app, _) = create_test_app().await;

    let (status, body) = send(&app, "GET", "/api/openapi.json", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/payroll/run"].is_object());
}

#[tokio::test]
async fn test_register_login_and_me() {
    let (app, _) = create_test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "username": "dana",
            "password": "member-pass-1",
            "role": "admin",
            "full_name": "Dana Smith"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let registered: AuthResponse = serde_json::from_value(body).unwrap();
    assert_eq!(registered.user.role, UserRole::User);
    assert!(!registered.token.is_empty());

    let token = login(&app, "dana", "member-pass-1").await;
    let (status, body) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let me: User = serde_json::from_value(body.clone()).unwrap();
    assert_eq!(me.username, "dana");
    assert_eq!(me.full_name.as_deref(), Some("Dana Smith"));
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let (app, _) = create_test_app().await;
    register(&app, "dana").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": "dana", "password": "another-pass" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_login_wrong_password() {
    let (app, _) = create_test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "wrong-password" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid username or password");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let (app, _) = create_test_app().await;

    let (status, body) = send(&app, "GET", "/api/employees", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "MISSING_AUTH");

    let (status, body) = send(&app, "GET", "/api/employees", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_token_of_deleted_account_is_rejected() {
    let (app, _) = create_test_app().await;
    let member = register(&app, "dana").await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/users/{}", member.user.id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", "/api/auth/me", Some(&member.token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_non_admin_cannot_delete_employee() {
    let (app, _) = create_test_app().await;
    let member = register(&app, "dana").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/employees",
        Some(&member.token),
        Some(json!({ "name": "Alice", "role": "Engineer", "salary": "1000" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let id = body["id"].as_str().unwrap().to_string();
    assert!(body["custom_id"].as_str().unwrap().starts_with("E-001-"));

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/employees/{}", id),
        Some(&member.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let admin = login(&app, "admin", ADMIN_PASSWORD).await;
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/employees/{}", id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_task_payment_happens_once() {
    let (app, _) = create_test_app().await;
    let token = login(&app, "admin", ADMIN_PASSWORD).await;

    let (_, project) = send(
        &app,
        "POST",
        "/api/projects",
        Some(&token),
        Some(json!({ "name": "Website", "client": "Acme", "budget": "3000" })),
    )
    .await;
    let project_id = project["id"].as_str().unwrap().to_string();

    let (status, task) = send(
        &app,
        "POST",
        "/api/tasks",
        Some(&token),
        Some(json!({
            "title": "Landing page",
            "project_id": project_id,
            "assignee_name": "Bob Freelancer",
            "cost": "500"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", task);
    let pay_uri = format!("/api/tasks/{}/pay", task["id"].as_str().unwrap());

    let (status, body) = send(&app, "POST", &pay_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let payment: Transaction = serde_json::from_value(body).unwrap();
    assert_eq!(payment.amount, dec!(500));
    assert!(payment.description.contains("Bob Freelancer"));

    let (status, body) = send(&app, "POST", &pay_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (_, project) = send(
        &app,
        "GET",
        &format!("/api/projects/{}", project_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(project["rollup"]["actual_expenses"], "500.00");
}

#[tokio::test]
async fn test_bulk_transactions_are_all_or_nothing() {
    let (app, _) = create_test_app().await;
    let token = login(&app, "admin", ADMIN_PASSWORD).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/transactions",
        Some(&token),
        Some(json!([
            { "kind": "income", "amount": "1000", "category": "Sales", "date": "2026-03-01" },
            { "kind": "expense", "amount": "250.5", "category": "Rent", "date": "2026-03-02" }
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body.as_array().map(Vec::len), Some(2));

    let (status, body) = send(
        &app,
        "POST",
        "/api/transactions",
        Some(&token),
        Some(json!([
            { "kind": "income", "amount": "10", "category": "Sales" },
            { "kind": "expense", "amount": "0", "category": "Rent" }
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send(&app, "GET", "/api/transactions", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let listed: Vec<Transaction> = serde_json::from_value(body).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].amount, dec!(250.50));

    let (status, body) = send(
        &app,
        "POST",
        "/api/transactions",
        Some(&token),
        Some(json!({ "kind": "income", "amount": "75", "category": "Consulting" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.is_object());
}

#[tokio::test]
async fn test_statement_ranges() {
    let (app, _) = create_test_app().await;
    let token = login(&app, "admin", ADMIN_PASSWORD).await;

    send(
        &app,
        "POST",
        "/api/transactions",
        Some(&token),
        Some(json!([
            { "kind": "income", "amount": "1000", "category": "Sales", "date": "2026-01-10" },
            { "kind": "expense", "amount": "200", "category": "Rent", "date": "2026-01-20" },
            { "kind": "income", "amount": "300", "category": "Sales", "date": "2026-02-05" }
        ])),
    )
    .await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/finance/statement?start=2026-02-01&end=2026-02-28",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["opening_balance"], "800.00");
    assert_eq!(body["closing_balance"], "1100.00");
    assert_eq!(body["rows"].as_array().map(Vec::len), Some(1));

    let (status, body) = send(
        &app,
        "GET",
        "/api/finance/statement?preset=all-time",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_credits"], "1300.00");
    assert_eq!(body["total_debits"], "200.00");

    let (status, _) = send(
        &app,
        "GET",
        "/api/finance/statement?start=2026-02-01",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "GET",
        "/api/finance/statement?preset=fortnight",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_payroll_run_is_admin_only_and_idempotent() {
    let (app, _) = create_test_app().await;
    let member = register(&app, "dana").await;
    let admin = login(&app, "admin", ADMIN_PASSWORD).await;

    send(
        &app,
        "POST",
        "/api/employees",
        Some(&admin),
        Some(json!({ "name": "Alice", "role": "Engineer", "salary": "1000" })),
    )
    .await;
    send(
        &app,
        "POST",
        "/api/employees",
        Some(&admin),
        Some(json!({ "name": "Ben", "role": "Designer", "salary": "2000" })),
    )
    .await;

    let request = json!({ "year": 2026, "month": 1 });

    let (status, _) = send(
        &app,
        "POST",
        "/api/payroll/run",
        Some(&member.token),
        Some(request.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "POST",
        "/api/payroll/run",
        Some(&admin),
        Some(request.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["created"], 2);
    assert_eq!(body["total"], "3000.00");

    let (_, body) = send(&app, "POST", "/api/payroll/run", Some(&admin), Some(request)).await;
    assert_eq!(body["status"], "already_run");

    let (status, body) = send(&app, "GET", "/api/payroll/2026/1", Some(&member.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processed"], true);
    assert_eq!(body["transaction_count"], 2);
}

#[tokio::test]
async fn test_login_is_recorded_with_forwarded_ip() {
    let (app, _) = create_test_app().await;
    let member = register(&app, "dana").await;

    let request = Request::builder()
        .uri("/api/auth/login")
        .method("POST")
        .header("content-type", "application/json")
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .body(Body::from(
            json!({ "username": "dana", "password": "member-pass-1" }).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let admin = login(&app, "admin", ADMIN_PASSWORD).await;
    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/users/{}/activity", member.user.id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    let login_entry = entries
        .iter()
        .find(|entry| entry["action"] == "LOGIN")
        .expect("login should be recorded");
    assert_eq!(login_entry["ip"], "203.0.113.7");
}

#[tokio::test]
async fn test_admin_cannot_delete_self() {
    let (app, store) = create_test_app().await;
    let token = login(&app, "admin", ADMIN_PASSWORD).await;
    let (admin, _) = store
        .create_admin("admin", ADMIN_PASSWORD, None)
        .await
        .unwrap();

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/users/{}", admin.id),
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You cannot delete your own account");
}
