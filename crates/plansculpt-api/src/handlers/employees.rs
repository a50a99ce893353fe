use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use plansculpt_core::{Caller, EmployeeEarnings, EmployeeInput};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::{Employee, EmployeeQuery, ErrorResponse};
use crate::AppState;

/// List employees, newest first
#[utoipa::path(
    get,
    path = "/api/employees",
    params(
        ("status" = Option<String>, Query, description = "Filter by status (active, inactive, on_leave)")
    ),
    responses(
        (status = 200, description = "Employees", body = Vec<Employee>)
    ),
    security(("bearer_auth" = [])),
    tag = "employees"
)]
pub async fn list_employees(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EmployeeQuery>,
) -> ApiResult<Json<Vec<Employee>>> {
    let employees = state.store.list_employees(query.status).await?;
    Ok(Json(employees.into_iter().map(Employee::from).collect()))
}

/// Create an employee with the next `E-{seq}-{year}` id
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = EmployeeInput,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "employees"
)]
pub async fn create_employee(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<EmployeeInput>,
) -> ApiResult<(StatusCode, Json<Employee>)> {
    let created = state.store.create_employee(&caller, input).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee", body = Employee),
        (status = 404, description = "Employee not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "employees"
)]
pub async fn get_employee(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Employee>> {
    Ok(Json(state.store.get_employee(id).await?.into()))
}

#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee ID")),
    request_body = EmployeeInput,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Employee not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "employees"
)]
pub async fn update_employee(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(input): Json<EmployeeInput>,
) -> ApiResult<Json<Employee>> {
    Ok(Json(state.store.update_employee(&caller, id, input).await?.into()))
}

/// Delete an employee with their tasks and transactions (admin only)
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 204, description = "Employee deleted"),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Employee not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "employees"
)]
pub async fn delete_employee(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.store.delete_employee(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Total paid to an employee and freelance pay still owed
#[utoipa::path(
    get,
    path = "/api/employees/{id}/earnings",
    params(("id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Earnings", body = EmployeeEarnings),
        (status = 404, description = "Employee not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "employees"
)]
pub async fn employee_earnings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<EmployeeEarnings>> {
    Ok(Json(state.store.employee_earnings(id).await?))
}
