use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use plansculpt_core::{Caller, TaskFilter, TaskInput};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::{ErrorResponse, Task, TaskQuery, Transaction};
use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/tasks",
    params(
        ("project_id" = Option<Uuid>, Query, description = "Filter by project"),
        ("assignee_id" = Option<Uuid>, Query, description = "Filter by assigned employee")
    ),
    responses(
        (status = 200, description = "Tasks", body = Vec<Task>)
    ),
    security(("bearer_auth" = [])),
    tag = "tasks"
)]
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TaskQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = state
        .store
        .list_tasks(TaskFilter {
            project_id: query.project_id,
            assignee_id: query.assignee_id,
        })
        .await?;
    Ok(Json(tasks.into_iter().map(Task::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = TaskInput,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tasks"
)]
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<TaskInput>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let created = state.store.create_task(&caller, input).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task ID")),
    request_body = TaskInput,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tasks"
)]
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(input): Json<TaskInput>,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.store.update_task(&caller, id, input).await?.into()))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tasks"
)]
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.store.delete_task(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mark a task paid and book its cost as a Labor expense
#[utoipa::path(
    post,
    path = "/api/tasks/{id}/pay",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 201, description = "Expense transaction created", body = Transaction),
        (status = 400, description = "Task missing or has no cost", body = ErrorResponse),
        (status = 409, description = "Task already paid", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tasks"
)]
pub async fn pay_task(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let expense = state.store.pay_task(&caller, id).await?;
    Ok((StatusCode::CREATED, Json(expense.into())))
}
