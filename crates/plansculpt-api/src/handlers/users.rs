//! User administration (admin only)

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use plansculpt_core::{Caller, UserInput};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::{ActivityEntry, ErrorResponse, PasswordResetRequest, RoleChangeRequest, User};
use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "Users, newest first", body = Vec<User>),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<Vec<User>>> {
    let users = state.store.list_users(&caller).await?;
    Ok(Json(users.into_iter().map(User::from).collect()))
}

/// Create an account with any role
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = UserInput,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 409, description = "Username taken", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<UserInput>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let created = state.store.create_user(&caller, input).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Delete an account and its activity log
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Admin role required, or deleting yourself", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.store.delete_user(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/password",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = PasswordResetRequest,
    responses(
        (status = 204, description = "Password reset"),
        (status = 400, description = "Password too short", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(req): Json<PasswordResetRequest>,
) -> ApiResult<StatusCode> {
    state.store.reset_password(&caller, id, &req.password).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = RoleChangeRequest,
    responses(
        (status = 200, description = "Role changed", body = User),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn change_role(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(req): Json<RoleChangeRequest>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.store.change_role(&caller, id, req.role).await?.into()))
}

/// Audit trail of one account, newest first
#[utoipa::path(
    get,
    path = "/api/users/{id}/activity",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Activity entries", body = Vec<ActivityEntry>),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn user_activity(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ActivityEntry>>> {
    let entries = state.store.user_activity(&caller, id).await?;
    Ok(Json(entries.into_iter().map(ActivityEntry::from).collect()))
}
