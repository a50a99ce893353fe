//! Registration, login and the current account

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use chrono::{TimeZone, Utc};
use plansculpt_auth::{JwtValidator, SessionClaims};
use plansculpt_core::{entities::user, Caller, UserInput};
use tracing::{error, info};

use crate::error::{ApiError, ApiResult};
use crate::middleware::client_ip;
use crate::models::{AuthResponse, ErrorResponse, LoginRequest, User};
use crate::AppState;

/// Sign a 24h session token for `user`
fn issue_session(state: &AppState, user: user::Model) -> ApiResult<AuthResponse> {
    let claims = SessionClaims::session(
        user.id.to_string(),
        user.username.clone(),
        user.role.as_str().to_string(),
    );
    let token = JwtValidator::encode(state.jwt_secret.as_bytes(), &claims).map_err(|e| {
        error!("Failed to sign session token: {}", e);
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Failed to issue session token",
        )
    })?;

    Ok(AuthResponse {
        token,
        expires_at: Utc.timestamp_opt(claims.exp, 0).single().unwrap_or_else(Utc::now),
        user: user.into(),
    })
}

/// Create an account; the role is always `user`
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = UserInput,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Username taken", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(input): Json<UserInput>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let created = state.store.register(input).await?;
    info!("New account registered: {}", created.username);

    let response = issue_session(&state, created)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Exchange credentials for a session token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    peer: Option<Extension<ConnectInfo<SocketAddr>>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let ip = client_ip(&headers, peer.map(|Extension(ConnectInfo(addr))| addr));
    let user = state
        .store
        .authenticate(&req.username, &req.password, ip)
        .await?;

    Ok(Json(issue_session(&state, user)?))
}

/// Profile of the authenticated account
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.store.me(&caller).await?.into()))
}
