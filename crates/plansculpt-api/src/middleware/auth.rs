//! Bearer token authentication
//!
//! Extracts the session JWT from the `Authorization` header, validates it,
//! loads the account it names and makes a [`Caller`] available to handlers
//! via Axum's `Extension`.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use plansculpt_auth::JwtError;
use plansculpt_core::{entities::user::UserRole, Caller, CoreError};
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

/// Client address: first `X-Forwarded-For` hop, else the socket peer
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

pub fn request_ip(request: &Request) -> Option<String> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    client_ip(request.headers(), peer)
}

/// Authentication middleware for protected routes
///
/// # Errors
/// Returns 401 Unauthorized if:
/// - The Authorization header is missing (`MISSING_AUTH`)
/// - It is not `Bearer <token>` (`INVALID_AUTH_FORMAT`)
/// - The token is malformed, expired, or not a session token, or the
///   account it names no longer exists (`INVALID_TOKEN`)
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("MISSING_AUTH", "Missing Authorization header"))?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::unauthorized(
            "INVALID_AUTH_FORMAT",
            "Invalid Authorization header format. Expected 'Bearer <token>'",
        )
    })?;

    let claims = state.validator.validate(token).map_err(|e| match e {
        JwtError::TokenExpired => ApiError::unauthorized("INVALID_TOKEN", "Token expired"),
        _ => ApiError::unauthorized("INVALID_TOKEN", "Invalid or expired token"),
    })?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::unauthorized("INVALID_TOKEN", "Token subject is not a user id"))?;
    if UserRole::parse(&claims.role).is_none() {
        return Err(ApiError::unauthorized(
            "INVALID_TOKEN",
            format!("Unknown role '{}' in token", claims.role),
        ));
    }

    // The stored account decides the role, so role changes apply at once
    let user = state.store.get_user(user_id).await.map_err(|e| match e {
        CoreError::NotFound { .. } => {
            ApiError::unauthorized("INVALID_TOKEN", "Account no longer exists")
        }
        other => ApiError::from(other),
    })?;

    let caller = Caller::from_user(&user).with_ip(request_ip(&request));
    debug!(
        "Authenticated {} ({}) for {}",
        caller.username,
        caller.role.as_str(),
        request.uri().path()
    );

    request.extensions_mut().insert(caller);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();

        assert_eq!(
            client_ip(&headers, Some(peer)),
            Some("203.0.113.9".to_string())
        );
        assert_eq!(
            client_ip(&HeaderMap::new(), Some(peer)),
            Some("127.0.0.1".to_string())
        );
        assert_eq!(client_ip(&HeaderMap::new(), None), None);
    }
}
