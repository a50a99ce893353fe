//! API Middleware

pub mod auth;

pub use auth::{client_ip, request_ip, require_auth};
