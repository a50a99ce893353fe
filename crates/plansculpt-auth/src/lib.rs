//! Session tokens and password hashing for Plansculpt accounts

pub mod jwt;
pub mod password;

pub use jwt::{JwtError, JwtValidator, SessionClaims, SESSION_TTL_HOURS};
pub use password::{check_password_policy, hash_password, verify_password, PasswordError};

// Re-export useful types
pub use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Validation};
