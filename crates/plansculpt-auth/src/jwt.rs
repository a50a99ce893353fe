//! JWT (JSON Web Token) handling for login sessions

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifetime of a login session token
pub const SESSION_TTL_HOURS: i64 = 24;

/// Issuer stamped on every token
pub const ISSUER: &str = "plansculpt";

const SESSION_TOKEN_TYPE: &str = "session";

/// JWT claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    /// Subject (user UUID)
    pub sub: String,
    /// Login name at issue time
    pub username: String,
    /// Role at issue time (`admin` or `user`)
    pub role: String,
    /// Token kind, always `session` for tokens issued by login
    pub token_type: String,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

impl SessionClaims {
    pub fn new(user_id: String, username: String, role: String, validity: Duration) -> Self {
        let now = Utc::now();
        let exp = now + validity;

        Self {
            sub: user_id,
            username,
            role,
            token_type: SESSION_TOKEN_TYPE.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: ISSUER.to_string(),
        }
    }

    /// Standard 24h login session
    pub fn session(user_id: String, username: String, role: String) -> Self {
        Self::new(user_id, username, role, Duration::hours(SESSION_TTL_HOURS))
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// JWT errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT encoding error: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,
}

/// HS256 validator for session tokens
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    /// Create a new JWT validator using HMAC-SHA256 (symmetric secret)
    ///
    /// Validates the signature, the expiration, and the `plansculpt` issuer.
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_issuer(&[ISSUER]);

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn validate(&self, token: &str) -> Result<SessionClaims, JwtError> {
        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                _ => JwtError::InvalidToken,
            })?;

        if token_data.claims.is_expired() {
            return Err(JwtError::TokenExpired);
        }

        if token_data.claims.token_type != SESSION_TOKEN_TYPE {
            return Err(JwtError::InvalidToken);
        }

        Ok(token_data.claims)
    }

    /// Encode JWT using HMAC-SHA256 (symmetric secret)
    pub fn encode(secret: &[u8], claims: &SessionClaims) -> Result<String, JwtError> {
        let header = Header::new(Algorithm::HS256);
        let encoding_key = EncodingKey::from_secret(secret);

        Ok(encode(&header, claims, &encoding_key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &[u8] = b"test_secret_key_1234567890";

    fn claims(validity: Duration) -> SessionClaims {
        SessionClaims::new(
            "6f1c9a56-8d4e-4b8e-9f59-1f5d2a7c1e01".to_string(),
            "alice".to_string(),
            "user".to_string(),
            validity,
        )
    }

    #[test]
    fn test_jwt_encode_decode() {
        let claims = claims(Duration::hours(1));

        let token = JwtValidator::encode(TEST_SECRET, &claims).unwrap();
        let decoded = JwtValidator::new(TEST_SECRET).validate(&token).unwrap();

        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.username, "alice");
        assert_eq!(decoded.role, "user");
        assert_eq!(decoded.iss, ISSUER);
        assert!(!decoded.is_admin());
    }

    #[test]
    fn test_session_lasts_24_hours() {
        let claims = SessionClaims::session(
            "id".to_string(),
            "admin".to_string(),
            "admin".to_string(),
        );

        assert_eq!(claims.exp - claims.iat, 24 * 3600);
        assert!(claims.is_admin());
        assert_eq!(claims.token_type, "session");
    }

    #[test]
    fn test_expired_token() {
        let claims = claims(Duration::seconds(-10));
        assert!(claims.is_expired());

        let token = JwtValidator::encode(TEST_SECRET, &claims).unwrap();
        let result = JwtValidator::new(TEST_SECRET).validate(&token);

        assert!(matches!(result, Err(JwtError::TokenExpired)));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = JwtValidator::encode(TEST_SECRET, &claims(Duration::hours(1))).unwrap();
        let result = JwtValidator::new(b"another_secret").validate(&token);

        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_non_session_token_is_rejected() {
        let mut claims = claims(Duration::hours(1));
        claims.token_type = "refresh".to_string();

        let token = JwtValidator::encode(TEST_SECRET, &claims).unwrap();
        let result = JwtValidator::new(TEST_SECRET).validate(&token);

        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_foreign_issuer_is_rejected() {
        let mut claims = claims(Duration::hours(1));
        claims.iss = "someone-else".to_string();

        let token = JwtValidator::encode(TEST_SECRET, &claims).unwrap();
        assert!(JwtValidator::new(TEST_SECRET).validate(&token).is_err());
    }

    #[test]
    fn test_garbage_token() {
        let result = JwtValidator::new(TEST_SECRET).validate("not.a.jwt");
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_claims_serialize_snake_case() {
        let json = serde_json::to_string(&claims(Duration::hours(1))).unwrap();

        assert!(json.contains("\"token_type\":\"session\""));
        assert!(json.contains("\"username\":\"alice\""));
    }
}
