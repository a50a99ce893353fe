//! Password hashing and verification using Argon2id

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

/// Error types for password operations
#[derive(Error, Debug)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerificationFailed(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHashFormat(String),

    /// Password rejected by the length policy
    #[error("Password must be at least {0} characters")]
    TooShort(usize),
}

/// Shortest password accepted for new or reset credentials
pub const MIN_PASSWORD_LEN: usize = 8;

/// Reject passwords that are too short to store
pub fn check_password_policy(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordError::TooShort(MIN_PASSWORD_LEN));
    }
    Ok(())
}

/// Hash a password using Argon2id
///
/// Produces the PHC string stored in `users.password_hash`. Argon2 defaults
/// (19 MiB memory, 2 iterations, 1 lane) with a random 16-byte salt.
///
/// # Example
/// ```
/// use plansculpt_auth::password::hash_password;
///
/// let hash = hash_password("s3cret-pass").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    hasher()
        .hash_password(password.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))
}

/// Verify a login attempt against a stored hash
///
/// A mismatch is `Ok(false)`; only a malformed hash or an internal failure
/// is an error.
///
/// # Example
/// ```
/// use plansculpt_auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("site-foreman-7").unwrap();
/// assert!(verify_password("site-foreman-7", &hash).unwrap());
/// assert!(!verify_password("site-foreman-8", &hash).unwrap());
/// ```
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let stored =
        PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHashFormat(e.to_string()))?;

    match hasher().verify_password(password.as_bytes(), &stored) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
    }
}

/// Argon2id, v19, default cost parameters
fn hasher() -> Argon2<'static> {
    Argon2::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_boundary_is_eight_characters() {
        assert!(matches!(
            check_password_policy("seven77"),
            Err(PasswordError::TooShort(MIN_PASSWORD_LEN))
        ));
        assert!(check_password_policy("eight888").is_ok());
        assert!(check_password_policy("").is_err());
        // Four 3-byte characters are 12 bytes but still too short
        assert!(check_password_policy("日本語日").is_err());
        assert!(check_password_policy("日本語日本語日本").is_ok());
    }

    #[test]
    fn test_stored_hash_is_phc_argon2id() {
        let stored = hash_password("admin-pass-1").unwrap();

        let parsed = PasswordHash::new(&stored).unwrap();
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert!(parsed.salt.is_some());
        assert!(!stored.contains("admin-pass-1"));
    }

    #[test]
    fn test_each_account_gets_its_own_salt() {
        let first = hash_password("shared-password").unwrap();
        let second = hash_password("shared-password").unwrap();

        assert_ne!(first, second);
        assert!(verify_password("shared-password", &first).unwrap());
        assert!(verify_password("shared-password", &second).unwrap());
    }

    #[test]
    fn test_wrong_login_is_false_not_error() {
        let stored = hash_password("correct-horse").unwrap();

        assert!(verify_password("correct-horse", &stored).unwrap());
        assert!(!verify_password("Correct-horse", &stored).unwrap());
        assert!(!verify_password("", &stored).unwrap());
    }

    #[test]
    fn test_corrupt_stored_hash_is_error() {
        assert!(matches!(
            verify_password("correct-horse", "not-a-phc-string"),
            Err(PasswordError::InvalidHashFormat(_))
        ));
        assert!(matches!(
            verify_password("correct-horse", ""),
            Err(PasswordError::InvalidHashFormat(_))
        ));
    }
}
