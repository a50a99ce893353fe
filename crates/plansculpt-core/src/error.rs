//! Error type shared by every store operation

use plansculpt_auth::PasswordError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Input rejected before any mutation
    #[error("{0}")]
    Validation(String),

    /// Task cannot be paid (missing or zero cost)
    #[error("{0}")]
    InvalidTask(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    /// Random identifier retries ran out
    #[error("Could not allocate a unique identifier for {0}")]
    IdentifierExhausted(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(DbErr),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    /// True when the store rejected a write on a unique index
    pub fn is_conflict(&self) -> bool {
        matches!(self, CoreError::Conflict(_))
    }
}

impl From<DbErr> for CoreError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                CoreError::Conflict(format!("Duplicate value: {}", detail))
            }
            _ => CoreError::Database(err),
        }
    }
}

impl From<PasswordError> for CoreError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooShort(_) => CoreError::Validation(err.to_string()),
            other => CoreError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_db_error_stays_database() {
        let err: CoreError = DbErr::Custom("boom".to_string()).into();
        assert!(matches!(err, CoreError::Database(_)));
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_password_policy_is_validation() {
        let err: CoreError = PasswordError::TooShort(8).into();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_not_found_message() {
        let err = CoreError::not_found("Employee", "42");
        assert_eq!(err.to_string(), "Employee not found: 42");
    }
}
