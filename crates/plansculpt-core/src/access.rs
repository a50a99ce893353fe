//! Role checks for authenticated callers

use plansculpt_db::entities::user::{self, UserRole};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Identity of the account performing an operation
#[derive(Debug, Clone, PartialEq)]
pub struct Caller {
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
    /// Client address, recorded in the activity log
    pub ip: Option<String>,
}

impl Caller {
    pub fn new(user_id: Uuid, username: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id,
            username: username.into(),
            role,
            ip: None,
        }
    }

    pub fn with_ip(mut self, ip: Option<String>) -> Self {
        self.ip = ip;
        self
    }

    pub fn from_user(user: &user::Model) -> Self {
        Self::new(user.id, user.username.clone(), user.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Fails with `Forbidden` unless the caller is an admin
    pub fn require_admin(&self, action: &str) -> CoreResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!("Only admins can {}", action)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_admin() {
        let admin = Caller::new(Uuid::new_v4(), "root", UserRole::Admin);
        let user = Caller::new(Uuid::new_v4(), "alice", UserRole::User);

        assert!(admin.require_admin("delete employees").is_ok());

        let err = user.require_admin("delete employees").unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
        assert_eq!(err.to_string(), "Only admins can delete employees");
    }
}
