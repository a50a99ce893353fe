//! Accounts, login and user administration

use chrono::{NaiveDate, Utc};
use plansculpt_auth::{check_password_policy, hash_password, verify_password};
use plansculpt_db::entities::{
    activity_log,
    user::{self, UserRole},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::access::Caller;
use crate::audit::AuditAction;
use crate::error::{CoreError, CoreResult};
use crate::store::Store;

/// Registration or admin-side account creation
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UserInput {
    pub username: String,
    pub password: String,
    /// Only honoured for admin-created accounts
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub dob: Option<NaiveDate>,
}

impl UserInput {
    pub(crate) fn validate(&self) -> CoreResult<String> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(CoreError::validation("Username is required"));
        }
        if username.chars().any(char::is_whitespace) {
            return Err(CoreError::validation("Username cannot contain spaces"));
        }
        check_password_policy(&self.password)?;
        Ok(username.to_string())
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Store {
    /// Self-service signup; the account is always a regular user
    pub async fn register(&self, input: UserInput) -> CoreResult<user::Model> {
        if input.role == Some(UserRole::Admin) {
            debug!("Ignoring admin role requested at registration");
        }
        let created = self.insert_user(&input, UserRole::User).await?;
        info!("Registered user {}", created.username);
        Ok(created)
    }

    /// Admin-side account creation with an explicit role
    pub async fn create_user(&self, caller: &Caller, input: UserInput) -> CoreResult<user::Model> {
        caller.require_admin("create users")?;

        let role = input.role.unwrap_or_default();
        let created = self.insert_user(&input, role).await?;

        info!("Created user {} with role {}", created.username, role.as_str());
        self.audit
            .record(
                caller,
                AuditAction::CreateUser,
                format!("Created user {} ({})", created.username, role.as_str()),
            )
            .await;

        Ok(created)
    }

    async fn insert_user(&self, input: &UserInput, role: UserRole) -> CoreResult<user::Model> {
        let username = input.validate()?;
        let password_hash = hash_password(&input.password)?;

        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.clone()),
            password_hash: Set(password_hash),
            role: Set(role),
            full_name: Set(non_blank(&input.full_name)),
            email: Set(non_blank(&input.email)),
            phone: Set(non_blank(&input.phone)),
            dob: Set(input.dob),
            created_at: Set(Utc::now()),
        };

        match model.insert(&self.db).await.map_err(CoreError::from) {
            Err(CoreError::Conflict(_)) => Err(CoreError::Conflict(format!(
                "Username {} is already taken",
                username
            ))),
            other => other,
        }
    }

    /// Check credentials and return the account.
    ///
    /// Unknown users and wrong passwords fail the same way.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
        ip: Option<String>,
    ) -> CoreResult<user::Model> {
        let invalid = || CoreError::Unauthenticated("Invalid username or password".to_string());

        let user = user::Entity::find()
            .filter(user::Column::Username.eq(username.trim()))
            .one(&self.db)
            .await?
            .ok_or_else(invalid)?;

        let matches = verify_password(password, &user.password_hash).unwrap_or_else(|e| {
            warn!("Stored password hash for {} is unusable: {}", user.username, e);
            false
        });
        if !matches {
            debug!("Failed login for {}", user.username);
            return Err(invalid());
        }

        info!("User {} logged in", user.username);
        let caller = Caller::from_user(&user).with_ip(ip);
        self.audit
            .record(&caller, AuditAction::Login, "User logged in")
            .await;

        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> CoreResult<user::Model> {
        user::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("User", id))
    }

    /// Profile of the calling account
    pub async fn me(&self, caller: &Caller) -> CoreResult<user::Model> {
        self.get_user(caller.user_id).await
    }

    /// Admin only; newest first
    pub async fn list_users(&self, caller: &Caller) -> CoreResult<Vec<user::Model>> {
        caller.require_admin("list users")?;
        let users = user::Entity::find()
            .order_by_desc(user::Column::CreatedAt)
            .all(&self.db)
            .await?;
        debug!("Listed {} users", users.len());
        Ok(users)
    }

    /// Admin only. An admin cannot delete their own account.
    pub async fn delete_user(&self, caller: &Caller, id: Uuid) -> CoreResult<()> {
        caller.require_admin("delete users")?;
        if caller.user_id == id {
            return Err(CoreError::Forbidden(
                "You cannot delete your own account".to_string(),
            ));
        }
        let existing = self.get_user(id).await?;

        let txn = self.db.begin().await?;
        let logs = activity_log::Entity::delete_many()
            .filter(activity_log::Column::UserId.eq(id))
            .exec(&txn)
            .await?;
        user::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        info!(
            "Deleted user {} and {} activity entries",
            existing.username, logs.rows_affected
        );
        self.audit
            .record(
                caller,
                AuditAction::DeleteUser,
                format!("Deleted user {} (ID: {})", existing.username, id),
            )
            .await;

        Ok(())
    }

    /// Admin only
    pub async fn reset_password(
        &self,
        caller: &Caller,
        id: Uuid,
        new_password: &str,
    ) -> CoreResult<()> {
        caller.require_admin("reset passwords")?;
        check_password_policy(new_password)?;
        let existing = self.get_user(id).await?;

        let username = existing.username.clone();
        let mut active: user::ActiveModel = existing.into();
        active.password_hash = Set(hash_password(new_password)?);
        active.update(&self.db).await?;

        info!("Reset password for {}", username);
        self.audit
            .record(
                caller,
                AuditAction::ChangePassword,
                format!("Reset password for user {}", username),
            )
            .await;

        Ok(())
    }

    /// Admin only
    pub async fn change_role(
        &self,
        caller: &Caller,
        id: Uuid,
        role: UserRole,
    ) -> CoreResult<user::Model> {
        caller.require_admin("change roles")?;
        let existing = self.get_user(id).await?;
        let previous = existing.role;

        let mut active: user::ActiveModel = existing.into();
        active.role = Set(role);
        let updated = active.update(&self.db).await?;

        info!(
            "Changed role of {} from {} to {}",
            updated.username,
            previous.as_str(),
            role.as_str()
        );
        self.audit
            .record(
                caller,
                AuditAction::ChangeRole,
                format!(
                    "Changed role of {} from {} to {}",
                    updated.username,
                    previous.as_str(),
                    role.as_str()
                ),
            )
            .await;

        Ok(updated)
    }

    /// Admin only; newest first
    pub async fn user_activity(
        &self,
        caller: &Caller,
        id: Uuid,
    ) -> CoreResult<Vec<activity_log::Model>> {
        caller.require_admin("view user activity")?;
        self.get_user(id).await?;
        self.audit.for_user(id).await
    }

    /// Create an admin account, or promote and re-key an existing one.
    ///
    /// Returns the account and whether it was newly created.
    pub async fn create_admin(
        &self,
        username: &str,
        password: &str,
        full_name: Option<String>,
    ) -> CoreResult<(user::Model, bool)> {
        let input = UserInput {
            username: username.to_string(),
            password: password.to_string(),
            role: Some(UserRole::Admin),
            full_name,
            email: None,
            phone: None,
            dob: None,
        };
        let username = input.validate()?;

        let existing = user::Entity::find()
            .filter(user::Column::Username.eq(username.as_str()))
            .one(&self.db)
            .await?;

        match existing {
            Some(user) => {
                let mut active: user::ActiveModel = user.into();
                active.role = Set(UserRole::Admin);
                active.password_hash = Set(hash_password(password)?);
                if let Some(full_name) = non_blank(&input.full_name) {
                    active.full_name = Set(Some(full_name));
                }
                let updated = active.update(&self.db).await?;
                info!("Promoted {} to admin", updated.username);
                Ok((updated, false))
            }
            None => {
                let created = self.insert_user(&input, UserRole::Admin).await?;
                info!("Created admin {}", created.username);
                Ok((created, true))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(username: &str, password: &str) -> UserInput {
        UserInput {
            username: username.to_string(),
            password: password.to_string(),
            role: None,
            full_name: None,
            email: None,
            phone: None,
            dob: None,
        }
    }

    #[test]
    fn test_validate() {
        assert_eq!(input(" alice ", "long-enough").validate().unwrap(), "alice");
        assert!(input("", "long-enough").validate().is_err());
        assert!(input("al ice", "long-enough").validate().is_err());
        assert!(matches!(
            input("alice", "short").validate(),
            Err(CoreError::Validation(_))
        ));
    }
}
