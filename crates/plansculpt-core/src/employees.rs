//! Employee records and their cascade delete

use chrono::{Datelike, Utc};
use plansculpt_db::entities::{
    employee::{self, EmployeeStatus, EmploymentType},
    task, transaction,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::access::Caller;
use crate::audit::AuditAction;
use crate::error::{CoreError, CoreResult};
use crate::ids::{employee_scope, next_employee_id};
use crate::money;
use crate::store::Store;

/// Create or full-update request for an employee
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct EmployeeInput {
    pub name: String,
    pub role: String,
    /// Defaults to "General"
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub employment_type: Option<EmploymentType>,
    /// Monthly salary; required for fixed employees, ignored for freelancers
    #[serde(default)]
    pub salary: Option<Decimal>,
    #[serde(default)]
    pub status: Option<EmployeeStatus>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
}

/// Input after validation and defaulting
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValidEmployee {
    pub name: String,
    pub role: String,
    pub department: String,
    pub employment_type: EmploymentType,
    pub salary: Option<Decimal>,
    pub status: EmployeeStatus,
}

impl EmployeeInput {
    pub(crate) fn validate(&self) -> CoreResult<ValidEmployee> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CoreError::validation("Employee name is required"));
        }
        let role = self.role.trim();
        if role.is_empty() {
            return Err(CoreError::validation("Employee role is required"));
        }

        let employment_type = self.employment_type.unwrap_or_default();
        let salary = match employment_type {
            EmploymentType::Fixed => {
                let salary = self.salary.ok_or_else(|| {
                    CoreError::validation("Salary is required for fixed employees")
                })?;
                Some(money::require_positive("Salary", salary)?)
            }
            EmploymentType::Freelance => None,
        };

        let department = self
            .department
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or("General")
            .to_string();

        Ok(ValidEmployee {
            name: name.to_string(),
            role: role.to_string(),
            department,
            employment_type,
            salary,
            status: self.status.unwrap_or_default(),
        })
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
    /// All employees, newest first, optionally filtered by status
    pub async fn list_employees(
        &self,
        status: Option<EmployeeStatus>,
    ) -> CoreResult<Vec<employee::Model>> {
        let mut query = employee::Entity::find();
        if let Some(status) = status {
            query = query.filter(employee::Column::Status.eq(status));
        }

        let employees = query
            .order_by_desc(employee::Column::CreatedAt)
            .all(&self.db)
            .await?;
        debug!("Listed {} employees", employees.len());
        Ok(employees.into_iter().map(normalize).collect())
    }

    pub async fn get_employee(&self, id: Uuid) -> CoreResult<employee::Model> {
        employee::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(normalize)
            .ok_or_else(|| CoreError::not_found("Employee", id))
    }

    /// Create an employee with the next `E-{seq}-{year}` id
    pub async fn create_employee(
        &self,
        caller: &Caller,
        input: EmployeeInput,
    ) -> CoreResult<employee::Model> {
        let valid = input.validate()?;
        let now = Utc::now();
        let year = now.year();

        let _guard = self.lock_scope(&employee_scope(year)).await;
        let txn = self.db.begin().await?;

        let custom_id = next_employee_id(&txn, year).await?;
        let created = employee::ActiveModel {
            id: Set(Uuid::new_v4()),
            custom_id: Set(Some(custom_id.clone())),
            name: Set(valid.name),
            role: Set(valid.role),
            department: Set(valid.department),
            employment_type: Set(valid.employment_type),
            salary: Set(valid.salary),
            status: Set(valid.status),
            email: Set(non_blank(&input.email)),
            phone: Set(non_blank(&input.phone)),
            dob: Set(non_blank(&input.dob)),
            gender: Set(non_blank(&input.gender)),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!("Created employee {} ({})", created.name, custom_id);
        self.audit
            .record(
                caller,
                AuditAction::CreateEmployee,
                format!("Created employee {} ({})", created.name, custom_id),
            )
            .await;

        Ok(normalize(created))
    }

    /// Replace the editable fields; the custom id is never reassigned
    pub async fn update_employee(
        &self,
        caller: &Caller,
        id: Uuid,
        input: EmployeeInput,
    ) -> CoreResult<employee::Model> {
        let valid = input.validate()?;
        let existing = self.get_employee(id).await?;

        let mut active: employee::ActiveModel = existing.into();
        active.name = Set(valid.name);
        active.role = Set(valid.role);
        active.department = Set(valid.department);
        active.employment_type = Set(valid.employment_type);
        active.salary = Set(valid.salary);
        active.status = Set(valid.status);
        active.email = Set(non_blank(&input.email));
        active.phone = Set(non_blank(&input.phone));
        active.dob = Set(non_blank(&input.dob));
        active.gender = Set(non_blank(&input.gender));

        let updated = active.update(&self.db).await?;

        info!("Updated employee {}", id);
        self.audit
            .record(
                caller,
                AuditAction::UpdateEmployee,
                format!("Updated employee ID: {}", id),
            )
            .await;

        Ok(normalize(updated))
    }

    /// Delete an employee with its assigned tasks and linked transactions.
    ///
    /// Admin only. Runs as one store transaction.
    pub async fn delete_employee(&self, caller: &Caller, id: Uuid) -> CoreResult<()> {
        caller.require_admin("delete employees")?;
        let existing = self.get_employee(id).await?;

        let txn = self.db.begin().await?;

        let tasks = task::Entity::delete_many()
            .filter(task::Column::AssigneeId.eq(id))
            .exec(&txn)
            .await?;
        let transactions = transaction::Entity::delete_many()
            .filter(transaction::Column::EmployeeId.eq(id))
            .exec(&txn)
            .await?;
        employee::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        info!(
            "Deleted employee {} with {} tasks and {} transactions",
            id, tasks.rows_affected, transactions.rows_affected
        );
        self.audit
            .record(
                caller,
                AuditAction::DeleteEmployee,
                format!("Deleted employee {} (ID: {})", existing.name, id),
            )
            .await;

        Ok(())
    }
}

/// Salaries come back from SQLite through f64
fn normalize(mut model: employee::Model) -> employee::Model {
    model.salary = model.salary.map(money::round);
    model
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input(employment_type: Option<EmploymentType>, salary: Option<Decimal>) -> EmployeeInput {
        EmployeeInput {
            name: "  Jane Doe ".to_string(),
            role: "Engineer".to_string(),
            department: None,
            employment_type,
            salary,
            status: None,
            email: None,
            phone: None,
            dob: None,
            gender: None,
        }
    }

    #[test]
    fn test_defaults() {
        let valid = input(None, Some(dec!(1000))).validate().unwrap();

        assert_eq!(valid.name, "Jane Doe");
        assert_eq!(valid.department, "General");
        assert_eq!(valid.employment_type, EmploymentType::Fixed);
        assert_eq!(valid.status, EmployeeStatus::Active);
        assert_eq!(valid.salary, Some(dec!(1000.00)));
    }

    #[test]
    fn test_fixed_requires_salary() {
        let err = input(Some(EmploymentType::Fixed), None).validate().unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        assert!(input(Some(EmploymentType::Fixed), Some(dec!(0)))
            .validate()
            .is_err());
    }

    #[test]
    fn test_freelance_drops_salary() {
        let valid = input(Some(EmploymentType::Freelance), Some(dec!(900)))
            .validate()
            .unwrap();
        assert_eq!(valid.salary, None);
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut blank = input(None, Some(dec!(1)));
        blank.name = "   ".to_string();
        assert!(blank.validate().is_err());
    }
}
