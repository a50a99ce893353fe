//! Employee entity for HR records and payroll eligibility

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// How an employee is paid
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    /// Monthly salary, included in payroll runs
    #[default]
    #[sea_orm(string_value = "fixed")]
    Fixed,

    /// Paid per task
    #[sea_orm(string_value = "freelance")]
    Freelance,
}

/// Employment status
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    #[default]
    #[sea_orm(string_value = "active")]
    Active,

    #[sea_orm(string_value = "inactive")]
    Inactive,

    #[sea_orm(string_value = "on_leave")]
    OnLeave,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    /// Employee UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Business identifier, `E-001-2026` (NULL until backfilled for legacy rows)
    #[sea_orm(unique)]
    pub custom_id: Option<String>,

    pub name: String,

    /// Job title
    pub role: String,

    pub department: String,

    pub employment_type: EmploymentType,

    /// Monthly salary, required for fixed employees
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub salary: Option<Decimal>,

    pub status: EmployeeStatus,

    pub email: Option<String>,
    pub phone: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,

    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Tasks assigned to this employee
    #[sea_orm(has_many = "super::task::Entity")]
    Tasks,

    /// Payments and other transactions linked to this employee
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tasks.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
