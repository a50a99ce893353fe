//! Task entity (billable unit of project work)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Work status of a task
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "Pending")]
    #[sea_orm(string_value = "Pending")]
    Pending,

    #[serde(rename = "In Progress")]
    #[sea_orm(string_value = "In Progress")]
    InProgress,

    #[serde(rename = "Completed")]
    #[sea_orm(string_value = "Completed")]
    Completed,
}

/// Whether the task cost has been paid out
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PaymentStatus {
    #[default]
    #[serde(rename = "Pending")]
    #[sea_orm(string_value = "Pending")]
    Pending,

    #[serde(rename = "Paid")]
    #[sea_orm(string_value = "Paid")]
    Paid,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    /// Task UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub title: String,

    /// Owning project (required)
    pub project_id: Uuid,

    /// Assigned employee, if the assignee is on record
    pub assignee_id: Option<Uuid>,

    /// Free-text assignee label for people without an employee record
    pub assignee_name: Option<String>,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub cost: Decimal,

    pub status: TaskStatus,

    pub payment_status: PaymentStatus,

    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id"
    )]
    Project,

    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::AssigneeId",
        to = "super::employee::Column::Id"
    )]
    Assignee,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
