//! Project entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Project lifecycle status
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ProjectStatus {
    #[serde(rename = "Not Started")]
    #[sea_orm(string_value = "Not Started")]
    NotStarted,

    #[default]
    #[serde(rename = "In Progress")]
    #[sea_orm(string_value = "In Progress")]
    InProgress,

    #[serde(rename = "On Hold")]
    #[sea_orm(string_value = "On Hold")]
    OnHold,

    #[serde(rename = "Completed")]
    #[sea_orm(string_value = "Completed")]
    Completed,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    /// Project UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Business identifier, `P-48213-2026`
    #[sea_orm(unique)]
    pub custom_id: Option<String>,

    pub name: String,

    /// Client (company or person) the project is delivered for
    pub client: String,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Budget / estimated income
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub budget: Decimal,

    pub start_date: Option<Date>,

    pub status: ProjectStatus,

    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::task::Entity")]
    Tasks,

    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,

    #[sea_orm(has_many = "super::invoice::Entity")]
    Invoices,
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

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
