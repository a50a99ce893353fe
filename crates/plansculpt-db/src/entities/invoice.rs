//! Invoice entity; line items live in `invoice_line_items`

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Invoice status
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum InvoiceStatus {
    #[default]
    #[serde(rename = "Draft")]
    #[sea_orm(string_value = "Draft")]
    Draft,

    /// Issued to the client, awaiting payment
    #[serde(rename = "Sent")]
    #[sea_orm(string_value = "Sent")]
    Sent,

    #[serde(rename = "Paid")]
    #[sea_orm(string_value = "Paid")]
    Paid,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    /// Invoice UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub project_id: Option<Uuid>,

    /// Snapshot of the billed client
    pub client_name: Option<String>,
    pub client_email: Option<String>,

    /// Sum of line item subtotals, recomputed on every save
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total: Decimal,

    pub status: InvoiceStatus,

    pub date: Date,

    pub due_date: Option<Date>,

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

    #[sea_orm(has_many = "super::invoice_line_item::Entity")]
    LineItems,

    /// Income transaction recorded when the invoice was paid
    #[sea_orm(has_one = "super::transaction::Entity")]
    Payment,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::invoice_line_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LineItems.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
