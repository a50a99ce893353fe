//! Payroll run entity; one row per processed (year, month)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payroll_runs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// (year, month) is unique; see the `idx_payroll_runs_period` index
    pub year: i32,
    pub month: i32,

    /// Salary transactions actually created by this run
    pub employee_count: i32,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total: Decimal,

    /// User who triggered the run
    pub triggered_by: Uuid,

    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
