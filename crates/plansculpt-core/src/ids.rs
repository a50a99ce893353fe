//! Human-readable business identifiers
//!
//! Employees get `E-{seq}-{year}` with a per-year sequence allocated inside the
//! creating transaction. Projects get `P-{5 digits}-{year}` drawn at random and
//! retried on collision. The backfill assigns ids to rows created without one.

use std::ops::Range;

use chrono::{DateTime, Datelike, Utc};
use plansculpt_db::entities::{employee, id_sequence, project};
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Serialize;
use tracing::{info, warn};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::error::{CoreError, CoreResult};
use crate::store::Store;

/// Attempts before project id generation gives up
pub const PROJECT_ID_ATTEMPTS: usize = 5;

/// Random part of a project id
pub const PROJECT_NUMBER_RANGE: Range<u32> = 10_000..99_999;

pub fn employee_scope(year: i32) -> String {
    format!("employee:{}", year)
}

/// `E-001-2026`; sequences above 999 are kept unpadded
pub fn format_employee_id(seq: u32, year: i32) -> String {
    format!("E-{:03}-{}", seq, year)
}

/// Sequence number of an employee id issued in `year`
pub fn parse_employee_seq(custom_id: &str, year: i32) -> Option<u32> {
    let suffix = format!("-{}", year);
    let digits = custom_id.strip_prefix("E-")?.strip_suffix(suffix.as_str())?;

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

pub fn format_project_id(number: u32, year: i32) -> String {
    format!("P-{:05}-{}", number, year)
}

pub fn random_project_number() -> u32 {
    rand::thread_rng().gen_range(PROJECT_NUMBER_RANGE)
}

/// Matches `P-` five digits `-` four digits
pub fn is_project_id(value: &str) -> bool {
    let parts: Vec<&str> = value.split('-').collect();
    matches!(parts.as_slice(), ["P", number, year]
        if number.len() == 5
            && year.len() == 4
            && number.chars().all(|c| c.is_ascii_digit())
            && year.chars().all(|c| c.is_ascii_digit()))
}

/// Allocate the next employee id for `year`.
///
/// Must run inside the creating transaction while the scope lock is held.
/// The next value is one past the larger of the highest issued sequence and
/// the persisted counter; the counter is advanced before returning.
pub(crate) async fn next_employee_id<C>(conn: &C, year: i32) -> CoreResult<String>
where
    C: ConnectionTrait,
{
    let issued: Vec<Option<String>> = employee::Entity::find()
        .select_only()
        .column(employee::Column::CustomId)
        .filter(employee::Column::CustomId.like(format!("E-%-{}", year)))
        .into_tuple()
        .all(conn)
        .await?;

    let scanned = issued
        .iter()
        .flatten()
        .filter_map(|id| parse_employee_seq(id, year))
        .max()
        .unwrap_or(0);

    let scope = employee_scope(year);
    let counter = id_sequence::Entity::find_by_id(scope.clone()).one(conn).await?;
    let stored = counter
        .as_ref()
        .map(|c| u32::try_from(c.last_value).unwrap_or(0))
        .unwrap_or(0);

    let next = scanned.max(stored) + 1;
    let last_value = i32::try_from(next)
        .map_err(|_| CoreError::IdentifierExhausted(scope.clone()))?;

    match counter {
        Some(existing) => {
            let mut active: id_sequence::ActiveModel = existing.into();
            active.last_value = Set(last_value);
            active.update(conn).await?;
        }
        None => {
            id_sequence::ActiveModel {
                scope: Set(scope),
                last_value: Set(last_value),
            }
            .insert(conn)
            .await?;
        }
    }

    Ok(format_employee_id(next, year))
}

/// Outcome of an identifier backfill
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct BackfillReport {
    pub employees_assigned: usize,
    pub projects_assigned: usize,
    /// Rows left without an id because the computed id was already taken
    pub skipped: usize,
}

fn lacks_id(custom_id: &Option<String>) -> bool {
    custom_id.as_deref().map_or(true, |id| id.trim().is_empty())
}

fn backfill_year(created_at: DateTime<Utc>, fallback: i32) -> i32 {
    if created_at.timestamp() <= 0 {
        fallback
    } else {
        created_at.year()
    }
}

impl Store {
    /// Assign custom ids to employees and projects created without one.
    ///
    /// Rows are numbered by creation order (1-based); rows that already have
    /// an id keep it but still consume their index.
    pub async fn backfill_ids(&self) -> CoreResult<BackfillReport> {
        let current_year = Utc::now().year();
        let mut report = BackfillReport::default();

        let employees = employee::Entity::find()
            .order_by_asc(employee::Column::CreatedAt)
            .order_by_asc(employee::Column::Id)
            .all(&self.db)
            .await?;

        for (index, model) in employees.into_iter().enumerate() {
            if !lacks_id(&model.custom_id) {
                continue;
            }

            let year = backfill_year(model.created_at, current_year);
            let custom_id = format_employee_id(index as u32 + 1, year);
            let mut active: employee::ActiveModel = model.into();
            active.custom_id = Set(Some(custom_id.clone()));

            match active.update(&self.db).await.map_err(CoreError::from) {
                Ok(_) => report.employees_assigned += 1,
                Err(CoreError::Conflict(_)) => {
                    warn!("Skipping employee backfill, {} already taken", custom_id);
                    report.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        let projects = project::Entity::find()
            .order_by_asc(project::Column::CreatedAt)
            .order_by_asc(project::Column::Id)
            .all(&self.db)
            .await?;

        for (index, model) in projects.into_iter().enumerate() {
            if !lacks_id(&model.custom_id) {
                continue;
            }

            let year = backfill_year(model.created_at, current_year);
            let custom_id = format_project_id(index as u32 + 1, year);
            let mut active: project::ActiveModel = model.into();
            active.custom_id = Set(Some(custom_id.clone()));

            match active.update(&self.db).await.map_err(CoreError::from) {
                Ok(_) => report.projects_assigned += 1,
                Err(CoreError::Conflict(_)) => {
                    warn!("Skipping project backfill, {} already taken", custom_id);
                    report.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Backfilled {} employee ids and {} project ids ({} skipped)",
            report.employees_assigned, report.projects_assigned, report.skipped
        );

        Ok(report)
    }
}
