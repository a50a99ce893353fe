//! Projects, their generated ids and their cascade delete

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Utc};
use plansculpt_db::entities::{
    invoice, invoice_line_item,
    project::{self, ProjectStatus},
    task, transaction,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::access::Caller;
use crate::audit::AuditAction;
use crate::error::{CoreError, CoreResult};
use crate::finance::ProjectRollup;
use crate::ids::{format_project_id, random_project_number, PROJECT_ID_ATTEMPTS};
use crate::money;
use crate::store::Store;

/// Create or full-update request for a project
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ProjectInput {
    pub name: String,
    pub client: String,
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default)]
    pub client_phone: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to 0
    #[serde(default)]
    pub budget: Option<Decimal>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Defaults to "In Progress"
    #[serde(default)]
    pub status: Option<ProjectStatus>,
}

impl ProjectInput {
    pub(crate) fn validate(&self) -> CoreResult<(String, String, Decimal)> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CoreError::validation("Project name is required"));
        }
        let client = self.client.trim();
        if client.is_empty() {
            return Err(CoreError::validation("Project client is required"));
        }
        let budget = money::require_non_negative("Budget", self.budget.unwrap_or(Decimal::ZERO))?;

        Ok((name.to_string(), client.to_string(), budget))
    }
}

/// A project together with its derived figures
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSummary {
    pub project: project::Model,
    pub rollup: ProjectRollup,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Store {
    /// All projects, newest first, each with its rollup
    pub async fn list_projects(&self) -> CoreResult<Vec<ProjectSummary>> {
        let projects = project::Entity::find()
            .order_by_desc(project::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let mut transactions: HashMap<Uuid, Vec<transaction::Model>> = HashMap::new();
        for txn in transaction::Entity::find()
            .filter(transaction::Column::ProjectId.is_not_null())
            .all(&self.db)
            .await?
        {
            if let Some(project_id) = txn.project_id {
                transactions.entry(project_id).or_default().push(txn);
            }
        }

        let mut tasks: HashMap<Uuid, Vec<task::Model>> = HashMap::new();
        for task in task::Entity::find().all(&self.db).await? {
            tasks.entry(task.project_id).or_default().push(task);
        }

        debug!("Listed {} projects", projects.len());

        Ok(projects
            .into_iter()
            .map(|project| {
                let rollup = ProjectRollup::compute(
                    project.budget,
                    transactions.get(&project.id).into_iter().flatten(),
                    tasks.get(&project.id).into_iter().flatten(),
                );
                ProjectSummary {
                    project: normalize(project),
                    rollup,
                }
            })
            .collect())
    }

    pub async fn get_project(&self, id: Uuid) -> CoreResult<project::Model> {
        project::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(normalize)
            .ok_or_else(|| CoreError::not_found("Project", id))
    }

    /// One project with its rollup
    pub async fn project_summary(&self, id: Uuid) -> CoreResult<ProjectSummary> {
        let project = self.get_project(id).await?;

        let transactions = transaction::Entity::find()
            .filter(transaction::Column::ProjectId.eq(id))
            .all(&self.db)
            .await?;
        let tasks = task::Entity::find()
            .filter(task::Column::ProjectId.eq(id))
            .all(&self.db)
            .await?;

        let rollup = ProjectRollup::compute(project.budget, &transactions, &tasks);
        Ok(ProjectSummary { project, rollup })
    }

    /// Create a project with a random `P-{5 digits}-{year}` id
    pub async fn create_project(
        &self,
        caller: &Caller,
        input: ProjectInput,
    ) -> CoreResult<project::Model> {
        self.create_project_with(caller, input, random_project_number)
            .await
    }

    /// Same as [`Store::create_project`] with a caller-chosen number source
    pub(crate) async fn create_project_with<F>(
        &self,
        caller: &Caller,
        input: ProjectInput,
        mut next_number: F,
    ) -> CoreResult<project::Model>
    where
        F: FnMut() -> u32,
    {
        let (name, client, budget) = input.validate()?;
        let now = Utc::now();

        for attempt in 1..=PROJECT_ID_ATTEMPTS {
            let custom_id = format_project_id(next_number(), now.year());

            let candidate = project::ActiveModel {
                id: Set(Uuid::new_v4()),
                custom_id: Set(Some(custom_id.clone())),
                name: Set(name.clone()),
                client: Set(client.clone()),
                client_email: Set(non_blank(&input.client_email)),
                client_phone: Set(non_blank(&input.client_phone)),
                description: Set(non_blank(&input.description)),
                budget: Set(budget),
                start_date: Set(input.start_date),
                status: Set(input.status.unwrap_or_default()),
                created_at: Set(now),
            };

            match candidate.insert(&self.db).await.map_err(CoreError::from) {
                Ok(created) => {
                    info!("Created project {} ({})", created.name, custom_id);
                    self.audit
                        .record(
                            caller,
                            AuditAction::CreateProject,
                            format!("Created project {} ({})", created.name, custom_id),
                        )
                        .await;
                    return Ok(normalize(created));
                }
                Err(CoreError::Conflict(_)) => {
                    warn!(
                        "Project id {} already taken (attempt {}/{})",
                        custom_id, attempt, PROJECT_ID_ATTEMPTS
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(CoreError::IdentifierExhausted("project".to_string()))
    }

    /// Replace the editable fields; the custom id is never reassigned
    pub async fn update_project(
        &self,
        caller: &Caller,
        id: Uuid,
        input: ProjectInput,
    ) -> CoreResult<project::Model> {
        let (name, client, budget) = input.validate()?;
        let existing = self.get_project(id).await?;

        let mut active: project::ActiveModel = existing.into();
        active.name = Set(name);
        active.client = Set(client);
        active.client_email = Set(non_blank(&input.client_email));
        active.client_phone = Set(non_blank(&input.client_phone));
        active.description = Set(non_blank(&input.description));
        active.budget = Set(budget);
        active.start_date = Set(input.start_date);
        if let Some(status) = input.status {
            active.status = Set(status);
        }

        let updated = active.update(&self.db).await?;

        info!("Updated project {}", id);
        self.audit
            .record(
                caller,
                AuditAction::UpdateProject,
                format!("Updated project ID: {}", id),
            )
            .await;

        Ok(normalize(updated))
    }

    /// Delete a project with its transactions, invoices and tasks.
    ///
    /// Invoice line items and invoice payments go with their invoices. Runs
    /// as one store transaction.
    pub async fn delete_project(&self, caller: &Caller, id: Uuid) -> CoreResult<()> {
        let existing = self.get_project(id).await?;

        let txn = self.db.begin().await?;

        let invoice_ids: Vec<Uuid> = invoice::Entity::find()
            .select_only()
            .column(invoice::Column::Id)
            .filter(invoice::Column::ProjectId.eq(id))
            .into_tuple()
            .all(&txn)
            .await?;

        let transactions = transaction::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(transaction::Column::ProjectId.eq(id))
                    .add(transaction::Column::InvoiceId.is_in(invoice_ids.clone())),
            )
            .exec(&txn)
            .await?;
        invoice_line_item::Entity::delete_many()
            .filter(invoice_line_item::Column::InvoiceId.is_in(invoice_ids.clone()))
            .exec(&txn)
            .await?;
        invoice::Entity::delete_many()
            .filter(invoice::Column::ProjectId.eq(id))
            .exec(&txn)
            .await?;
        let tasks = task::Entity::delete_many()
            .filter(task::Column::ProjectId.eq(id))
            .exec(&txn)
            .await?;
        project::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        info!(
            "Deleted project {} with {} invoices, {} tasks and {} transactions",
            id,
            invoice_ids.len(),
            tasks.rows_affected,
            transactions.rows_affected
        );
        self.audit
            .record(
                caller,
                AuditAction::DeleteProject,
                format!("Deleted project {} (ID: {})", existing.name, id),
            )
            .await;

        Ok(())
    }
}

/// Budgets come back from SQLite through f64
fn normalize(mut model: project::Model) -> project::Model {
    model.budget = money::round(model.budget);
    model
}

#[cfg(test)]
mod tests {
    use super::*;
    use plansculpt_db::entities::user::UserRole;

    fn input(name: &str) -> ProjectInput {
        ProjectInput {
            name: name.to_string(),
            client: "Acme".to_string(),
            client_email: None,
            client_phone: None,
            description: None,
            budget: None,
            start_date: None,
            status: None,
        }
    }

    #[test]
    fn test_validate_defaults_budget() {
        let (name, client, budget) = input(" Fit-out ").validate().unwrap();
        assert_eq!(name, "Fit-out");
        assert_eq!(client, "Acme");
        assert_eq!(budget, Decimal::ZERO);
    }

    #[test]
    fn test_validate_rejects_negative_budget() {
        let mut negative = input("Fit-out");
        negative.budget = Some(Decimal::NEGATIVE_ONE);
        assert!(matches!(
            negative.validate(),
            Err(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_project_id_retries_then_gives_up() {
        let db = plansculpt_db::open("sqlite::memory:")
            .await
            .expect("Failed to open database");
        let store = Store::new(db);
        let caller = Caller::new(Uuid::new_v4(), "tester", UserRole::Admin);

        // Always the same number: the first insert wins, the second collides
        let first = store
            .create_project_with(&caller, input("First"), || 12345)
            .await
            .unwrap();
        assert_eq!(
            first.custom_id,
            Some(format!("P-12345-{}", Utc::now().year()))
        );

        let mut calls = 0;
        let err = store
            .create_project_with(&caller, input("Second"), || {
                calls += 1;
                12345
            })
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::IdentifierExhausted(_)));
        assert_eq!(calls, PROJECT_ID_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_project_id_recovers_after_collision() {
        let db = plansculpt_db::open("sqlite::memory:")
            .await
            .expect("Failed to open database");
        let store = Store::new(db);
        let caller = Caller::new(Uuid::new_v4(), "tester", UserRole::User);

        store
            .create_project_with(&caller, input("First"), || 20000)
            .await
            .unwrap();

        let mut numbers = vec![30000, 20000].into_iter();
        let second = store
            .create_project_with(&caller, input("Second"), || {
                numbers.next_back().unwrap_or(40000)
            })
            .await
            .unwrap();

        assert_eq!(
            second.custom_id,
            Some(format!("P-30000-{}", Utc::now().year()))
        );
    }
}
