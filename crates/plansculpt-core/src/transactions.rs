//! Income and expense transactions

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use plansculpt_db::entities::{
    employee, invoice, project,
    transaction::{self, TransactionKind},
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::access::Caller;
use crate::audit::AuditAction;
use crate::error::{CoreError, CoreResult};
use crate::finance::normalize_transaction;
use crate::money;
use crate::store::Store;

/// Request to record one transaction
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct TransactionInput {
    pub kind: TransactionKind,
    /// Must be greater than 0
    pub amount: Decimal,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to today
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub employee_id: Option<Uuid>,
    #[serde(default)]
    pub invoice_id: Option<Uuid>,
}

impl TransactionInput {
    pub(crate) fn validate(&self) -> CoreResult<(Decimal, String)> {
        let amount = money::require_positive("Amount", self.amount)?;
        let category = self.category.trim();
        if category.is_empty() {
            return Err(CoreError::validation("Transaction category is required"));
        }
        Ok((amount, category.to_string()))
    }
}

/// Filters for the transaction list; dates are inclusive
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub project_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub kind: Option<TransactionKind>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Store {
    /// Transactions matching `filter`, newest first
    pub async fn list_transactions(
        &self,
        filter: TransactionFilter,
    ) -> CoreResult<Vec<transaction::Model>> {
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            if start > end {
                return Err(CoreError::Validation(format!(
                    "Start date {} is after end date {}",
                    start, end
                )));
            }
        }

        let mut query = transaction::Entity::find();
        if let Some(project_id) = filter.project_id {
            query = query.filter(transaction::Column::ProjectId.eq(project_id));
        }
        if let Some(employee_id) = filter.employee_id {
            query = query.filter(transaction::Column::EmployeeId.eq(employee_id));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(transaction::Column::Kind.eq(kind));
        }
        if let Some(start) = filter.start_date {
            query = query.filter(transaction::Column::Date.gte(start));
        }
        if let Some(end) = filter.end_date {
            query = query.filter(transaction::Column::Date.lte(end));
        }

        let transactions = query
            .order_by_desc(transaction::Column::Date)
            .order_by_desc(transaction::Column::CreatedAt)
            .all(&self.db)
            .await?;
        debug!("Listed {} transactions", transactions.len());
        Ok(transactions.into_iter().map(normalize_transaction).collect())
    }

    pub async fn create_transaction(
        &self,
        caller: &Caller,
        input: TransactionInput,
    ) -> CoreResult<transaction::Model> {
        let mut created = self.create_transactions(caller, vec![input]).await?;
        created
            .pop()
            .ok_or_else(|| CoreError::Internal("transaction insert returned nothing".to_string()))
    }

    /// Record several transactions at once; either all are stored or none
    pub async fn create_transactions(
        &self,
        caller: &Caller,
        inputs: Vec<TransactionInput>,
    ) -> CoreResult<Vec<transaction::Model>> {
        if inputs.is_empty() {
            return Err(CoreError::validation("No transactions given"));
        }

        let mut validated = Vec::with_capacity(inputs.len());
        for input in &inputs {
            validated.push(input.validate()?);
        }
        self.check_transaction_refs(&inputs).await?;

        let today = Utc::now().date_naive();
        let txn = self.db.begin().await?;

        let mut created = Vec::with_capacity(inputs.len());
        for (input, (amount, category)) in inputs.into_iter().zip(validated) {
            let model = transaction::ActiveModel {
                id: Set(Uuid::new_v4()),
                kind: Set(input.kind),
                amount: Set(amount),
                category: Set(category),
                description: Set(input.description.unwrap_or_default().trim().to_string()),
                date: Set(input.date.unwrap_or(today)),
                project_id: Set(input.project_id),
                employee_id: Set(input.employee_id),
                invoice_id: Set(input.invoice_id),
                payroll_run_id: Set(None),
                created_at: Set(Utc::now()),
            }
            .insert(&txn)
            .await?;
            created.push(normalize_transaction(model));
        }

        txn.commit().await?;

        info!("Recorded {} transactions", created.len());
        let details = match created.as_slice() {
            [single] => format!(
                "Recorded {} of {} ({})",
                single.kind.as_str(),
                single.amount,
                single.category
            ),
            many => format!("Recorded {} transactions", many.len()),
        };
        self.audit
            .record(caller, AuditAction::CreateTransaction, details)
            .await;

        Ok(created)
    }

    /// Every referenced project, employee and invoice must exist
    async fn check_transaction_refs(&self, inputs: &[TransactionInput]) -> CoreResult<()> {
        let projects: HashSet<Uuid> = inputs.iter().filter_map(|i| i.project_id).collect();
        for id in projects {
            if project::Entity::find_by_id(id).count(&self.db).await? == 0 {
                return Err(CoreError::Validation(format!(
                    "Project {} does not exist",
                    id
                )));
            }
        }

        let employees: HashSet<Uuid> = inputs.iter().filter_map(|i| i.employee_id).collect();
        for id in employees {
            if employee::Entity::find_by_id(id).count(&self.db).await? == 0 {
                return Err(CoreError::Validation(format!(
                    "Employee {} does not exist",
                    id
                )));
            }
        }

        let mut invoices = HashSet::new();
        for id in inputs.iter().filter_map(|i| i.invoice_id) {
            if !invoices.insert(id) {
                return Err(CoreError::Conflict(format!(
                    "Invoice {} can only be linked to one transaction",
                    id
                )));
            }
            if invoice::Entity::find_by_id(id).count(&self.db).await? == 0 {
                return Err(CoreError::Validation(format!(
                    "Invoice {} does not exist",
                    id
                )));
            }
        }

        Ok(())
    }

    /// Admin only
    pub async fn delete_transaction(&self, caller: &Caller, id: Uuid) -> CoreResult<()> {
        caller.require_admin("delete transactions")?;

        let existing = transaction::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("Transaction", id))?;
        transaction::Entity::delete_by_id(id).exec(&self.db).await?;

        info!("Deleted transaction {}", id);
        self.audit
            .record(
                caller,
                AuditAction::DeleteTransaction,
                format!(
                    "Deleted transaction ID: {} ({} {})",
                    id,
                    existing.kind.as_str(),
                    money::round(existing.amount)
                ),
            )
            .await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input(amount: Decimal, category: &str) -> TransactionInput {
        TransactionInput {
            kind: TransactionKind::Expense,
            amount,
            category: category.to_string(),
            description: None,
            date: None,
            project_id: None,
            employee_id: None,
            invoice_id: None,
        }
    }

    #[test]
    fn test_validate() {
        assert_eq!(
            input(dec!(19.999), " Rent ").validate().unwrap(),
            (dec!(20.00), "Rent".to_string())
        );
        assert!(input(dec!(0), "Rent").validate().is_err());
        assert!(input(dec!(10), " ").validate().is_err());
    }
}
