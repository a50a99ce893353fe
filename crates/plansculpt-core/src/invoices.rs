//! Invoices, their line items and the payment linkage

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use plansculpt_db::entities::{
    invoice::{self, InvoiceStatus},
    invoice_line_item, project,
    transaction::{self, TransactionKind},
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::access::Caller;
use crate::audit::AuditAction;
use crate::error::{CoreError, CoreResult};
use crate::money;
use crate::store::Store;

/// Income category used when an invoice is paid
pub const INVOICE_PAYMENT_CATEGORY: &str = "Invoice Payment";

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct LineItemInput {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

/// Create or full-update request for an invoice
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct InvoiceInput {
    #[serde(default)]
    pub project_id: Option<Uuid>,
    /// Defaults to the project's client
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub client_email: Option<String>,
    /// Defaults to Draft
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
    /// Defaults to today
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub items: Vec<LineItemInput>,
    /// Informational only; the stored total is always recomputed
    #[serde(default)]
    pub total: Option<Decimal>,
}

/// Line item after validation
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValidLineItem {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl InvoiceInput {
    pub(crate) fn validate(&self, today: NaiveDate) -> CoreResult<(Vec<ValidLineItem>, NaiveDate)> {
        let mut items = Vec::with_capacity(self.items.len());
        for (index, item) in self.items.iter().enumerate() {
            let description = item.description.trim();
            if description.is_empty() {
                return Err(CoreError::Validation(format!(
                    "Line item {} needs a description",
                    index + 1
                )));
            }
            let quantity = money::require_positive("Quantity", item.quantity)?;
            let unit_price = money::require_non_negative("Unit price", item.unit_price)?;
            items.push(ValidLineItem {
                description: description.to_string(),
                quantity,
                unit_price,
            });
        }

        let date = self.date.unwrap_or(today);
        if let Some(due_date) = self.due_date {
            if due_date < date {
                return Err(CoreError::Validation(format!(
                    "Due date {} is before invoice date {}",
                    due_date, date
                )));
            }
        }

        Ok((items, date))
    }
}

/// Σ quantity × unit price
pub fn invoice_total<I>(items: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, Decimal)>,
{
    money::sum(items.into_iter().map(|(quantity, price)| quantity * price))
}

pub fn payment_description(invoice_id: Uuid) -> String {
    format!("Payment for Invoice #{}", invoice_id)
}

/// An invoice with its ordered line items
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDetail {
    pub invoice: invoice::Model,
    pub items: Vec<invoice_line_item::Model>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

async fn insert_items(
    txn: &DatabaseTransaction,
    invoice_id: Uuid,
    items: &[ValidLineItem],
) -> CoreResult<Vec<invoice_line_item::Model>> {
    let mut stored = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let model = invoice_line_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_id: Set(invoice_id),
            position: Set(position as i32),
            description: Set(item.description.clone()),
            quantity: Set(item.quantity),
            unit_price: Set(item.unit_price),
        }
        .insert(txn)
        .await?;
        stored.push(normalize_item(model));
    }
    Ok(stored)
}

/// Book the income for a paid invoice unless it already has one
async fn link_payment(
    txn: &DatabaseTransaction,
    invoice: &invoice::Model,
    project_id: Uuid,
    amount: Decimal,
) -> CoreResult<Option<transaction::Model>> {
    if amount <= Decimal::ZERO {
        debug!("Invoice {} has nothing to collect, no payment booked", invoice.id);
        return Ok(None);
    }

    let existing = transaction::Entity::find()
        .filter(transaction::Column::InvoiceId.eq(invoice.id))
        .count(txn)
        .await?;
    if existing > 0 {
        debug!("Invoice {} already has a payment transaction", invoice.id);
        return Ok(None);
    }

    let income = transaction::ActiveModel {
        id: Set(Uuid::new_v4()),
        kind: Set(TransactionKind::Income),
        amount: Set(amount),
        category: Set(INVOICE_PAYMENT_CATEGORY.to_string()),
        description: Set(payment_description(invoice.id)),
        date: Set(Utc::now().date_naive()),
        project_id: Set(Some(project_id)),
        employee_id: Set(None),
        invoice_id: Set(Some(invoice.id)),
        payroll_run_id: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(txn)
    .await?;

    info!(
        "Recorded payment of {} for invoice {}",
        income.amount, invoice.id
    );
    Ok(Some(income))
}

impl Store {
    /// All invoices, newest invoice date first
    pub async fn list_invoices(&self) -> CoreResult<Vec<InvoiceDetail>> {
        let invoices = invoice::Entity::find()
            .order_by_desc(invoice::Column::Date)
            .order_by_desc(invoice::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let mut items: HashMap<Uuid, Vec<invoice_line_item::Model>> = HashMap::new();
        for item in invoice_line_item::Entity::find()
            .order_by_asc(invoice_line_item::Column::Position)
            .all(&self.db)
            .await?
        {
            items
                .entry(item.invoice_id)
                .or_default()
                .push(normalize_item(item));
        }

        debug!("Listed {} invoices", invoices.len());

        Ok(invoices
            .into_iter()
            .map(|invoice| InvoiceDetail {
                items: items.remove(&invoice.id).unwrap_or_default(),
                invoice: normalize(invoice),
            })
            .collect())
    }

    pub async fn get_invoice(&self, id: Uuid) -> CoreResult<InvoiceDetail> {
        let invoice = invoice::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("Invoice", id))?;

        let items = invoice_line_item::Entity::find()
            .filter(invoice_line_item::Column::InvoiceId.eq(id))
            .order_by_asc(invoice_line_item::Column::Position)
            .all(&self.db)
            .await?
            .into_iter()
            .map(normalize_item)
            .collect();

        Ok(InvoiceDetail {
            invoice: normalize(invoice),
            items,
        })
    }

    async fn find_invoice_project<C>(
        &self,
        conn: &C,
        project_id: Option<Uuid>,
    ) -> CoreResult<Option<project::Model>>
    where
        C: ConnectionTrait,
    {
        match project_id {
            Some(project_id) => project::Entity::find_by_id(project_id)
                .one(conn)
                .await?
                .map(Some)
                .ok_or_else(|| {
                    CoreError::Validation(format!("Project {} does not exist", project_id))
                }),
            None => Ok(None),
        }
    }

    /// Create an invoice; an invoice created as Paid books its payment at once
    pub async fn create_invoice(
        &self,
        caller: &Caller,
        input: InvoiceInput,
    ) -> CoreResult<InvoiceDetail> {
        let today = Utc::now().date_naive();
        let (items, date) = input.validate(today)?;
        let project = self.find_invoice_project(&self.db, input.project_id).await?;

        let total = invoice_total(items.iter().map(|i| (i.quantity, i.unit_price)));
        warn_on_total_mismatch(None, input.total, total);

        let status = input.status.unwrap_or_default();
        let client_name = non_blank(&input.client_name)
            .or_else(|| project.as_ref().map(|p| p.client.clone()));
        let client_email = non_blank(&input.client_email)
            .or_else(|| project.as_ref().and_then(|p| p.client_email.clone()));

        let txn = self.db.begin().await?;

        let invoice = invoice::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(input.project_id),
            client_name: Set(client_name),
            client_email: Set(client_email),
            total: Set(total),
            status: Set(status),
            date: Set(date),
            due_date: Set(input.due_date),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        let stored_items = insert_items(&txn, invoice.id, &items).await?;

        if status == InvoiceStatus::Paid {
            if let Some(project_id) = invoice.project_id {
                link_payment(&txn, &invoice, project_id, total).await?;
            }
        }

        txn.commit().await?;

        info!("Created invoice {} for {}", invoice.id, total);
        self.audit
            .record(
                caller,
                AuditAction::CreateInvoice,
                format!("Created invoice #{} ({})", invoice.id, total),
            )
            .await;

        Ok(InvoiceDetail {
            invoice: normalize(invoice),
            items: stored_items,
        })
    }

    /// Replace an invoice and its line items.
    ///
    /// Moving a project invoice from any other status to Paid books exactly
    /// one income transaction in the same store transaction.
    pub async fn update_invoice(
        &self,
        caller: &Caller,
        id: Uuid,
        input: InvoiceInput,
    ) -> CoreResult<InvoiceDetail> {
        let today = Utc::now().date_naive();
        let (items, date) = input.validate(today)?;
        let existing = invoice::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("Invoice", id))?;
        let project = self.find_invoice_project(&self.db, input.project_id).await?;

        let total = invoice_total(items.iter().map(|i| (i.quantity, i.unit_price)));
        warn_on_total_mismatch(Some(id), input.total, total);

        let was_paid = existing.status == InvoiceStatus::Paid;
        let status = input.status.unwrap_or(existing.status);
        let client_name = non_blank(&input.client_name)
            .or_else(|| project.as_ref().map(|p| p.client.clone()));
        let client_email = non_blank(&input.client_email)
            .or_else(|| project.as_ref().and_then(|p| p.client_email.clone()));

        let txn = self.db.begin().await?;

        let mut active: invoice::ActiveModel = existing.into();
        active.project_id = Set(input.project_id);
        active.client_name = Set(client_name);
        active.client_email = Set(client_email);
        active.total = Set(total);
        active.status = Set(status);
        active.date = Set(date);
        active.due_date = Set(input.due_date);
        let invoice = active.update(&txn).await?;

        invoice_line_item::Entity::delete_many()
            .filter(invoice_line_item::Column::InvoiceId.eq(id))
            .exec(&txn)
            .await?;
        let stored_items = insert_items(&txn, id, &items).await?;

        if !was_paid && status == InvoiceStatus::Paid {
            if let Some(project_id) = invoice.project_id {
                link_payment(&txn, &invoice, project_id, total).await?;
            }
        }

        txn.commit().await?;

        info!("Updated invoice {}", id);
        self.audit
            .record(
                caller,
                AuditAction::UpdateInvoice,
                format!("Updated invoice #{}", id),
            )
            .await;

        Ok(InvoiceDetail {
            invoice: normalize(invoice),
            items: stored_items,
        })
    }

    /// Delete an invoice with its payment transaction and line items.
    ///
    /// Admin only. Runs as one store transaction.
    pub async fn delete_invoice(&self, caller: &Caller, id: Uuid) -> CoreResult<()> {
        caller.require_admin("delete invoices")?;
        invoice::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("Invoice", id))?;

        let txn = self.db.begin().await?;

        transaction::Entity::delete_many()
            .filter(transaction::Column::InvoiceId.eq(id))
            .exec(&txn)
            .await?;
        invoice_line_item::Entity::delete_many()
            .filter(invoice_line_item::Column::InvoiceId.eq(id))
            .exec(&txn)
            .await?;
        invoice::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        info!("Deleted invoice {}", id);
        self.audit
            .record(
                caller,
                AuditAction::DeleteInvoice,
                format!("Deleted invoice #{}", id),
            )
            .await;

        Ok(())
    }
}

fn warn_on_total_mismatch(id: Option<Uuid>, claimed: Option<Decimal>, computed: Decimal) {
    if let Some(claimed) = claimed {
        if money::round(claimed) != computed {
            warn!(
                "Ignoring client invoice total {} for {:?}; line items sum to {}",
                claimed, id, computed
            );
        }
    }
}

/// Totals come back from SQLite through f64
fn normalize(mut model: invoice::Model) -> invoice::Model {
    model.total = money::round(model.total);
    model
}

fn normalize_item(mut model: invoice_line_item::Model) -> invoice_line_item::Model {
    model.quantity = money::round(model.quantity);
    model.unit_price = money::round(model.unit_price);
    model
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(description: &str, quantity: Decimal, unit_price: Decimal) -> LineItemInput {
        LineItemInput {
            description: description.to_string(),
            quantity,
            unit_price,
        }
    }

    fn input(items: Vec<LineItemInput>) -> InvoiceInput {
        InvoiceInput {
            project_id: None,
            client_name: None,
            client_email: None,
            status: None,
            date: None,
            due_date: None,
            items,
            total: None,
        }
    }

    #[test]
    fn test_total_is_sum_of_line_items() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let (items, date) = input(vec![
            item("Design", dec!(2), dec!(150)),
            item("Build", dec!(1.5), dec!(300)),
        ])
        .validate(today)
        .unwrap();

        assert_eq!(date, today);
        let total = invoice_total(items.iter().map(|i| (i.quantity, i.unit_price)));
        assert_eq!(total, dec!(750));
        assert_eq!(total.to_string(), "750.00");
    }

    #[test]
    fn test_empty_invoice_totals_zero() {
        let total = invoice_total(std::iter::empty());
        assert_eq!(total, Decimal::ZERO);
    }

    #[test]
    fn test_rejects_bad_line_items() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        assert!(input(vec![item("", dec!(1), dec!(1))]).validate(today).is_err());
        assert!(input(vec![item("Fee", dec!(0), dec!(1))]).validate(today).is_err());
        assert!(input(vec![item("Fee", dec!(1), dec!(-1))])
            .validate(today)
            .is_err());
    }

    #[test]
    fn test_rejects_due_date_before_date() {
        let mut bad = input(Vec::new());
        bad.date = NaiveDate::from_ymd_opt(2024, 3, 10);
        bad.due_date = NaiveDate::from_ymd_opt(2024, 3, 1);

        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(matches!(bad.validate(today), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_payment_description() {
        let id = Uuid::nil();
        assert_eq!(
            payment_description(id),
            "Payment for Invoice #00000000-0000-0000-0000-000000000000"
        );
    }
}
