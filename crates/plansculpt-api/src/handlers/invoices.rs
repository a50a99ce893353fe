use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use plansculpt_core::{Caller, InvoiceInput};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::{ErrorResponse, Invoice};
use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/invoices",
    responses(
        (status = 200, description = "Invoices with line items", body = Vec<Invoice>)
    ),
    security(("bearer_auth" = [])),
    tag = "invoices"
)]
pub async fn list_invoices(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Invoice>>> {
    let invoices = state.store.list_invoices().await?;
    Ok(Json(invoices.into_iter().map(Invoice::from).collect()))
}

/// Create an invoice; the total is computed from the line items
#[utoipa::path(
    post,
    path = "/api/invoices",
    request_body = InvoiceInput,
    responses(
        (status = 201, description = "Invoice created", body = Invoice),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "invoices"
)]
pub async fn create_invoice(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<InvoiceInput>,
) -> ApiResult<(StatusCode, Json<Invoice>)> {
    let created = state.store.create_invoice(&caller, input).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    get,
    path = "/api/invoices/{id}",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice", body = Invoice),
        (status = 404, description = "Invoice not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "invoices"
)]
pub async fn get_invoice(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Invoice>> {
    Ok(Json(state.store.get_invoice(id).await?.into()))
}

/// Replace an invoice; moving a project invoice to Paid books its payment
#[utoipa::path(
    put,
    path = "/api/invoices/{id}",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    request_body = InvoiceInput,
    responses(
        (status = 200, description = "Invoice updated", body = Invoice),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Invoice not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "invoices"
)]
pub async fn update_invoice(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(input): Json<InvoiceInput>,
) -> ApiResult<Json<Invoice>> {
    Ok(Json(state.store.update_invoice(&caller, id, input).await?.into()))
}

/// Delete an invoice with its payment and line items (admin only)
#[utoipa::path(
    delete,
    path = "/api/invoices/{id}",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 204, description = "Invoice deleted"),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Invoice not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "invoices"
)]
pub async fn delete_invoice(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.store.delete_invoice(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
