use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use plansculpt_core::{Caller, TransactionFilter};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::{
    ErrorResponse, Transaction, TransactionCreated, TransactionPayload, TransactionQuery,
};
use crate::AppState;

/// List transactions, newest first
#[utoipa::path(
    get,
    path = "/api/transactions",
    params(
        ("project_id" = Option<Uuid>, Query, description = "Filter by project"),
        ("employee_id" = Option<Uuid>, Query, description = "Filter by employee"),
        ("kind" = Option<String>, Query, description = "income or expense"),
        ("start_date" = Option<String>, Query, description = "Earliest date (YYYY-MM-DD, inclusive)"),
        ("end_date" = Option<String>, Query, description = "Latest date (YYYY-MM-DD, inclusive)")
    ),
    responses(
        (status = 200, description = "Transactions", body = Vec<Transaction>),
        (status = 400, description = "Invalid date range", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transactions"
)]
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TransactionQuery>,
) -> ApiResult<Json<Vec<Transaction>>> {
    let transactions = state
        .store
        .list_transactions(TransactionFilter {
            project_id: query.project_id,
            employee_id: query.employee_id,
            kind: query.kind,
            start_date: query.start_date,
            end_date: query.end_date,
        })
        .await?;
    Ok(Json(transactions.into_iter().map(Transaction::from).collect()))
}

/// Record one transaction, or an array of them all-or-nothing
#[utoipa::path(
    post,
    path = "/api/transactions",
    request_body = TransactionPayload,
    responses(
        (status = 201, description = "Transactions created", body = TransactionCreated),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Invoice already has a payment", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transactions"
)]
pub async fn create_transactions(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Json(payload): Json<TransactionPayload>,
) -> ApiResult<(StatusCode, Json<TransactionCreated>)> {
    let created = match payload {
        TransactionPayload::One(input) => TransactionCreated::One(
            state.store.create_transaction(&caller, input).await?.into(),
        ),
        TransactionPayload::Many(inputs) => TransactionCreated::Many(
            state
                .store
                .create_transactions(&caller, inputs)
                .await?
                .into_iter()
                .map(Transaction::from)
                .collect(),
        ),
    };
    Ok((StatusCode::CREATED, Json(created)))
}

/// Delete a transaction (admin only)
#[utoipa::path(
    delete,
    path = "/api/transactions/{id}",
    params(("id" = Uuid, Path, description = "Transaction ID")),
    responses(
        (status = 204, description = "Transaction deleted"),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transactions"
)]
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.store.delete_transaction(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
