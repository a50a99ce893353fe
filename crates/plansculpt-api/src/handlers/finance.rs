use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{Datelike, Utc};
use plansculpt_core::{Caller, PayrollMonthStatus, PayrollReport, Statement, StatementPreset};

use crate::error::{ApiError, ApiResult};
use crate::models::{Dashboard, ErrorResponse, PayrollRunRequest, StatementQuery};
use crate::AppState;

/// Company-wide revenue, expenses and pending invoices
#[utoipa::path(
    get,
    path = "/api/finance/dashboard",
    responses(
        (status = 200, description = "Dashboard summary", body = Dashboard)
    ),
    security(("bearer_auth" = [])),
    tag = "finance"
)]
pub async fn dashboard(State(state): State<Arc<AppState>>) -> ApiResult<Json<Dashboard>> {
    Ok(Json(state.store.dashboard().await?.into()))
}

/// Financial statement for a date range or a named preset
///
/// A `preset` wins over `start`/`end`. With no parameters the statement
/// covers the current month.
#[utoipa::path(
    get,
    path = "/api/finance/statement",
    params(
        ("start" = Option<String>, Query, description = "First day (YYYY-MM-DD, inclusive)"),
        ("end" = Option<String>, Query, description = "Last day (YYYY-MM-DD, inclusive)"),
        ("preset" = Option<String>, Query, description = "this-month, last-month, last-6-months, last-1-year, last-financial-year or all-time")
    ),
    responses(
        (status = 200, description = "Statement", body = Statement),
        (status = 400, description = "Invalid range or preset", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "finance"
)]
pub async fn statement(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatementQuery>,
) -> ApiResult<Json<Statement>> {
    let today = Utc::now().date_naive();

    let statement = match (query.preset.as_deref(), query.start, query.end) {
        (Some(preset), _, _) => {
            let preset: StatementPreset = preset.parse()?;
            state.store.statement_for_preset(preset, today).await?
        }
        (None, Some(start), Some(end)) => state.store.statement(start, end).await?,
        (None, None, None) => {
            state
                .store
                .statement_for_preset(StatementPreset::ThisMonth, today)
                .await?
        }
        _ => {
            return Err(ApiError::bad_request(
                "Both start and end are required for a custom range",
            ))
        }
    };

    Ok(Json(statement))
}

/// Whether payroll has run for a month
#[utoipa::path(
    get,
    path = "/api/payroll/{year}/{month}",
    params(
        ("year" = i32, Path, description = "Year"),
        ("month" = u32, Path, description = "Month (1-12)")
    ),
    responses(
        (status = 200, description = "Payroll status", body = PayrollMonthStatus),
        (status = 400, description = "Invalid month", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "payroll"
)]
pub async fn payroll_status(
    State(state): State<Arc<AppState>>,
    Path((year, month)): Path<(i32, u32)>,
) -> ApiResult<Json<PayrollMonthStatus>> {
    Ok(Json(state.store.payroll_status(year, month).await?))
}

/// Pay every active fixed employee for a month (admin only)
#[utoipa::path(
    post,
    path = "/api/payroll/run",
    request_body = PayrollRunRequest,
    responses(
        (status = 200, description = "Payroll report; `already_run` when the month was processed", body = PayrollReport),
        (status = 400, description = "Invalid month", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "payroll"
)]
pub async fn run_payroll(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    body: Option<Json<PayrollRunRequest>>,
) -> ApiResult<Json<PayrollReport>> {
    let req = body.map(|Json(req)| req).unwrap_or_default();

    let period = match (req.year, req.month) {
        (None, None) => None,
        (year, month) => {
            let today = Utc::now().date_naive();
            Some((
                year.unwrap_or(today.year()),
                month.unwrap_or(today.month()),
            ))
        }
    };

    Ok(Json(state.store.run_payroll(&caller, period).await?))
}
