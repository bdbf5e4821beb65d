//! HTTP handlers for expense/income endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use shared::models::{FinanceEntry, FinanceSummary};
use shared::types::MutationResponse;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::finance::{CreateEntryInput, EntryFilter, FinanceService, UpdateEntryInput};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Record an expense or income entry
pub async fn create_finance_entry(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateEntryInput>,
) -> AppResult<Json<FinanceEntry>> {
    let service = FinanceService::new(state.db);
    let entry = service.create_entry(input).await?;
    Ok(Json(entry))
}

/// List finance entries
pub async fn list_finance_entries(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<EntryFilter>,
) -> AppResult<Json<Vec<FinanceEntry>>> {
    let service = FinanceService::new(state.db);
    let entries = service.list_entries(filter).await?;
    Ok(Json(entries))
}

/// Update a finance entry
pub async fn update_finance_entry(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(entry_id): Path<Uuid>,
    Json(input): Json<UpdateEntryInput>,
) -> AppResult<Json<FinanceEntry>> {
    let service = FinanceService::new(state.db);
    let entry = service.update_entry(entry_id, input).await?;
    Ok(Json(entry))
}

/// Delete a finance entry
pub async fn delete_finance_entry(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<MutationResponse>> {
    let service = FinanceService::new(state.db);
    service.delete_entry(entry_id).await?;
    Ok(Json(MutationResponse::ok("Finance entry deleted", entry_id)))
}

/// Income/expense totals over a period
pub async fn get_finance_summary(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<SummaryQuery>,
) -> AppResult<Json<FinanceSummary>> {
    let service = FinanceService::new(state.db);
    let summary = service.get_summary(query.start_date, query.end_date).await?;
    Ok(Json(summary))
}
