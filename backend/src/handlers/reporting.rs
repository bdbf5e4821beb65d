//! Reporting handlers for dashboard metrics and data export

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::reporting::{DashboardMetrics, ReportFilter, ReportingService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub format: Option<String>, // "json" or "csv"
}

/// Get dashboard metrics
pub async fn get_dashboard(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<DashboardMetrics>> {
    let service = ReportingService::new(state.db.clone());
    let metrics = service.get_dashboard_metrics().await?;
    Ok(Json(metrics))
}

/// Get per-product stock report
pub async fn get_stock_report(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<impl IntoResponse> {
    let service = ReportingService::new(state.db.clone());
    let data = service.get_stock_report().await?;

    if query.format.as_deref() == Some("csv") {
        let csv = ReportingService::export_to_csv(&data)?;
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"stock_report.csv\"",
                ),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(data).into_response())
    }
}

/// Get movement report over a date range
pub async fn get_movement_report(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<impl IntoResponse> {
    let service = ReportingService::new(state.db.clone());

    let filter = ReportFilter {
        start_date: query.start_date,
        end_date: query.end_date,
    };

    let data = service.get_movement_report(&filter).await?;

    if query.format.as_deref() == Some("csv") {
        let csv = ReportingService::export_to_csv(&data)?;
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"movement_report.csv\"",
                ),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(data).into_response())
    }
}
