//! Reporting service for dashboard metrics and data export

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

/// Dashboard metrics
#[derive(Debug, Serialize)]
pub struct DashboardMetrics {
    pub total_products: i64,
    pub total_stock_units: i64,
    pub total_damage_units: i64,
    pub low_stock_products: i64,
    pub total_shops: i64,
    pub active_employees: i64,
    pub total_orders: i64,
    pub open_orders: i64,
    pub total_revenue: Decimal,
    pub total_due: Decimal,
    pub outgoing_movements: i64,
    pub incoming_movements: i64,
    pub net_finance: Decimal,
}

/// Stock report entry
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct StockReportRow {
    pub product_id: Uuid,
    pub product_code: String,
    pub name: String,
    pub stock: i32,
    pub damage_stock: i32,
    pub price: Decimal,
    pub stock_value: Decimal,
}

/// Movement report entry over a date range
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct MovementReportRow {
    pub movement_id: Uuid,
    pub kind: String,
    pub employee_name: Option<String>,
    pub total: Decimal,
    pub total_quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// Report filter parameters
#[derive(Debug, Default, Deserialize)]
pub struct ReportFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Stock threshold below which a product counts as low-stock
const LOW_STOCK_THRESHOLD: i32 = 10;

impl ReportingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get dashboard metrics
    pub async fn get_dashboard_metrics(&self) -> AppResult<DashboardMetrics> {
        let (total_products, total_stock_units, total_damage_units, low_stock_products) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(
                r#"
                SELECT COUNT(*),
                       COALESCE(SUM(stock), 0)::bigint,
                       COALESCE(SUM(damage_stock), 0)::bigint,
                       COUNT(*) FILTER (WHERE stock <= $1)
                FROM products
                "#,
            )
            .bind(LOW_STOCK_THRESHOLD)
            .fetch_one(&self.db)
            .await?;

        let total_shops: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shops")
            .fetch_one(&self.db)
            .await?;

        let active_employees: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM employees WHERE is_active = true")
                .fetch_one(&self.db)
                .await?;

        let (total_orders, open_orders, total_revenue, total_due) =
            sqlx::query_as::<_, (i64, i64, Decimal, Decimal)>(
                r#"
                SELECT COUNT(*),
                       COUNT(*) FILTER (WHERE status IN ('placed', 'shipped')),
                       COALESCE(SUM(paid_amount), 0),
                       COALESCE(SUM(due_amount), 0)
                FROM orders
                WHERE status != 'cancelled'
                "#,
            )
            .fetch_one(&self.db)
            .await?;

        let (outgoing_movements, incoming_movements) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(*) FILTER (WHERE kind = 'outgoing'),
                   COUNT(*) FILTER (WHERE kind IN ('incoming', 'incoming_admin'))
            FROM movements
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        let net_finance: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(CASE WHEN entry_type = 'income' THEN amount ELSE -amount END), 0)
            FROM finance_entries
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        Ok(DashboardMetrics {
            total_products,
            total_stock_units,
            total_damage_units,
            low_stock_products,
            total_shops,
            active_employees,
            total_orders,
            open_orders,
            total_revenue,
            total_due,
            outgoing_movements,
            incoming_movements,
            net_finance,
        })
    }

    /// Per-product stock report with valuation at current price
    pub async fn get_stock_report(&self) -> AppResult<Vec<StockReportRow>> {
        let rows = sqlx::query_as::<_, StockReportRow>(
            r#"
            SELECT id as product_id, product_code, name, stock, damage_stock, price,
                   price * stock as stock_value
            FROM products
            ORDER BY name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Movements over a date range, newest first
    pub async fn get_movement_report(
        &self,
        filter: &ReportFilter,
    ) -> AppResult<Vec<MovementReportRow>> {
        let rows = sqlx::query_as::<_, MovementReportRow>(
            r#"
            SELECT m.id as movement_id, m.kind, e.name as employee_name,
                   m.total, m.total_quantity, m.created_at
            FROM movements m
            LEFT JOIN employees e ON e.id = m.employee_id
            WHERE ($1::date IS NULL OR m.created_at::date >= $1)
              AND ($2::date IS NULL OR m.created_at::date <= $2)
            ORDER BY m.created_at DESC
            "#,
        )
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record).map_err(|e| {
                crate::error::AppError::Internal(format!("CSV serialization error: {}", e))
            })?;
        }
        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| crate::error::AppError::Internal(format!("CSV writer error: {}", e)))?,
        )
        .map_err(|e| crate::error::AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
        Ok(csv_data)
    }
}
