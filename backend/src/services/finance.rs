//! Expense/income service

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{EntryType, FinanceEntry, FinanceSummary};
use shared::validation::{validate_amount, validate_name};

use crate::error::{AppError, AppResult};

/// Finance service for expense/income entries
#[derive(Clone)]
pub struct FinanceService {
    db: PgPool,
}

/// Input for recording a finance entry
#[derive(Debug, Deserialize)]
pub struct CreateEntryInput {
    pub entry_type: EntryType,
    pub category: String,
    pub amount: Decimal,
    pub note: Option<String>,
    pub entry_date: Option<NaiveDate>,
}

/// Input for updating a finance entry
#[derive(Debug, Deserialize)]
pub struct UpdateEntryInput {
    pub category: Option<String>,
    pub amount: Option<Decimal>,
    pub note: Option<String>,
    pub entry_date: Option<NaiveDate>,
}

/// Filter for listing entries
#[derive(Debug, Default, Deserialize)]
pub struct EntryFilter {
    pub entry_type: Option<EntryType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, FromRow)]
struct EntryRow {
    id: Uuid,
    entry_type: String,
    category: String,
    amount: Decimal,
    note: Option<String>,
    entry_date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl EntryRow {
    fn into_model(self) -> AppResult<FinanceEntry> {
        let entry_type = EntryType::parse(&self.entry_type).ok_or_else(|| {
            AppError::Internal(format!("Unknown entry type '{}'", self.entry_type))
        })?;
        Ok(FinanceEntry {
            id: self.id,
            entry_type,
            category: self.category,
            amount: self.amount,
            note: self.note,
            entry_date: self.entry_date,
            created_at: self.created_at,
        })
    }
}

impl FinanceService {
    /// Create a new FinanceService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record an expense or income entry
    pub async fn create_entry(&self, input: CreateEntryInput) -> AppResult<FinanceEntry> {
        validate_entry_fields(&input.category, input.amount)?;

        let entry_date = input.entry_date.unwrap_or_else(|| Utc::now().date_naive());

        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            INSERT INTO finance_entries (entry_type, category, amount, note, entry_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, entry_type, category, amount, note, entry_date, created_at
            "#,
        )
        .bind(input.entry_type.as_str())
        .bind(&input.category)
        .bind(input.amount)
        .bind(&input.note)
        .bind(entry_date)
        .fetch_one(&self.db)
        .await?;

        row.into_model()
    }

    /// List entries, newest entry date first
    pub async fn list_entries(&self, filter: EntryFilter) -> AppResult<Vec<FinanceEntry>> {
        let rows = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT id, entry_type, category, amount, note, entry_date, created_at
            FROM finance_entries
            WHERE ($1::text IS NULL OR entry_type = $1)
              AND ($2::date IS NULL OR entry_date >= $2)
              AND ($3::date IS NULL OR entry_date <= $3)
            ORDER BY entry_date DESC, created_at DESC
            "#,
        )
        .bind(filter.entry_type.map(|t| t.as_str()))
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(EntryRow::into_model).collect()
    }

    /// Update a finance entry
    pub async fn update_entry(
        &self,
        entry_id: Uuid,
        input: UpdateEntryInput,
    ) -> AppResult<FinanceEntry> {
        let existing = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT id, entry_type, category, amount, note, entry_date, created_at
            FROM finance_entries
            WHERE id = $1
            "#,
        )
        .bind(entry_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Finance entry".to_string()))?;

        let category = input.category.unwrap_or(existing.category);
        let amount = input.amount.unwrap_or(existing.amount);
        let note = input.note.or(existing.note);
        let entry_date = input.entry_date.unwrap_or(existing.entry_date);

        validate_entry_fields(&category, amount)?;

        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            UPDATE finance_entries
            SET category = $1, amount = $2, note = $3, entry_date = $4
            WHERE id = $5
            RETURNING id, entry_type, category, amount, note, entry_date, created_at
            "#,
        )
        .bind(&category)
        .bind(amount)
        .bind(&note)
        .bind(entry_date)
        .bind(entry_id)
        .fetch_one(&self.db)
        .await?;

        row.into_model()
    }

    /// Delete a finance entry
    pub async fn delete_entry(&self, entry_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM finance_entries WHERE id = $1")
            .bind(entry_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Finance entry".to_string()));
        }

        Ok(())
    }

    /// Totals over a period (whole history when no bounds given)
    pub async fn get_summary(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> AppResult<FinanceSummary> {
        let (total_income, total_expense) = sqlx::query_as::<_, (Decimal, Decimal)>(
            r#"
            SELECT COALESCE(SUM(CASE WHEN entry_type = 'income' THEN amount ELSE 0 END), 0),
                   COALESCE(SUM(CASE WHEN entry_type = 'expense' THEN amount ELSE 0 END), 0)
            FROM finance_entries
            WHERE ($1::date IS NULL OR entry_date >= $1)
              AND ($2::date IS NULL OR entry_date <= $2)
            "#,
        )
        .bind(start_date)
        .bind(end_date)
        .fetch_one(&self.db)
        .await?;

        Ok(FinanceSummary {
            total_income,
            total_expense,
            net: total_income - total_expense,
        })
    }
}

fn validate_entry_fields(category: &str, amount: Decimal) -> AppResult<()> {
    validate_name(category).map_err(|msg| AppError::Validation {
        field: "category".to_string(),
        message: msg.to_string(),
    })?;
    validate_amount(amount).map_err(|msg| AppError::Validation {
        field: "amount".to_string(),
        message: msg.to_string(),
    })?;
    Ok(())
}
