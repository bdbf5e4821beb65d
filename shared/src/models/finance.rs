//! Expense/income models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a finance entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Expense,
    Income,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Expense => "expense",
            EntryType::Income => "income",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "expense" => Some(EntryType::Expense),
            "income" => Some(EntryType::Income),
            _ => None,
        }
    }
}

/// A single expense or income entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceEntry {
    pub id: Uuid,
    pub entry_type: EntryType,
    pub category: String,
    pub amount: Decimal,
    pub note: Option<String>,
    pub entry_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Totals over a period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceSummary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net: Decimal,
}
