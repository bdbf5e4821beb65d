//! Product catalog models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product tracked by the inventory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    /// Unique short code printed on labels and order sheets
    pub product_code: String,
    pub price: Decimal,
    /// Current on-hand unit count. Mutated only through ledger operations.
    pub stock: i32,
    /// Units of `stock` flagged as damaged/unsellable
    pub damage_stock: i32,
    pub brand_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product brand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brand {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A product category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
