//! Stock movement models
//!
//! A movement is a recorded change to inventory: outgoing (stock leaving),
//! incoming (stock arriving), or incoming_admin (bulk administrative
//! restock with no owning employee).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Outgoing,
    Incoming,
    IncomingAdmin,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Outgoing => "outgoing",
            MovementKind::Incoming => "incoming",
            MovementKind::IncomingAdmin => "incoming_admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "outgoing" => Some(MovementKind::Outgoing),
            "incoming" => Some(MovementKind::Incoming),
            "incoming_admin" => Some(MovementKind::IncomingAdmin),
            _ => None,
        }
    }
}

/// Reason tag on an incoming movement item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IncomingReason {
    #[default]
    Restock,
    Returned,
    /// Units arrive damaged: stock and damage_stock both rise
    Damaged,
}

impl IncomingReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncomingReason::Restock => "restock",
            IncomingReason::Returned => "returned",
            IncomingReason::Damaged => "damaged",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "restock" => Some(IncomingReason::Restock),
            "returned" => Some(IncomingReason::Returned),
            "damaged" => Some(IncomingReason::Damaged),
            _ => None,
        }
    }
}

/// A recorded stock movement with aggregates over its items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    pub id: Uuid,
    pub kind: MovementKind,
    /// Null for admin movements
    pub employee_id: Option<Uuid>,
    pub total: Decimal,
    pub total_quantity: i32,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line of a movement; owned by the movement and deleted with it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementItem {
    pub id: Uuid,
    pub movement_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub reason: Option<IncomingReason>,
}

/// A movement with its items, as returned by read endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementWithItems {
    #[serde(flatten)]
    pub movement: Movement,
    pub items: Vec<MovementItem>,
}
