//! Order models
//!
//! Orders record what a shop asked for; they do not move stock. Stock is
//! adjusted at physical movement time (outgoing/incoming).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Placed,
    Shipped,
    Delivered,
    Cancelled,
    Due,
    Received,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "placed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Due => "due",
            OrderStatus::Received => "received",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "placed" => Some(OrderStatus::Placed),
            "shipped" => Some(OrderStatus::Shipped),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            "due" => Some(OrderStatus::Due),
            "received" => Some(OrderStatus::Received),
            _ => None,
        }
    }

    /// Whether `self -> to` is an allowed lifecycle step
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (*self, to),
            (Placed, Shipped)
                | (Placed, Cancelled)
                | (Shipped, Delivered)
                | (Shipped, Cancelled)
                | (Delivered, Due)
                | (Delivered, Received)
                | (Due, Received)
        )
    }
}

/// Payment state, derived from paid vs total amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Due,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Due => "due",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(PaymentStatus::Unpaid),
            "paid" => Some(PaymentStatus::Paid),
            "due" => Some(PaymentStatus::Due),
            _ => None,
        }
    }

    /// Derive the payment status from amounts
    pub fn from_amounts(total: Decimal, paid: Decimal) -> Self {
        if paid <= Decimal::ZERO {
            PaymentStatus::Unpaid
        } else if paid >= total {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Due
        }
    }
}

/// An order placed by a shop through an SR
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub employee_id: Uuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub due_amount: Decimal,
    /// Units sent back by the shop, bookkeeping only
    pub returned_quantity: i32,
    /// Units reported damaged by the shop, bookkeeping only
    pub damage_quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line of an order; owned by the order and deleted with it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
    pub total: Decimal,
}

/// An order with its items, as returned by read endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}
