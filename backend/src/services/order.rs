//! Order management service
//!
//! Orders record what a shop requested through an SR. Creating an order
//! never adjusts product stock; stock moves when goods physically leave or
//! arrive (movement service).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{Order, OrderItem, OrderStatus, OrderWithItems, PaymentStatus};
use shared::validation::{validate_price, validate_quantity};

use crate::error::{AppError, AppResult};

/// Order service
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
}

/// One requested order line. Price defaults to the product's current price.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Option<Decimal>,
}

/// Input for creating an order
#[derive(Debug, Deserialize)]
pub struct CreateOrderInput {
    pub shop_id: Uuid,
    pub employee_id: Uuid,
    pub items: Vec<OrderItemInput>,
}

/// Input for updating an order's status
#[derive(Debug, Deserialize)]
pub struct UpdateStatusInput {
    pub status: OrderStatus,
}

/// Input for recording a payment against an order
#[derive(Debug, Deserialize)]
pub struct UpdatePaymentInput {
    pub paid_amount: Decimal,
}

/// Input for recording returned/damaged units on an order
#[derive(Debug, Deserialize)]
pub struct RecordReturnsInput {
    pub returned_quantity: Option<i32>,
    pub damage_quantity: Option<i32>,
}

/// Filter for listing orders
#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub shop_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    shop_id: Uuid,
    employee_id: Uuid,
    status: String,
    payment_status: String,
    total_amount: Decimal,
    paid_amount: Decimal,
    due_amount: Decimal,
    returned_quantity: i32,
    damage_quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_model(self) -> AppResult<Order> {
        let status = OrderStatus::parse(&self.status)
            .ok_or_else(|| AppError::Internal(format!("Unknown order status '{}'", self.status)))?;
        let payment_status = PaymentStatus::parse(&self.payment_status).ok_or_else(|| {
            AppError::Internal(format!("Unknown payment status '{}'", self.payment_status))
        })?;
        Ok(Order {
            id: self.id,
            shop_id: self.shop_id,
            employee_id: self.employee_id,
            status,
            payment_status,
            total_amount: self.total_amount,
            paid_amount: self.paid_amount,
            due_amount: self.due_amount,
            returned_quantity: self.returned_quantity,
            damage_quantity: self.damage_quantity,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    price: Decimal,
    total: Decimal,
}

impl OrderItemRow {
    fn into_model(self) -> OrderItem {
        OrderItem {
            id: self.id,
            order_id: self.order_id,
            product_id: self.product_id,
            quantity: self.quantity,
            price: self.price,
            total: self.total,
        }
    }
}

const ORDER_COLUMNS: &str = "id, shop_id, employee_id, status, payment_status, total_amount, paid_amount, due_amount, returned_quantity, damage_quantity, created_at, updated_at";

impl OrderService {
    /// Create a new OrderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an order with its items in one transaction
    pub async fn create_order(&self, input: CreateOrderInput) -> AppResult<OrderWithItems> {
        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "Order must contain at least one item".to_string(),
            });
        }
        for item in &input.items {
            validate_quantity(item.quantity).map_err(|msg| AppError::Validation {
                field: "quantity".to_string(),
                message: msg.to_string(),
            })?;
            if let Some(price) = item.price {
                validate_price(price).map_err(|msg| AppError::Validation {
                    field: "price".to_string(),
                    message: msg.to_string(),
                })?;
            }
        }

        let shop_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM shops WHERE id = $1)")
                .bind(input.shop_id)
                .fetch_one(&self.db)
                .await?;
        if !shop_exists {
            return Err(AppError::NotFound("Shop".to_string()));
        }

        let employee_active =
            sqlx::query_scalar::<_, bool>("SELECT is_active FROM employees WHERE id = $1")
                .bind(input.employee_id)
                .fetch_optional(&self.db)
                .await?;
        match employee_active {
            Some(true) => {}
            Some(false) => {
                return Err(AppError::Validation {
                    field: "employee_id".to_string(),
                    message: "Employee is deactivated".to_string(),
                })
            }
            None => return Err(AppError::NotFound("Employee".to_string())),
        }

        let mut tx = self.db.begin().await?;

        let order_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO orders (shop_id, employee_id, status, payment_status,
                                total_amount, paid_amount, due_amount)
            VALUES ($1, $2, $3, $4, 0, 0, 0)
            RETURNING id
            "#,
        )
        .bind(input.shop_id)
        .bind(input.employee_id)
        .bind(OrderStatus::Placed.as_str())
        .bind(PaymentStatus::Unpaid.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let mut total_amount = Decimal::ZERO;
        for item in &input.items {
            let catalog_price =
                sqlx::query_scalar::<_, Decimal>("SELECT price FROM products WHERE id = $1")
                    .bind(item.product_id)
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

            // Current catalog price unless the SR negotiated one
            let price = item.price.unwrap_or(catalog_price);

            let line_total = price * Decimal::from(item.quantity);
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, price, total)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(price)
            .bind(line_total)
            .execute(&mut *tx)
            .await?;

            total_amount += line_total;
        }

        sqlx::query("UPDATE orders SET total_amount = $1, due_amount = $1 WHERE id = $2")
            .bind(total_amount)
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get_order(order_id).await
    }

    /// Get an order with its items
    pub async fn get_order(&self, order_id: Uuid) -> AppResult<OrderWithItems> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1",
        ))
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        let items = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT id, order_id, product_id, quantity, price, total
            FROM order_items
            WHERE order_id = $1
            ORDER BY product_id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        Ok(OrderWithItems {
            order: row.into_model()?,
            items: items.into_iter().map(OrderItemRow::into_model).collect(),
        })
    }

    /// List orders, newest first
    pub async fn list_orders(&self, filter: OrderFilter) -> AppResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE ($1::uuid IS NULL OR shop_id = $1)
              AND ($2::uuid IS NULL OR employee_id = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY created_at DESC
            "#,
        ))
        .bind(filter.shop_id)
        .bind(filter.employee_id)
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(OrderRow::into_model).collect()
    }

    /// Update an order's status along the allowed transitions
    pub async fn update_status(&self, order_id: Uuid, input: UpdateStatusInput) -> AppResult<Order> {
        let current = self.get_order(order_id).await?.order;

        if !current.status.can_transition_to(input.status) {
            return Err(AppError::InvalidStateTransition(format!(
                "Cannot move order from {} to {}",
                current.status.as_str(),
                input.status.as_str()
            )));
        }

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING {ORDER_COLUMNS}",
        ))
        .bind(input.status.as_str())
        .bind(order_id)
        .fetch_one(&self.db)
        .await?;

        row.into_model()
    }

    /// Record a payment. Due amount and payment status are derived.
    pub async fn update_payment(
        &self,
        order_id: Uuid,
        input: UpdatePaymentInput,
    ) -> AppResult<Order> {
        let current = self.get_order(order_id).await?.order;

        if input.paid_amount < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "paid_amount".to_string(),
                message: "Paid amount cannot be negative".to_string(),
            });
        }
        if input.paid_amount > current.total_amount {
            return Err(AppError::Validation {
                field: "paid_amount".to_string(),
                message: "Paid amount cannot exceed the order total".to_string(),
            });
        }

        let due_amount = current.total_amount - input.paid_amount;
        let payment_status = PaymentStatus::from_amounts(current.total_amount, input.paid_amount);

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE orders
            SET paid_amount = $1, due_amount = $2, payment_status = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING {ORDER_COLUMNS}
            "#,
        ))
        .bind(input.paid_amount)
        .bind(due_amount)
        .bind(payment_status.as_str())
        .bind(order_id)
        .fetch_one(&self.db)
        .await?;

        row.into_model()
    }

    /// Record returned/damaged units reported by the shop.
    ///
    /// Bookkeeping only: restocking a return is done by recording an
    /// incoming movement with reason returned/damaged.
    pub async fn record_returns(
        &self,
        order_id: Uuid,
        input: RecordReturnsInput,
    ) -> AppResult<Order> {
        let existing = self.get_order(order_id).await?;
        let ordered_units: i32 = existing.items.iter().map(|i| i.quantity).sum();

        let returned = input
            .returned_quantity
            .unwrap_or(existing.order.returned_quantity);
        let damaged = input
            .damage_quantity
            .unwrap_or(existing.order.damage_quantity);

        if returned < 0 || damaged < 0 {
            return Err(AppError::Validation {
                field: "returned_quantity".to_string(),
                message: "Quantities cannot be negative".to_string(),
            });
        }
        if returned + damaged > ordered_units {
            return Err(AppError::Validation {
                field: "returned_quantity".to_string(),
                message: format!(
                    "Returned plus damaged units exceed the {} units ordered",
                    ordered_units
                ),
            });
        }

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE orders
            SET returned_quantity = $1, damage_quantity = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING {ORDER_COLUMNS}
            "#,
        ))
        .bind(returned)
        .bind(damaged)
        .bind(order_id)
        .fetch_one(&self.db)
        .await?;

        row.into_model()
    }

    /// Delete an order and its items
    pub async fn delete_order(&self, order_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Order".to_string()));
        }

        Ok(())
    }
}
