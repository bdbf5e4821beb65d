//! Stock movement service
//!
//! Creates, revises, and deletes outgoing/incoming movements. All stock
//! effects go through the ledger helpers so a movement either applies in
//! full or not at all.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::models::{IncomingReason, Movement, MovementItem, MovementKind, MovementWithItems};
use shared::validation::validate_quantity;

use crate::error::{AppError, AppResult};
use crate::services::ledger::{
    self, apply_deltas, deltas_for, lock_products, net_deltas, reversal, stage_deltas,
    LedgerItem, StagedProduct,
};

/// Movement service for recording and revising stock movements
#[derive(Clone)]
pub struct MovementService {
    db: PgPool,
}

/// One requested movement line
#[derive(Debug, Clone, Deserialize)]
pub struct MovementItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub reason: Option<IncomingReason>,
}

/// Input for creating an outgoing movement (stock leaving)
#[derive(Debug, Deserialize)]
pub struct CreateOutgoingInput {
    pub employee_id: Uuid,
    pub items: Vec<MovementItemInput>,
    pub note: Option<String>,
}

/// Input for creating an incoming movement (stock arriving)
#[derive(Debug, Deserialize)]
pub struct CreateIncomingInput {
    pub employee_id: Uuid,
    pub items: Vec<MovementItemInput>,
    pub note: Option<String>,
}

/// Input for a bulk administrative incoming movement (no owning employee)
#[derive(Debug, Deserialize)]
pub struct CreateIncomingAdminInput {
    pub items: Vec<MovementItemInput>,
    pub note: Option<String>,
}

/// Input for revising a movement's items
#[derive(Debug, Deserialize)]
pub struct UpdateMovementInput {
    pub items: Vec<MovementItemInput>,
}

/// Filter for listing movements
#[derive(Debug, Default, Deserialize)]
pub struct MovementFilter {
    pub kind: Option<MovementKind>,
    pub employee_id: Option<Uuid>,
}

/// Movement row as stored
#[derive(Debug, FromRow)]
struct MovementRow {
    id: Uuid,
    kind: String,
    employee_id: Option<Uuid>,
    total: Decimal,
    total_quantity: i32,
    note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MovementRow {
    fn into_model(self) -> AppResult<Movement> {
        let kind = MovementKind::parse(&self.kind)
            .ok_or_else(|| AppError::Internal(format!("Unknown movement kind '{}'", self.kind)))?;
        Ok(Movement {
            id: self.id,
            kind,
            employee_id: self.employee_id,
            total: self.total,
            total_quantity: self.total_quantity,
            note: self.note,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Movement item row as stored
#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    movement_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    line_total: Decimal,
    reason: Option<String>,
}

impl ItemRow {
    fn into_model(self) -> MovementItem {
        MovementItem {
            id: self.id,
            movement_id: self.movement_id,
            product_id: self.product_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
            line_total: self.line_total,
            reason: self.reason.as_deref().and_then(IncomingReason::parse),
        }
    }

    fn to_ledger_item(&self) -> LedgerItem {
        LedgerItem {
            product_id: self.product_id,
            quantity: self.quantity,
            reason: self.reason.as_deref().and_then(IncomingReason::parse),
        }
    }
}

impl MovementService {
    /// Create a new MovementService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record an outgoing movement, decrementing stock for each item
    pub async fn create_outgoing(&self, input: CreateOutgoingInput) -> AppResult<Uuid> {
        let items = validate_items(&input.items)?;
        self.ensure_employee(input.employee_id).await?;
        self.create_movement(
            MovementKind::Outgoing,
            Some(input.employee_id),
            items,
            input.note,
        )
        .await
    }

    /// Record an incoming movement, incrementing stock for each item.
    /// Items tagged damaged also raise the product's damage counter.
    pub async fn create_incoming(&self, input: CreateIncomingInput) -> AppResult<Uuid> {
        let items = validate_items(&input.items)?;
        self.ensure_employee(input.employee_id).await?;
        self.create_movement(
            MovementKind::Incoming,
            Some(input.employee_id),
            items,
            input.note,
        )
        .await
    }

    /// Record a bulk administrative incoming movement
    pub async fn create_incoming_admin(&self, input: CreateIncomingAdminInput) -> AppResult<Uuid> {
        let items = validate_items(&input.items)?;
        self.create_movement(MovementKind::IncomingAdmin, None, items, input.note)
            .await
    }

    /// Shared create path: lock, check, insert movement + items, adjust stock
    async fn create_movement(
        &self,
        kind: MovementKind,
        employee_id: Option<Uuid>,
        items: Vec<LedgerItem>,
        note: Option<String>,
    ) -> AppResult<Uuid> {
        let mut tx = self.db.begin().await?;

        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let locked = lock_products(&mut tx, &product_ids).await?;

        let deltas = deltas_for(kind, &items);
        let mut staged: BTreeMap<Uuid, StagedProduct> =
            locked.iter().map(|(id, p)| (*id, p.into())).collect();
        stage_deltas(&mut staged, &deltas)?;

        let movement_id = insert_movement(&mut tx, kind, employee_id, &items, &locked, note).await?;

        apply_deltas(&mut tx, &net_deltas(&deltas)).await?;

        tx.commit().await?;

        tracing::info!(
            "Recorded {} movement {} ({} items)",
            kind.as_str(),
            movement_id,
            product_ids.len()
        );

        Ok(movement_id)
    }

    /// Revise a movement's items.
    ///
    /// Reverses the old items' stock effects first, so the sufficiency check
    /// for the new set runs against the reversed baseline, then re-applies
    /// the movement's kind-specific logic for the new items. Net effect is
    /// "undo old, apply new" with no intermediate state visible outside the
    /// transaction.
    pub async fn update_movement(
        &self,
        movement_id: Uuid,
        input: UpdateMovementInput,
    ) -> AppResult<()> {
        let new_items = validate_items(&input.items)?;

        let mut tx = self.db.begin().await?;

        // Lock the movement row so concurrent revisions serialize
        let row = sqlx::query_as::<_, MovementRow>(
            r#"
            SELECT id, kind, employee_id, total, total_quantity, note, created_at, updated_at
            FROM movements
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(movement_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Movement".to_string()))?;
        let movement = row.into_model()?;

        let old_rows = fetch_item_rows(&mut tx, movement_id).await?;
        let old_items: Vec<LedgerItem> = old_rows.iter().map(ItemRow::to_ledger_item).collect();

        // Lock the union of affected products in one deterministic pass
        let mut product_ids: Vec<Uuid> = old_items
            .iter()
            .chain(new_items.iter())
            .map(|i| i.product_id)
            .collect();
        product_ids.sort();
        product_ids.dedup();
        let locked = lock_products(&mut tx, &product_ids).await?;

        let old_deltas = deltas_for(movement.kind, &old_items);
        let new_deltas = deltas_for(movement.kind, &new_items);

        // Phase 1: reverse the old effects; phase 2: apply the new ones.
        // A reversal that would underflow (incoming units already shipped
        // out) aborts here, before anything is written.
        let mut staged: BTreeMap<Uuid, StagedProduct> =
            locked.iter().map(|(id, p)| (*id, p.into())).collect();
        let reversed = reversal(&old_deltas);
        stage_deltas(&mut staged, &reversed)?;
        stage_deltas(&mut staged, &new_deltas)?;

        sqlx::query("DELETE FROM movement_items WHERE movement_id = $1")
            .bind(movement_id)
            .execute(&mut *tx)
            .await?;

        let (total, total_quantity) = insert_items(&mut tx, movement_id, &new_items, &locked).await?;

        sqlx::query(
            r#"
            UPDATE movements
            SET total = $1, total_quantity = $2, updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(total)
        .bind(total_quantity)
        .bind(movement_id)
        .execute(&mut *tx)
        .await?;

        let mut combined = reversed;
        combined.extend(new_deltas);
        apply_deltas(&mut tx, &net_deltas(&combined)).await?;

        tx.commit().await?;

        Ok(())
    }

    /// Delete a movement, reversing its stock effects.
    ///
    /// Equivalent to revising the movement down to an empty item set and
    /// then removing the record.
    pub async fn delete_movement(&self, movement_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, MovementRow>(
            r#"
            SELECT id, kind, employee_id, total, total_quantity, note, created_at, updated_at
            FROM movements
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(movement_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Movement".to_string()))?;
        let movement = row.into_model()?;

        let old_rows = fetch_item_rows(&mut tx, movement_id).await?;
        let old_items: Vec<LedgerItem> = old_rows.iter().map(ItemRow::to_ledger_item).collect();

        let product_ids: Vec<Uuid> = old_items.iter().map(|i| i.product_id).collect();
        let locked = lock_products(&mut tx, &product_ids).await?;

        let reversed = reversal(&deltas_for(movement.kind, &old_items));
        let mut staged: BTreeMap<Uuid, StagedProduct> =
            locked.iter().map(|(id, p)| (*id, p.into())).collect();
        stage_deltas(&mut staged, &reversed)?;

        // Items go with the movement (ON DELETE CASCADE)
        sqlx::query("DELETE FROM movements WHERE id = $1")
            .bind(movement_id)
            .execute(&mut *tx)
            .await?;

        apply_deltas(&mut tx, &net_deltas(&reversed)).await?;

        tx.commit().await?;

        Ok(())
    }

    /// Read-only sufficiency check for an outgoing batch.
    ///
    /// Lets the UI validate a cart before submitting. The verdict can go
    /// stale under concurrent writes; mutating operations re-check against
    /// locked rows.
    pub async fn check_sufficiency(&self, items: &[MovementItemInput]) -> AppResult<()> {
        let items = validate_items(items)?;

        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let rows = sqlx::query_as::<_, ledger::LockedProduct>(
            r#"
            SELECT id, name, price, stock, damage_stock
            FROM products
            WHERE id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&product_ids)
        .fetch_all(&self.db)
        .await?;

        let mut staged: BTreeMap<Uuid, StagedProduct> =
            rows.iter().map(|p| (p.id, p.into())).collect();
        if product_ids.iter().any(|id| !staged.contains_key(id)) {
            return Err(AppError::NotFound("Product".to_string()));
        }

        stage_deltas(&mut staged, &deltas_for(MovementKind::Outgoing, &items))
    }

    /// Get a movement with its items
    pub async fn get_movement(&self, movement_id: Uuid) -> AppResult<MovementWithItems> {
        let row = sqlx::query_as::<_, MovementRow>(
            r#"
            SELECT id, kind, employee_id, total, total_quantity, note, created_at, updated_at
            FROM movements
            WHERE id = $1
            "#,
        )
        .bind(movement_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Movement".to_string()))?;

        let items = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, movement_id, product_id, quantity, unit_price, line_total, reason
            FROM movement_items
            WHERE movement_id = $1
            ORDER BY product_id
            "#,
        )
        .bind(movement_id)
        .fetch_all(&self.db)
        .await?;

        Ok(MovementWithItems {
            movement: row.into_model()?,
            items: items.into_iter().map(ItemRow::into_model).collect(),
        })
    }

    /// List movements, newest first
    pub async fn list_movements(&self, filter: MovementFilter) -> AppResult<Vec<Movement>> {
        let rows = sqlx::query_as::<_, MovementRow>(
            r#"
            SELECT id, kind, employee_id, total, total_quantity, note, created_at, updated_at
            FROM movements
            WHERE ($1::text IS NULL OR kind = $1)
              AND ($2::uuid IS NULL OR employee_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.kind.map(|k| k.as_str()))
        .bind(filter.employee_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(MovementRow::into_model).collect()
    }

    /// Validate an employee exists and is active
    async fn ensure_employee(&self, employee_id: Uuid) -> AppResult<()> {
        let active = sqlx::query_scalar::<_, bool>(
            "SELECT is_active FROM employees WHERE id = $1",
        )
        .bind(employee_id)
        .fetch_optional(&self.db)
        .await?;

        match active {
            Some(true) => Ok(()),
            Some(false) => Err(AppError::Validation {
                field: "employee_id".to_string(),
                message: "Employee is deactivated".to_string(),
            }),
            None => Err(AppError::NotFound("Employee".to_string())),
        }
    }
}

/// Validate a movement batch: non-empty, positive quantities, distinct products
fn validate_items(items: &[MovementItemInput]) -> AppResult<Vec<LedgerItem>> {
    if items.is_empty() {
        return Err(AppError::Validation {
            field: "items".to_string(),
            message: "Movement must contain at least one item".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for item in items {
        validate_quantity(item.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
        })?;
        if !seen.insert(item.product_id) {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: format!("Duplicate product {} in batch", item.product_id),
            });
        }
    }

    Ok(items
        .iter()
        .map(|i| LedgerItem {
            product_id: i.product_id,
            quantity: i.quantity,
            reason: i.reason,
        })
        .collect())
}

/// Insert a movement row and its items, returning the movement id
async fn insert_movement(
    tx: &mut Transaction<'_, Postgres>,
    kind: MovementKind,
    employee_id: Option<Uuid>,
    items: &[LedgerItem],
    locked: &BTreeMap<Uuid, ledger::LockedProduct>,
    note: Option<String>,
) -> AppResult<Uuid> {
    let movement_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO movements (kind, employee_id, total, total_quantity, note)
        VALUES ($1, $2, 0, 0, $3)
        RETURNING id
        "#,
    )
    .bind(kind.as_str())
    .bind(employee_id)
    .bind(&note)
    .fetch_one(&mut **tx)
    .await?;

    let (total, total_quantity) = insert_items(tx, movement_id, items, locked).await?;

    sqlx::query("UPDATE movements SET total = $1, total_quantity = $2 WHERE id = $3")
        .bind(total)
        .bind(total_quantity)
        .bind(movement_id)
        .execute(&mut **tx)
        .await?;

    Ok(movement_id)
}

/// Insert movement items priced from the locked product rows.
/// Returns the aggregate (total, total_quantity).
async fn insert_items(
    tx: &mut Transaction<'_, Postgres>,
    movement_id: Uuid,
    items: &[LedgerItem],
    locked: &BTreeMap<Uuid, ledger::LockedProduct>,
) -> AppResult<(Decimal, i32)> {
    let mut total = Decimal::ZERO;
    let mut total_quantity = 0i32;

    for item in items {
        let product = locked
            .get(&item.product_id)
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        let line_total = product.price * Decimal::from(item.quantity);

        sqlx::query(
            r#"
            INSERT INTO movement_items (movement_id, product_id, quantity, unit_price, line_total, reason)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(movement_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(product.price)
        .bind(line_total)
        .bind(item.reason.map(|r| r.as_str()))
        .execute(&mut **tx)
        .await?;

        total += line_total;
        total_quantity += item.quantity;
    }

    Ok((total, total_quantity))
}

/// Fetch a movement's item rows inside a transaction
async fn fetch_item_rows(
    tx: &mut Transaction<'_, Postgres>,
    movement_id: Uuid,
) -> AppResult<Vec<ItemRow>> {
    let rows = sqlx::query_as::<_, ItemRow>(
        r#"
        SELECT id, movement_id, product_id, quantity, unit_price, line_total, reason
        FROM movement_items
        WHERE movement_id = $1
        ORDER BY product_id
        "#,
    )
    .bind(movement_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows)
}
