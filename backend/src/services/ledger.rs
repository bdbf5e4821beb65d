//! Stock ledger: the single choke point for product stock mutations
//!
//! Every stock-mutating operation locks the affected product rows with
//! SELECT ... FOR UPDATE in id order, checks the resulting counters against
//! the non-negativity invariants, then writes — all inside one transaction.
//! Concurrent movements touching the same product therefore serialize on the
//! row locks, and a batch that would overdraw any product aborts in full.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use shared::models::{IncomingReason, MovementKind};

use crate::error::{AppError, AppResult};

/// A validated movement line handed to the ledger
#[derive(Debug, Clone)]
pub struct LedgerItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub reason: Option<IncomingReason>,
}

/// Signed effect of movement lines on a product's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDelta {
    pub product_id: Uuid,
    pub stock: i32,
    pub damage_stock: i32,
}

/// Product row as locked for a ledger operation
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LockedProduct {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub damage_stock: i32,
}

/// Compute the signed per-product deltas of a movement's items.
///
/// Outgoing removes units; incoming adds them, and items tagged damaged
/// raise damage_stock by the same amount (a damaged unit still counts as
/// stock on hand, it is only flagged).
pub fn deltas_for(kind: MovementKind, items: &[LedgerItem]) -> Vec<StockDelta> {
    items
        .iter()
        .map(|item| match kind {
            MovementKind::Outgoing => StockDelta {
                product_id: item.product_id,
                stock: -item.quantity,
                damage_stock: 0,
            },
            MovementKind::Incoming | MovementKind::IncomingAdmin => StockDelta {
                product_id: item.product_id,
                stock: item.quantity,
                damage_stock: if item.reason == Some(IncomingReason::Damaged) {
                    item.quantity
                } else {
                    0
                },
            },
        })
        .collect()
}

/// Negate deltas, yielding the exact reversal of a prior application
pub fn reversal(deltas: &[StockDelta]) -> Vec<StockDelta> {
    deltas
        .iter()
        .map(|d| StockDelta {
            product_id: d.product_id,
            stock: -d.stock,
            damage_stock: -d.damage_stock,
        })
        .collect()
}

/// Sum deltas per product. BTreeMap keeps the result in id order, matching
/// the lock order used by ledger transactions.
pub fn net_deltas(deltas: &[StockDelta]) -> Vec<StockDelta> {
    let mut merged: BTreeMap<Uuid, (i32, i32)> = BTreeMap::new();
    for d in deltas {
        let entry = merged.entry(d.product_id).or_insert((0, 0));
        entry.0 += d.stock;
        entry.1 += d.damage_stock;
    }
    merged
        .into_iter()
        .map(|(product_id, (stock, damage_stock))| StockDelta {
            product_id,
            stock,
            damage_stock,
        })
        .collect()
}

/// In-memory view of a product's counters while a ledger operation is
/// staged against locked rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedProduct {
    pub name: String,
    pub stock: i32,
    pub damage_stock: i32,
}

impl From<&LockedProduct> for StagedProduct {
    fn from(p: &LockedProduct) -> Self {
        Self {
            name: p.name.clone(),
            stock: p.stock,
            damage_stock: p.damage_stock,
        }
    }
}

/// Apply deltas to a staged view, failing if any product would violate
/// `stock >= 0` or `0 <= damage_stock <= stock`.
///
/// The failure names the product and reports how much stock was available
/// against the amount the delta tried to remove.
pub fn stage_deltas(
    products: &mut BTreeMap<Uuid, StagedProduct>,
    deltas: &[StockDelta],
) -> AppResult<()> {
    for delta in deltas {
        let product = products
            .get_mut(&delta.product_id)
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let new_stock = product.stock + delta.stock;
        let new_damage = product.damage_stock + delta.damage_stock;

        if new_stock < 0 {
            return Err(AppError::InsufficientStock {
                product_name: product.name.clone(),
                available: product.stock,
                required: -delta.stock,
            });
        }
        if new_damage < 0 || new_damage > new_stock {
            // Either an outgoing cutting into damaged-flagged units, or the
            // reversal of a damaged incoming after the units were consumed
            let required = if delta.stock < 0 {
                -delta.stock
            } else {
                delta.damage_stock.abs()
            };
            return Err(AppError::InsufficientStock {
                product_name: product.name.clone(),
                available: product.stock - product.damage_stock,
                required,
            });
        }

        product.stock = new_stock;
        product.damage_stock = new_damage;
    }
    Ok(())
}

/// Lock the given product rows FOR UPDATE, in id order.
///
/// The deterministic order means two concurrent multi-product batches always
/// acquire locks in the same sequence and cannot deadlock each other.
/// Fails with NotFound if any id does not resolve to a product.
pub async fn lock_products(
    tx: &mut Transaction<'_, Postgres>,
    product_ids: &[Uuid],
) -> AppResult<BTreeMap<Uuid, LockedProduct>> {
    let rows = sqlx::query_as::<_, LockedProduct>(
        r#"
        SELECT id, name, price, stock, damage_stock
        FROM products
        WHERE id = ANY($1)
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(product_ids)
    .fetch_all(&mut **tx)
    .await?;

    let locked: BTreeMap<Uuid, LockedProduct> = rows.into_iter().map(|p| (p.id, p)).collect();

    if let Some(missing) = product_ids.iter().find(|id| !locked.contains_key(id)) {
        tracing::warn!("Ledger operation referenced unknown product {}", missing);
        return Err(AppError::NotFound("Product".to_string()));
    }

    Ok(locked)
}

/// Write net deltas to the locked rows.
///
/// Rows are already locked and the staged check has passed, so the relative
/// updates cannot violate the CHECK constraints.
pub async fn apply_deltas(
    tx: &mut Transaction<'_, Postgres>,
    deltas: &[StockDelta],
) -> AppResult<()> {
    for delta in deltas {
        if delta.stock == 0 && delta.damage_stock == 0 {
            continue;
        }
        sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + $1, damage_stock = damage_stock + $2, updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(delta.stock)
        .bind(delta.damage_stock)
        .bind(delta.product_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: Uuid, quantity: i32, reason: Option<IncomingReason>) -> LedgerItem {
        LedgerItem {
            product_id,
            quantity,
            reason,
        }
    }

    fn staged(name: &str, stock: i32, damage_stock: i32) -> StagedProduct {
        StagedProduct {
            name: name.to_string(),
            stock,
            damage_stock,
        }
    }

    #[test]
    fn test_outgoing_deltas_negative() {
        let p = Uuid::new_v4();
        let deltas = deltas_for(MovementKind::Outgoing, &[item(p, 4, None)]);
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].stock, -4);
        assert_eq!(deltas[0].damage_stock, 0);
    }

    #[test]
    fn test_incoming_deltas_positive() {
        let p = Uuid::new_v4();
        let deltas = deltas_for(
            MovementKind::Incoming,
            &[item(p, 5, Some(IncomingReason::Returned))],
        );
        assert_eq!(deltas[0].stock, 5);
        assert_eq!(deltas[0].damage_stock, 0);
    }

    #[test]
    fn test_incoming_damaged_raises_both_counters() {
        let p = Uuid::new_v4();
        let deltas = deltas_for(
            MovementKind::Incoming,
            &[item(p, 5, Some(IncomingReason::Damaged))],
        );
        assert_eq!(deltas[0].stock, 5);
        assert_eq!(deltas[0].damage_stock, 5);
    }

    #[test]
    fn test_incoming_admin_matches_incoming() {
        let p = Uuid::new_v4();
        let a = deltas_for(MovementKind::Incoming, &[item(p, 7, None)]);
        let b = deltas_for(MovementKind::IncomingAdmin, &[item(p, 7, None)]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_reversal_negates() {
        let p = Uuid::new_v4();
        let deltas = deltas_for(
            MovementKind::Incoming,
            &[item(p, 3, Some(IncomingReason::Damaged))],
        );
        let rev = reversal(&deltas);
        assert_eq!(rev[0].stock, -3);
        assert_eq!(rev[0].damage_stock, -3);
    }

    #[test]
    fn test_net_deltas_merges_per_product() {
        let p = Uuid::new_v4();
        let q = Uuid::new_v4();
        let deltas = vec![
            StockDelta {
                product_id: p,
                stock: -4,
                damage_stock: 0,
            },
            StockDelta {
                product_id: q,
                stock: 2,
                damage_stock: 0,
            },
            StockDelta {
                product_id: p,
                stock: 1,
                damage_stock: 0,
            },
        ];
        let net = net_deltas(&deltas);
        assert_eq!(net.len(), 2);
        let p_net = net.iter().find(|d| d.product_id == p).unwrap();
        assert_eq!(p_net.stock, -3);
    }

    #[test]
    fn test_reversal_then_reapply_is_identity() {
        let p = Uuid::new_v4();
        let deltas = deltas_for(MovementKind::Outgoing, &[item(p, 9, None)]);
        let mut round_trip = deltas.clone();
        round_trip.extend(reversal(&deltas));
        for d in net_deltas(&round_trip) {
            assert_eq!(d.stock, 0);
            assert_eq!(d.damage_stock, 0);
        }
    }

    #[test]
    fn test_stage_deltas_applies() {
        let p = Uuid::new_v4();
        let mut products = BTreeMap::from([(p, staged("Soap", 10, 0))]);
        let deltas = deltas_for(MovementKind::Outgoing, &[item(p, 4, None)]);
        stage_deltas(&mut products, &deltas).unwrap();
        assert_eq!(products[&p].stock, 6);
    }

    #[test]
    fn test_stage_deltas_rejects_overdraw() {
        let p = Uuid::new_v4();
        let mut products = BTreeMap::from([(p, staged("Soap", 3, 0))]);
        let deltas = deltas_for(MovementKind::Outgoing, &[item(p, 5, None)]);
        let err = stage_deltas(&mut products, &deltas).unwrap_err();
        match err {
            AppError::InsufficientStock {
                product_name,
                available,
                required,
            } => {
                assert_eq!(product_name, "Soap");
                assert_eq!(available, 3);
                assert_eq!(required, 5);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        // Nothing applied on failure
        assert_eq!(products[&p].stock, 3);
    }

    #[test]
    fn test_stage_deltas_rejects_damage_underflow() {
        // Reversing a damaged incoming of 5 when only 2 damaged units remain
        let p = Uuid::new_v4();
        let mut products = BTreeMap::from([(p, staged("Soap", 10, 2))]);
        let deltas = vec![StockDelta {
            product_id: p,
            stock: -5,
            damage_stock: -5,
        }];
        assert!(stage_deltas(&mut products, &deltas).is_err());
    }

    #[test]
    fn test_stage_deltas_unknown_product() {
        let mut products = BTreeMap::new();
        let deltas = vec![StockDelta {
            product_id: Uuid::new_v4(),
            stock: 1,
            damage_stock: 0,
        }];
        assert!(matches!(
            stage_deltas(&mut products, &deltas),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_stage_sufficiency_is_idempotent_on_clone() {
        let p = Uuid::new_v4();
        let products = BTreeMap::from([(p, staged("Soap", 5, 0))]);
        let deltas = deltas_for(MovementKind::Outgoing, &[item(p, 3, None)]);

        let mut first = products.clone();
        let mut second = products.clone();
        assert!(stage_deltas(&mut first, &deltas).is_ok());
        assert!(stage_deltas(&mut second, &deltas).is_ok());
        assert_eq!(first, second);
    }
}
