//! Stock ledger tests
//!
//! Pure-logic tests for the ledger semantics:
//! - Non-negativity: no outgoing batch may drive stock below zero
//! - Atomicity: a rejected batch leaves every counter unchanged
//! - Conservation under revision: revise == undo old, apply new
//! - Damaged-unit bookkeeping: damaged incoming raises both counters

use std::collections::BTreeMap;

use proptest::prelude::*;

// ============================================================================
// Ledger simulation (mirrors the staged-check semantics of the service)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductState {
    pub stock: i32,
    pub damage_stock: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Outgoing,
    Incoming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub product: u8,
    pub quantity: i32,
    pub damaged: bool,
}

pub type Stocks = BTreeMap<u8, ProductState>;

/// Apply a movement batch all-or-nothing. On failure the input state is
/// returned untouched inside the error.
pub fn apply_movement(stocks: &Stocks, kind: Kind, items: &[Item]) -> Result<Stocks, String> {
    apply_deltas(stocks, &deltas(kind, items, 1))
}

/// Reverse a previously applied movement batch
pub fn reverse_movement(stocks: &Stocks, kind: Kind, items: &[Item]) -> Result<Stocks, String> {
    apply_deltas(stocks, &deltas(kind, items, -1))
}

/// Revise a movement: reverse the old items, then apply the new ones.
/// Both phases run against one staged state; either the whole revision
/// lands or nothing does.
pub fn revise_movement(
    stocks: &Stocks,
    kind: Kind,
    old_items: &[Item],
    new_items: &[Item],
) -> Result<Stocks, String> {
    let mut combined = deltas(kind, old_items, -1);
    combined.extend(deltas(kind, new_items, 1));
    apply_deltas(stocks, &combined)
}

/// Read-only sufficiency verdict for an outgoing batch
pub fn check_sufficiency(stocks: &Stocks, items: &[Item]) -> Result<(), String> {
    apply_movement(stocks, Kind::Outgoing, items).map(|_| ())
}

fn deltas(kind: Kind, items: &[Item], sign: i32) -> Vec<(u8, i32, i32)> {
    items
        .iter()
        .map(|item| match kind {
            Kind::Outgoing => (item.product, -item.quantity * sign, 0),
            Kind::Incoming => (
                item.product,
                item.quantity * sign,
                if item.damaged { item.quantity * sign } else { 0 },
            ),
        })
        .collect()
}

fn apply_deltas(stocks: &Stocks, deltas: &[(u8, i32, i32)]) -> Result<Stocks, String> {
    let mut staged = stocks.clone();
    for (product, stock_delta, damage_delta) in deltas {
        let state = staged
            .get_mut(product)
            .ok_or_else(|| format!("Product {} not found", product))?;
        let new_stock = state.stock + stock_delta;
        let new_damage = state.damage_stock + damage_delta;
        if new_stock < 0 {
            return Err(format!(
                "Insufficient stock for {}: {} available, {} required",
                product, state.stock, -stock_delta
            ));
        }
        if new_damage < 0 || new_damage > new_stock {
            return Err(format!("Damage counter out of bounds for {}", product));
        }
        state.stock = new_stock;
        state.damage_stock = new_damage;
    }
    Ok(staged)
}

fn stocks_of(entries: &[(u8, i32, i32)]) -> Stocks {
    entries
        .iter()
        .map(|(id, stock, damage)| {
            (
                *id,
                ProductState {
                    stock: *stock,
                    damage_stock: *damage,
                },
            )
        })
        .collect()
}

fn item(product: u8, quantity: i32) -> Item {
    Item {
        product,
        quantity,
        damaged: false,
    }
}

fn damaged_item(product: u8, quantity: i32) -> Item {
    Item {
        product,
        quantity,
        damaged: true,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Scenario 1: stock=10, outgoing 4 succeeds leaving 6
    #[test]
    fn test_outgoing_decrements_stock() {
        let stocks = stocks_of(&[(1, 10, 0)]);
        let after = apply_movement(&stocks, Kind::Outgoing, &[item(1, 4)]).unwrap();
        assert_eq!(after[&1].stock, 6);
    }

    /// Scenario 2: stock=3, outgoing 5 fails and stock stays 3
    #[test]
    fn test_outgoing_insufficient_rejected() {
        let stocks = stocks_of(&[(1, 3, 0)]);
        let err = apply_movement(&stocks, Kind::Outgoing, &[item(1, 5)]).unwrap_err();
        assert!(err.contains("Insufficient stock"));
        assert!(err.contains("3 available"));
        assert!(err.contains("5 required"));
        assert_eq!(stocks[&1].stock, 3);
    }

    /// A batch with one under-stocked product applies nothing at all
    #[test]
    fn test_batch_all_or_nothing() {
        let stocks = stocks_of(&[(1, 10, 0), (2, 1, 0)]);
        let result = apply_movement(&stocks, Kind::Outgoing, &[item(1, 4), item(2, 2)]);
        assert!(result.is_err());
        // Product 1 untouched even though its own line was satisfiable
        assert_eq!(stocks[&1].stock, 10);
        assert_eq!(stocks[&2].stock, 1);
    }

    #[test]
    fn test_incoming_increments_stock() {
        let stocks = stocks_of(&[(1, 10, 0)]);
        let after = apply_movement(&stocks, Kind::Incoming, &[item(1, 5)]).unwrap();
        assert_eq!(after[&1].stock, 15);
        assert_eq!(after[&1].damage_stock, 0);
    }

    /// Scenario 4: damaged incoming of 5 raises stock and damage_stock by 5
    #[test]
    fn test_incoming_damaged_raises_both() {
        let stocks = stocks_of(&[(1, 10, 0)]);
        let after = apply_movement(&stocks, Kind::Incoming, &[damaged_item(1, 5)]).unwrap();
        assert_eq!(after[&1].stock, 15);
        assert_eq!(after[&1].damage_stock, 5);
    }

    #[test]
    fn test_incoming_returned_raises_only_stock() {
        let stocks = stocks_of(&[(1, 10, 2)]);
        let after = apply_movement(&stocks, Kind::Incoming, &[item(1, 3)]).unwrap();
        assert_eq!(after[&1].stock, 13);
        assert_eq!(after[&1].damage_stock, 2);
    }

    /// Scenario 3: outgoing {P:4, Q:2} revised to {P:1} nets P +3, Q +2
    #[test]
    fn test_revision_reverses_then_applies() {
        let initial = stocks_of(&[(1, 10, 0), (2, 10, 0)]);
        let old_items = [item(1, 4), item(2, 2)];
        let after_create = apply_movement(&initial, Kind::Outgoing, &old_items).unwrap();
        assert_eq!(after_create[&1].stock, 6);
        assert_eq!(after_create[&2].stock, 8);

        let after_revise =
            revise_movement(&after_create, Kind::Outgoing, &old_items, &[item(1, 1)]).unwrap();
        assert_eq!(after_revise[&1].stock, 9); // +4 reversal, -1 new
        assert_eq!(after_revise[&2].stock, 10); // +2 reversal, no new line
    }

    /// Revising up can use the reversed baseline: 5 in stock, movement of 4,
    /// revised to 9 — fails against raw stock but passes after reversal
    #[test]
    fn test_revision_sees_reversed_baseline() {
        let initial = stocks_of(&[(1, 5, 0)]);
        let old_items = [item(1, 4)];
        let after_create = apply_movement(&initial, Kind::Outgoing, &old_items).unwrap();
        assert_eq!(after_create[&1].stock, 1);

        let after_revise =
            revise_movement(&after_create, Kind::Outgoing, &old_items, &[item(1, 5)]).unwrap();
        assert_eq!(after_revise[&1].stock, 0);
    }

    /// Revising an incoming movement down fails once the goods are gone
    #[test]
    fn test_incoming_reversal_underflow_rejected() {
        let initial = stocks_of(&[(1, 0, 0)]);
        let incoming = [item(1, 10)];
        let after_incoming = apply_movement(&initial, Kind::Incoming, &incoming).unwrap();
        // Ship 8 of the 10 back out
        let after_outgoing =
            apply_movement(&after_incoming, Kind::Outgoing, &[item(1, 8)]).unwrap();
        assert_eq!(after_outgoing[&1].stock, 2);

        // Reversing the incoming would need 10 units but only 2 remain
        let result = revise_movement(&after_outgoing, Kind::Incoming, &incoming, &[item(1, 1)]);
        assert!(result.is_err());
        assert_eq!(after_outgoing[&1].stock, 2);
    }

    /// Delete reverses the movement exactly
    #[test]
    fn test_delete_restores_pre_movement_state() {
        let initial = stocks_of(&[(1, 10, 0), (2, 7, 1)]);
        let items = [item(1, 4), damaged_item(2, 3)];
        let after_create = apply_movement(&initial, Kind::Incoming, &items).unwrap();
        let after_delete = reverse_movement(&after_create, Kind::Incoming, &items).unwrap();
        assert_eq!(after_delete, initial);
    }

    /// Scenario 5: two outgoing batches of 3 against stock=5 — serialized,
    /// exactly one succeeds and stock never goes negative
    #[test]
    fn test_serialized_concurrent_outgoing() {
        let stocks = stocks_of(&[(1, 5, 0)]);
        let first = apply_movement(&stocks, Kind::Outgoing, &[item(1, 3)]).unwrap();
        assert_eq!(first[&1].stock, 2);
        let second = apply_movement(&first, Kind::Outgoing, &[item(1, 3)]);
        assert!(second.is_err());
        assert_eq!(first[&1].stock, 2);
    }

    /// Sufficiency verdict is stable with no writes in between
    #[test]
    fn test_sufficiency_check_idempotent() {
        let stocks = stocks_of(&[(1, 5, 0)]);
        let items = [item(1, 3)];
        assert_eq!(
            check_sufficiency(&stocks, &items).is_ok(),
            check_sufficiency(&stocks, &items).is_ok()
        );

        let short = [item(1, 9)];
        assert_eq!(
            check_sufficiency(&stocks, &short).unwrap_err(),
            check_sufficiency(&stocks, &short).unwrap_err()
        );
    }

    #[test]
    fn test_unknown_product_rejected() {
        let stocks = stocks_of(&[(1, 5, 0)]);
        assert!(apply_movement(&stocks, Kind::Outgoing, &[item(9, 1)]).is_err());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for initial product states: ids 0-4, sane stock levels
    fn stocks_strategy() -> impl Strategy<Value = Stocks> {
        prop::collection::btree_map(
            0u8..5,
            (0i32..500).prop_map(|stock| ProductState {
                stock,
                damage_stock: 0,
            }),
            1..5,
        )
    }

    /// Strategy for a batch of items over product ids 0-4
    fn items_strategy() -> impl Strategy<Value = Vec<Item>> {
        prop::collection::vec(
            (0u8..5, 1i32..50, any::<bool>()).prop_map(|(product, quantity, damaged)| Item {
                product,
                quantity,
                damaged,
            }),
            1..5,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Non-negativity: whatever sequence of outgoing batches is thrown
        /// at the ledger, stock never drops below zero
        #[test]
        fn prop_stock_never_negative(
            initial in stocks_strategy(),
            batches in prop::collection::vec(items_strategy(), 1..10)
        ) {
            let mut stocks = initial;
            for batch in &batches {
                if let Ok(next) = apply_movement(&stocks, Kind::Outgoing, batch) {
                    stocks = next;
                }
                for state in stocks.values() {
                    prop_assert!(state.stock >= 0);
                    prop_assert!(state.damage_stock >= 0);
                    prop_assert!(state.damage_stock <= state.stock);
                }
            }
        }

        /// Atomicity: a failed batch is a no-op
        #[test]
        fn prop_failed_batch_changes_nothing(
            initial in stocks_strategy(),
            batch in items_strategy()
        ) {
            let before = initial.clone();
            if apply_movement(&initial, Kind::Outgoing, &batch).is_err() {
                prop_assert_eq!(before, initial);
            }
        }

        /// Conservation under revision: revising M's items from I to I'
        /// yields the same stocks as if M had been created with I' directly
        #[test]
        fn prop_revision_equals_fresh_apply(
            initial in stocks_strategy(),
            old_items in items_strategy(),
            new_items in items_strategy()
        ) {
            for kind in [Kind::Outgoing, Kind::Incoming] {
                let Ok(with_old) = apply_movement(&initial, kind, &old_items) else {
                    continue;
                };
                let revised = revise_movement(&with_old, kind, &old_items, &new_items);
                let fresh = apply_movement(&initial, kind, &new_items);
                match (revised, fresh) {
                    (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
                    (Err(_), Err(_)) => {}
                    (a, b) => prop_assert!(false, "revise {:?} != fresh {:?}", a, b),
                }
            }
        }

        /// Apply-then-reverse is the identity (delete semantics)
        #[test]
        fn prop_reverse_restores_initial(
            initial in stocks_strategy(),
            items in items_strategy()
        ) {
            for kind in [Kind::Outgoing, Kind::Incoming] {
                if let Ok(applied) = apply_movement(&initial, kind, &items) {
                    let restored = reverse_movement(&applied, kind, &items).unwrap();
                    prop_assert_eq!(restored, initial.clone());
                }
            }
        }

        /// Reversal is order-independent across distinct products
        #[test]
        fn prop_reversal_order_independent(
            initial in stocks_strategy(),
            items in items_strategy()
        ) {
            if let Ok(applied) = apply_movement(&initial, Kind::Incoming, &items) {
                let mut shuffled = items.clone();
                shuffled.reverse();
                let a = reverse_movement(&applied, Kind::Incoming, &items).unwrap();
                let b = reverse_movement(&applied, Kind::Incoming, &shuffled).unwrap();
                prop_assert_eq!(a, b);
            }
        }

        /// Damaged incoming raises stock and damage_stock by the same amount
        #[test]
        fn prop_damaged_bookkeeping(
            initial in stocks_strategy(),
            product in 0u8..5,
            quantity in 1i32..100
        ) {
            if !initial.contains_key(&product) {
                return Ok(());
            }
            let before = initial[&product];
            let after = apply_movement(
                &initial,
                Kind::Incoming,
                &[Item { product, quantity, damaged: true }],
            )
            .unwrap();
            prop_assert_eq!(after[&product].stock, before.stock + quantity);
            prop_assert_eq!(after[&product].damage_stock, before.damage_stock + quantity);
        }

        /// Sufficiency is a pure read: same state, same verdict
        #[test]
        fn prop_sufficiency_idempotent(
            initial in stocks_strategy(),
            items in items_strategy()
        ) {
            let first = check_sufficiency(&initial, &items);
            let second = check_sufficiency(&initial, &items);
            prop_assert_eq!(first.is_ok(), second.is_ok());
        }
    }
}
