//! Order lifecycle tests
//!
//! Covers the status transition table, payment status derivation, and
//! order total arithmetic.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::models::{OrderStatus, PaymentStatus};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_valid_status_transitions() {
        let valid = [
            (OrderStatus::Placed, OrderStatus::Shipped),
            (OrderStatus::Placed, OrderStatus::Cancelled),
            (OrderStatus::Shipped, OrderStatus::Delivered),
            (OrderStatus::Shipped, OrderStatus::Cancelled),
            (OrderStatus::Delivered, OrderStatus::Due),
            (OrderStatus::Delivered, OrderStatus::Received),
            (OrderStatus::Due, OrderStatus::Received),
        ];

        for (from, to) in valid {
            assert!(
                from.can_transition_to(to),
                "{} -> {} should be allowed",
                from.as_str(),
                to.as_str()
            );
        }
    }

    #[test]
    fn test_invalid_status_transitions() {
        let invalid = [
            (OrderStatus::Placed, OrderStatus::Delivered), // Skip shipping
            (OrderStatus::Delivered, OrderStatus::Placed), // Backward
            (OrderStatus::Cancelled, OrderStatus::Shipped), // From terminal
            (OrderStatus::Received, OrderStatus::Due),     // From terminal
            (OrderStatus::Placed, OrderStatus::Placed),    // Self loop
        ];

        for (from, to) in invalid {
            assert!(
                !from.can_transition_to(to),
                "{} -> {} should be rejected",
                from.as_str(),
                to.as_str()
            );
        }
    }

    #[test]
    fn test_payment_status_unpaid() {
        assert_eq!(
            PaymentStatus::from_amounts(dec("100"), Decimal::ZERO),
            PaymentStatus::Unpaid
        );
    }

    #[test]
    fn test_payment_status_paid() {
        assert_eq!(
            PaymentStatus::from_amounts(dec("100"), dec("100")),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn test_payment_status_due() {
        assert_eq!(
            PaymentStatus::from_amounts(dec("100"), dec("40")),
            PaymentStatus::Due
        );
    }

    #[test]
    fn test_order_total_arithmetic() {
        // 3 x 25.50 + 2 x 10.00 = 96.50
        let lines = [(3, dec("25.50")), (2, dec("10.00"))];
        let total: Decimal = lines
            .iter()
            .map(|(qty, price)| price * Decimal::from(*qty))
            .sum();
        assert_eq!(total, dec("96.50"));
    }

    #[test]
    fn test_due_amount_is_total_minus_paid() {
        let total = dec("96.50");
        let paid = dec("50.00");
        assert_eq!(total - paid, dec("46.50"));
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            OrderStatus::Placed,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
            OrderStatus::Due,
            OrderStatus::Received,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("unknown"), None);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for money amounts (0.01 to 10000.00)
    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=1_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Payment status derivation is total-order consistent
        #[test]
        fn prop_payment_status_consistent(
            total in amount_strategy(),
            paid in amount_strategy()
        ) {
            let status = PaymentStatus::from_amounts(total, paid);
            if paid >= total {
                prop_assert_eq!(status, PaymentStatus::Paid);
            } else {
                prop_assert_eq!(status, PaymentStatus::Due);
            }
        }

        /// Due amount plus paid amount reconstructs the total
        #[test]
        fn prop_due_plus_paid_is_total(
            total in amount_strategy(),
            paid in amount_strategy()
        ) {
            // Payment updates reject paid > total, so clamp like the service
            if paid <= total {
                let due = total - paid;
                prop_assert!(due >= Decimal::ZERO);
                prop_assert_eq!(due + paid, total);
            }
        }

        /// Order totals are the sum of line totals
        #[test]
        fn prop_order_total_sums_lines(
            lines in prop::collection::vec((1i32..100, amount_strategy()), 1..10)
        ) {
            let expected: Decimal = lines
                .iter()
                .map(|(qty, price)| price * Decimal::from(*qty))
                .sum();
            let folded = lines
                .iter()
                .fold(Decimal::ZERO, |acc, (qty, price)| acc + price * Decimal::from(*qty));
            prop_assert_eq!(expected, folded);
        }

        /// No transition chain can leave a terminal state
        #[test]
        fn prop_terminal_states_stay_terminal(to_idx in 0usize..6) {
            let all = [
                OrderStatus::Placed,
                OrderStatus::Shipped,
                OrderStatus::Delivered,
                OrderStatus::Cancelled,
                OrderStatus::Due,
                OrderStatus::Received,
            ];
            let to = all[to_idx];
            prop_assert!(!OrderStatus::Cancelled.can_transition_to(to));
            prop_assert!(!OrderStatus::Received.can_transition_to(to));
        }
    }
}
