//! Expense/income tests
//!
//! Pure tests for summary arithmetic and entry validation rules.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::models::EntryType;
use shared::validation::validate_amount;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Fold entries into (total_income, total_expense, net) like the summary query
fn summarize(entries: &[(EntryType, Decimal)]) -> (Decimal, Decimal, Decimal) {
    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    for (entry_type, amount) in entries {
        match entry_type {
            EntryType::Income => income += amount,
            EntryType::Expense => expense += amount,
        }
    }
    (income, expense, income - expense)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_summary_mixed_entries() {
        let entries = [
            (EntryType::Income, dec("1000.00")),
            (EntryType::Expense, dec("350.00")),
            (EntryType::Income, dec("200.00")),
            (EntryType::Expense, dec("50.00")),
        ];
        let (income, expense, net) = summarize(&entries);
        assert_eq!(income, dec("1200.00"));
        assert_eq!(expense, dec("400.00"));
        assert_eq!(net, dec("800.00"));
    }

    #[test]
    fn test_summary_empty() {
        let (income, expense, net) = summarize(&[]);
        assert_eq!(income, Decimal::ZERO);
        assert_eq!(expense, Decimal::ZERO);
        assert_eq!(net, Decimal::ZERO);
    }

    #[test]
    fn test_net_can_be_negative() {
        let entries = [(EntryType::Expense, dec("100.00"))];
        let (_, _, net) = summarize(&entries);
        assert_eq!(net, dec("-100.00"));
    }

    #[test]
    fn test_amounts_must_be_positive() {
        assert!(validate_amount(dec("0.01")).is_ok());
        assert!(validate_amount(Decimal::ZERO).is_err());
        assert!(validate_amount(dec("-5")).is_err());
    }

    #[test]
    fn test_entry_type_round_trip() {
        for entry_type in [EntryType::Expense, EntryType::Income] {
            assert_eq!(EntryType::parse(entry_type.as_str()), Some(entry_type));
        }
        assert_eq!(EntryType::parse("transfer"), None);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=1_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn entry_strategy() -> impl Strategy<Value = (EntryType, Decimal)> {
        (any::<bool>(), amount_strategy()).prop_map(|(is_income, amount)| {
            (
                if is_income {
                    EntryType::Income
                } else {
                    EntryType::Expense
                },
                amount,
            )
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Net is exactly income minus expense
        #[test]
        fn prop_net_is_income_minus_expense(
            entries in prop::collection::vec(entry_strategy(), 0..20)
        ) {
            let (income, expense, net) = summarize(&entries);
            prop_assert_eq!(net, income - expense);
        }

        /// Summary is order-independent
        #[test]
        fn prop_summary_order_independent(
            entries in prop::collection::vec(entry_strategy(), 0..20)
        ) {
            let mut reversed = entries.clone();
            reversed.reverse();
            prop_assert_eq!(summarize(&entries), summarize(&reversed));
        }

        /// Totals never go negative even when net does
        #[test]
        fn prop_totals_non_negative(
            entries in prop::collection::vec(entry_strategy(), 0..20)
        ) {
            let (income, expense, _) = summarize(&entries);
            prop_assert!(income >= Decimal::ZERO);
            prop_assert!(expense >= Decimal::ZERO);
        }
    }
}
