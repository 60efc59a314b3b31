//! Property-based tests for the balance validator.

use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::AccountId;

use super::error::LedgerError;
use super::types::{BALANCE_TOLERANCE, EntrySide, LineInput};
use super::validation::{check_balance, require_balanced};

/// Strategy to generate a valid positive amount (> 0).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    // 0.01 to 1,000,000.00
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a zero or negative amount.
fn non_positive_amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(-cents, 2))
}

fn side_strategy() -> impl Strategy<Value = EntrySide> {
    prop_oneof![Just(EntrySide::Debit), Just(EntrySide::Credit)]
}

/// Builds a balanced line set: the given debits plus credits splitting the same total.
fn balanced_lines(debits: &[Decimal], split: usize) -> Vec<LineInput> {
    let account = AccountId::new();
    let total: Decimal = debits.iter().copied().sum();
    let mut lines: Vec<LineInput> = debits
        .iter()
        .map(|d| LineInput::debit(account, *d))
        .collect();

    let parts = u32::try_from(split.max(1)).unwrap_or(1);
    let share = (total / Decimal::from(parts)).round_dp(2);
    let mut remaining = total;
    for _ in 1..parts {
        if share > Decimal::ZERO && remaining - share > Decimal::ZERO {
            lines.push(LineInput::credit(account, share));
            remaining -= share;
        }
    }
    lines.push(LineInput::credit(account, remaining));
    lines
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any debit set mirrored by credits of the same total is accepted.
    #[test]
    fn prop_balanced_sets_accepted(
        debits in prop::collection::vec(positive_amount(), 1..8),
        split in 1usize..5,
    ) {
        let lines = balanced_lines(&debits, split);
        let totals = require_balanced(&lines).unwrap();
        prop_assert_eq!(totals.total_debit, totals.total_credit);
        prop_assert!(totals.has_both_sides());
    }

    /// Shifting any balanced set by more than the tolerance is rejected.
    #[test]
    fn prop_skew_beyond_tolerance_rejected(
        debits in prop::collection::vec(positive_amount(), 1..8),
        skew in positive_amount(),
    ) {
        let mut lines = balanced_lines(&debits, 1);
        lines.push(LineInput::debit(AccountId::new(), skew));
        prop_assert!(skew > BALANCE_TOLERANCE);
        let result = require_balanced(&lines);
        prop_assert!(
            matches!(result, Err(LedgerError::Unbalanced { .. })),
            "expected Unbalanced, got {:?}",
            result
        );
    }

    /// A non-positive amount anywhere is reported at its index.
    #[test]
    fn prop_non_positive_amount_rejected(
        debits in prop::collection::vec(positive_amount(), 1..6),
        bad in non_positive_amount(),
        side in side_strategy(),
        position in 0usize..6,
    ) {
        let mut lines = balanced_lines(&debits, 1);
        let index = position.min(lines.len());
        lines.insert(index, LineInput::new(AccountId::new(), side, bad));

        let result = check_balance(&lines);
        prop_assert_eq!(
            result.unwrap_err(),
            LedgerError::InvalidAmount { line_index: index, amount: bad }
        );
    }

    /// Totals never depend on line order.
    #[test]
    fn prop_totals_order_independent(
        debits in prop::collection::vec(positive_amount(), 1..8),
    ) {
        let lines = balanced_lines(&debits, 3);
        let mut reversed = lines.clone();
        reversed.reverse();
        prop_assert_eq!(
            check_balance(&lines).unwrap().totals.total_debit,
            check_balance(&reversed).unwrap().totals.total_debit
        );
    }
}
