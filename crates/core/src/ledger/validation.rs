//! Balance Validator: checks that a set of lines nets to zero.
//!
//! Pure functions; nothing here mutates state.

use rust_decimal::Decimal;
use tally_shared::types::fits_amount_scale;

use super::error::LedgerError;
use super::types::{BalanceCheck, BalanceTotals, SidedAmount};

/// Whether `amount` can appear on a line: positive and within the storage scale.
#[must_use]
pub fn is_valid_line_amount(amount: Decimal) -> bool {
    amount > Decimal::ZERO && fits_amount_scale(amount)
}

/// Computes totals for a line set and reports whether it balances.
///
/// Empty line sets and unusable amounts are rejected before any totals
/// are computed.
///
/// # Errors
///
/// Returns `NoLines` or `InvalidAmount` (naming the first offending line).
pub fn check_balance<L: SidedAmount>(lines: &[L]) -> Result<BalanceCheck, LedgerError> {
    if lines.is_empty() {
        return Err(LedgerError::NoLines);
    }

    if let Some((line_index, line)) = lines
        .iter()
        .enumerate()
        .find(|(_, line)| !is_valid_line_amount(line.amount()))
    {
        return Err(LedgerError::InvalidAmount {
            line_index,
            amount: line.amount(),
        });
    }

    let mut totals = BalanceTotals::default();
    for line in lines {
        totals.add(line.side(), line.amount());
    }

    Ok(BalanceCheck {
        totals,
        balanced: totals.is_balanced(),
    })
}

/// Like [`check_balance`], but an unbalanced set is an error.
///
/// # Errors
///
/// Returns `NoLines`, `InvalidAmount`, or `Unbalanced`.
pub fn require_balanced<L: SidedAmount>(lines: &[L]) -> Result<BalanceTotals, LedgerError> {
    let check = check_balance(lines)?;
    if !check.balanced {
        return Err(LedgerError::Unbalanced {
            debit: check.totals.total_debit,
            credit: check.totals.total_credit,
        });
    }
    Ok(check.totals)
}

/// Requires at least one debit and one credit line.
///
/// # Errors
///
/// Returns `SingleSided` otherwise.
pub fn require_both_sides(totals: &BalanceTotals) -> Result<(), LedgerError> {
    if totals.has_both_sides() {
        Ok(())
    } else {
        Err(LedgerError::SingleSided)
    }
}
