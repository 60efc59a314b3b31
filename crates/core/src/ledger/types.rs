//! Ledger domain types for journal entries and their lines.
//!
//! In double-entry bookkeeping:
//! - Debits increase asset/expense accounts, decrease liability/equity/revenue accounts
//! - Credits decrease asset/expense accounts, increase liability/equity/revenue accounts

use garde::Validate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::AccountId;

/// Absolute tolerance used when comparing debit and credit totals (0.001).
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

/// Side of a journal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySide {
    /// Debit line.
    Debit,
    /// Credit line.
    Credit,
}

impl EntrySide {
    /// Returns the other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }

    /// Returns the side as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }

    /// Splits an amount into `(debit, credit)` columns.
    #[must_use]
    pub const fn columns(self, amount: Decimal) -> (Decimal, Decimal) {
        match self {
            Self::Debit => (amount, Decimal::ZERO),
            Self::Credit => (Decimal::ZERO, amount),
        }
    }
}

impl std::fmt::Display for EntrySide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed journal line, as supplied by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct LineInput {
    /// Account to post to.
    #[garde(skip)]
    pub account_id: AccountId,
    /// Debit or credit.
    #[garde(skip)]
    pub side: EntrySide,
    /// Strictly positive amount.
    #[garde(skip)]
    pub amount: Decimal,
    /// Optional line memo.
    #[garde(length(max = 500))]
    pub description: Option<String>,
    /// Opaque dimension tags (cost center, project, ...).
    #[garde(inner(length(min = 1, max = 100)))]
    #[serde(default)]
    pub dimensions: Vec<String>,
}

impl LineInput {
    /// Creates a line with no memo or dimension tags.
    #[must_use]
    pub fn new(account_id: AccountId, side: EntrySide, amount: Decimal) -> Self {
        Self {
            account_id,
            side,
            amount,
            description: None,
            dimensions: Vec::new(),
        }
    }

    /// Creates a debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self::new(account_id, EntrySide::Debit, amount)
    }

    /// Creates a credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self::new(account_id, EntrySide::Credit, amount)
    }

    /// Sets the line memo.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Anything carrying a side and an amount can be balance-checked.
pub trait SidedAmount {
    /// Line side.
    fn side(&self) -> EntrySide;
    /// Line amount.
    fn amount(&self) -> Decimal;
}

impl SidedAmount for LineInput {
    fn side(&self) -> EntrySide {
        self.side
    }

    fn amount(&self) -> Decimal {
        self.amount
    }
}

/// Debit and credit totals of a line set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BalanceTotals {
    /// Sum of debit amounts.
    pub total_debit: Decimal,
    /// Sum of credit amounts.
    pub total_credit: Decimal,
    /// Number of debit lines.
    pub debit_lines: usize,
    /// Number of credit lines.
    pub credit_lines: usize,
}

impl BalanceTotals {
    /// Accumulates one line.
    pub fn add(&mut self, side: EntrySide, amount: Decimal) {
        match side {
            EntrySide::Debit => {
                self.total_debit += amount;
                self.debit_lines += 1;
            }
            EntrySide::Credit => {
                self.total_credit += amount;
                self.credit_lines += 1;
            }
        }
    }

    /// Returns `total_debit - total_credit`.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.total_debit - self.total_credit
    }

    /// Returns true if totals agree within [`BALANCE_TOLERANCE`].
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.difference().abs() <= BALANCE_TOLERANCE
    }

    /// Returns true if at least one line exists on each side.
    #[must_use]
    pub const fn has_both_sides(&self) -> bool {
        self.debit_lines > 0 && self.credit_lines > 0
    }
}

/// Outcome of a balance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceCheck {
    /// Computed totals.
    pub totals: BalanceTotals,
    /// Whether totals agree within tolerance.
    pub balanced: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tolerance_is_one_thousandth() {
        assert_eq!(BALANCE_TOLERANCE, dec!(0.001));
    }

    #[test]
    fn test_side_opposite_and_columns() {
        assert_eq!(EntrySide::Debit.opposite(), EntrySide::Credit);
        assert_eq!(EntrySide::Credit.opposite(), EntrySide::Debit);
        assert_eq!(EntrySide::Debit.columns(dec!(5)), (dec!(5), dec!(0)));
        assert_eq!(EntrySide::Credit.columns(dec!(5)), (dec!(0), dec!(5)));
    }

    #[test]
    fn test_totals_within_tolerance() {
        let mut totals = BalanceTotals::default();
        totals.add(EntrySide::Debit, dec!(100.0005));
        totals.add(EntrySide::Credit, dec!(100.00));
        assert!(totals.is_balanced());
        assert!(totals.has_both_sides());

        totals.add(EntrySide::Credit, dec!(0.002));
        assert!(!totals.is_balanced());
        assert_eq!(totals.credit_lines, 2);
    }

    #[test]
    fn test_exact_tolerance_boundary_is_balanced() {
        let mut totals = BalanceTotals::default();
        totals.add(EntrySide::Debit, dec!(10.001));
        totals.add(EntrySide::Credit, dec!(10.000));
        assert!(totals.is_balanced());
    }

    #[test]
    fn test_side_serde() {
        assert_eq!(serde_json::to_string(&EntrySide::Debit).unwrap(), "\"debit\"");
    }
}
