//! Per-account debit/credit accumulation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::accounts::AccountType;
use super::types::EntrySide;

/// Running debit and credit totals for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Total debit amount.
    pub total_debit: Decimal,
    /// Total credit amount.
    pub total_credit: Decimal,
}

impl AccountBalance {
    /// Adds a line amount on `side`.
    pub fn add(&mut self, side: EntrySide, amount: Decimal) {
        match side {
            EntrySide::Debit => self.total_debit += amount,
            EntrySide::Credit => self.total_credit += amount,
        }
    }

    /// Adds another balance into this one.
    pub fn merge(&mut self, other: &Self) {
        self.total_debit += other.total_debit;
        self.total_credit += other.total_credit;
    }

    /// Net balance under the account type's sign convention.
    #[must_use]
    pub fn net(&self, account_type: AccountType) -> Decimal {
        account_type
            .normal_balance()
            .balance_change(self.total_debit, self.total_credit)
    }

    /// Returns true if nothing has been accumulated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_debit.is_zero() && self.total_credit.is_zero()
    }
}
