//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - Journal entries and lines
//! - Chart of accounts with its hierarchy rules
//! - The balance validator
//! - Reference number generation
//! - Sign conventions and per-account balances
//! - Error types for ledger operations

pub mod accounts;
pub mod balance;
pub mod entity;
pub mod entry;
pub mod error;
pub mod reference;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use accounts::{
    Account, AccountDirectory, AccountNode, AccountType, MAX_ACCOUNT_CODE_LEN, NormalBalance, SubledgerKind,
};
pub use balance::AccountBalance;
pub use entity::{EntityScope, LedgerEntity};
pub use entry::{JournalEntry, JournalLine, NewEntry, Stamp};
pub use error::LedgerError;
pub use reference::{MAX_REFERENCE_LEN, ReferenceNumbers};
pub use service::{AccountInfo, LedgerService};
pub use types::{BALANCE_TOLERANCE, BalanceCheck, BalanceTotals, EntrySide, LineInput, SidedAmount};
pub use validation::{check_balance, is_valid_line_amount, require_balanced, require_both_sides};
