//! Mapping from `DbErr` to `StoreError`.

use sea_orm::{DbErr, SqlErr};
use tally_core::store::StoreError;
use tracing::error;

pub(crate) const ACCOUNT_CODE_KEY: &str = "uq_accounts_entity_code";
pub(crate) const ENTRY_REFERENCE_KEY: &str = "uq_journal_entries_entity_reference";
pub(crate) const REVERSAL_OF_KEY: &str = "uq_journal_entries_reversal_of";
pub(crate) const GROUP_MEMBER_KEY: &str = "consolidation_group_members_pkey";

/// Any database failure the caller cannot act on.
pub(crate) fn storage(err: DbErr) -> StoreError {
    error!(error = %err, "Database operation failed");
    StoreError::Unavailable(err.to_string())
}

/// Returns true if `err` is a unique violation on `constraint`.
pub(crate) fn violates(err: &DbErr, constraint: &str) -> bool {
    matches!(
        err.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(message)) if message.contains(constraint)
    )
}

/// A stored value the domain cannot represent.
pub(crate) fn corrupt(table: &str, detail: impl std::fmt::Display) -> StoreError {
    error!(table, %detail, "Stored row failed to decode");
    StoreError::Unavailable(format!("corrupt row in {table}: {detail}"))
}
