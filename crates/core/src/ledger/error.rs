//! Ledger error types for validation, lookup, and uniqueness errors.

use rust_decimal::Decimal;
use tally_shared::types::{AccountId, EntityId, JournalEntryId, JournalLineId, MAX_AMOUNT_SCALE};
use thiserror::Error;

use super::reference::MAX_REFERENCE_LEN;
use crate::error::ErrorKind;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Balance Errors ==========
    /// Entry has no lines.
    #[error("Entry must have at least one line")]
    NoLines,

    /// Line amount is zero, negative, or finer than the storage scale.
    #[error(
        "Line {line_index} amount must be positive with at most {max} decimal places, got {amount}",
        max = MAX_AMOUNT_SCALE
    )]
    InvalidAmount {
        /// Zero-based index of the offending line.
        line_index: usize,
        /// The rejected amount.
        amount: Decimal,
    },

    /// Debit and credit totals differ by more than the tolerance.
    #[error("Entry is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// All lines are on the same side.
    #[error("Entry must have both debit and credit lines")]
    SingleSided,

    /// Removing the only remaining line.
    #[error("Cannot remove the last remaining line of an entry")]
    LastLineRemoval,

    /// A required header field is blank.
    #[error("Field '{0}' is required")]
    MissingField(&'static str),

    /// Reference number longer than storage allows.
    #[error("Reference number is {length} characters; at most {max} allowed", max = MAX_REFERENCE_LEN)]
    ReferenceTooLong {
        /// Length of the rejected reference, in characters.
        length: usize,
    },

    // ========== Account Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Account belongs to another entity.
    #[error("Account {0} does not belong to this entity")]
    AccountEntityMismatch(AccountId),

    /// Account is inactive and cannot be used.
    #[error("Account {0} is inactive")]
    AccountInactive(AccountId),

    /// Account code is blank, too long, or contains whitespace.
    #[error("Invalid account code: '{0}'")]
    InvalidAccountCode(String),

    /// Account code already used in the entity.
    #[error("Account code '{0}' already exists")]
    DuplicateAccountCode(String),

    /// Parent account missing or in another entity.
    #[error("Invalid parent account: {0}")]
    InvalidParent(AccountId),

    /// Parent assignment would create a cycle.
    #[error("Parent assignment for account {0} would create a cycle")]
    AccountCycle(AccountId),

    // ========== Lookup Errors ==========
    /// Entity not found for this client.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Entry not found in this client/entity.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    /// Line not found in the entry.
    #[error("Journal line not found: {0}")]
    LineNotFound(JournalLineId),

    /// Reference number already used in the entity.
    #[error("Reference number '{0}' already exists")]
    DuplicateReference(String),
}

impl LedgerError {
    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NoLines
            | Self::InvalidAmount { .. }
            | Self::Unbalanced { .. }
            | Self::SingleSided
            | Self::LastLineRemoval
            | Self::MissingField(_)
            | Self::ReferenceTooLong { .. }
            | Self::AccountInactive(_)
            | Self::InvalidAccountCode(_)
            | Self::InvalidParent(_)
            | Self::AccountCycle(_) => ErrorKind::Validation,

            Self::AccountNotFound(_)
            | Self::AccountEntityMismatch(_)
            | Self::EntityNotFound(_)
            | Self::EntryNotFound(_)
            | Self::LineNotFound(_) => ErrorKind::NotFound,

            Self::DuplicateAccountCode(_) | Self::DuplicateReference(_) => ErrorKind::Conflict,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NoLines => "NO_LINES",
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::Unbalanced { .. } => "UNBALANCED_ENTRY",
            Self::SingleSided => "SINGLE_SIDED_ENTRY",
            Self::LastLineRemoval => "LAST_LINE_REMOVAL",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::ReferenceTooLong { .. } => "REFERENCE_TOO_LONG",
            Self::AccountNotFound(_) | Self::AccountEntityMismatch(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::InvalidAccountCode(_) => "INVALID_ACCOUNT_CODE",
            Self::DuplicateAccountCode(_) => "DUPLICATE_ACCOUNT_CODE",
            Self::InvalidParent(_) => "INVALID_PARENT_ACCOUNT",
            Self::AccountCycle(_) => "ACCOUNT_CYCLE",
            Self::EntityNotFound(_) => "ENTITY_NOT_FOUND",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::LineNotFound(_) => "LINE_NOT_FOUND",
            Self::DuplicateReference(_) => "DUPLICATE_REFERENCE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        self.kind().http_status_code()
    }
}
