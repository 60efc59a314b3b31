//! Errors reported by ledger store implementations.

use tally_shared::types::{EntityId, JournalEntryId};
use thiserror::Error;

use crate::error::ErrorKind;
use crate::workflow::EntryStatus;

/// Errors that can occur in a `LedgerStore`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Reference number already taken within the entity.
    #[error("Reference number '{reference}' already exists in entity {entity_id}")]
    DuplicateReference {
        /// Owning entity.
        entity_id: EntityId,
        /// Conflicting reference.
        reference: String,
    },

    /// Account code already taken within the entity.
    #[error("Account code '{code}' already exists in entity {entity_id}")]
    DuplicateAccountCode {
        /// Owning entity.
        entity_id: EntityId,
        /// Conflicting code.
        code: String,
    },

    /// Compare-and-set on entry status lost.
    #[error("Entry {entry_id} status is {actual}, expected {expected}")]
    StatusConflict {
        /// The entry.
        entry_id: JournalEntryId,
        /// Status the caller expected.
        expected: EntryStatus,
        /// Status found.
        actual: EntryStatus,
    },

    /// Original entry already carries a reversal link.
    #[error("Entry {entry_id} already reversed by {reversed_by}")]
    AlreadyReversed {
        /// The original entry.
        entry_id: JournalEntryId,
        /// The existing reversal.
        reversed_by: JournalEntryId,
    },

    /// A row the operation depends on does not exist.
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Resource name.
        resource: &'static str,
        /// Identifier looked up.
        id: String,
    },

    /// Backing store failed or timed out.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Shorthand for a missing row.
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateReference { .. }
            | Self::DuplicateAccountCode { .. }
            | Self::AlreadyReversed { .. } => ErrorKind::Conflict,
            Self::StatusConflict { .. } => ErrorKind::IllegalTransition,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Unavailable(_) => ErrorKind::Storage,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateReference { .. } => "DUPLICATE_REFERENCE",
            Self::DuplicateAccountCode { .. } => "DUPLICATE_ACCOUNT_CODE",
            Self::StatusConflict { .. } => "STATUS_CONFLICT",
            Self::AlreadyReversed { .. } => "ALREADY_REVERSED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Unavailable(_) => "STORAGE_ERROR",
        }
    }
}
