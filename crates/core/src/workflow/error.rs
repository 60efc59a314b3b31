//! Workflow error types for journal entry lifecycle management.

use tally_shared::types::JournalEntryId;
use thiserror::Error;

use super::access::{ActorRole, Operation};
use super::types::EntryStatus;
use crate::error::ErrorKind;

/// Errors that can occur during workflow operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Attempted a transition the state machine does not allow.
    #[error("Illegal status transition from {from} to {to}")]
    IllegalTransition {
        /// The current status.
        from: EntryStatus,
        /// The attempted target status.
        to: EntryStatus,
    },

    /// Another caller changed the status first.
    #[error("Entry status changed concurrently: expected {expected}, found {actual}")]
    ConcurrentTransition {
        /// Status the caller acted on.
        expected: EntryStatus,
        /// Status found at write time.
        actual: EntryStatus,
    },

    /// Lines or header edited outside `draft`.
    #[error("Cannot modify an entry in {status} status")]
    NotEditable {
        /// The current status.
        status: EntryStatus,
    },

    /// Delete attempted outside `draft`.
    #[error("Can only delete draft entries, entry is {status}")]
    CanOnlyDeleteDraft {
        /// The current status.
        status: EntryStatus,
    },

    /// Reversal source is not posted.
    #[error("Only posted entries can be reversed, entry is {status}")]
    ReversalRequiresPosted {
        /// The current status.
        status: EntryStatus,
    },

    /// Entry already has a reversal.
    #[error("Entry {entry_id} was already reversed by {reversed_by}")]
    AlreadyReversed {
        /// The source entry.
        entry_id: JournalEntryId,
        /// The existing reversal.
        reversed_by: JournalEntryId,
    },

    /// Resubmission attempted on a non-rejected entry.
    #[error("Only rejected entries can be resubmitted, entry is {status}")]
    ResubmitRequiresRejected {
        /// The current status.
        status: EntryStatus,
    },

    /// Actor role is below what the operation requires.
    #[error("Role {role} may not {operation}; requires {required}")]
    InsufficientRole {
        /// The actor's role.
        role: ActorRole,
        /// The required role.
        required: ActorRole,
        /// The denied operation.
        operation: Operation,
    },

    /// Void reason is required but not provided.
    #[error("Void reason is required")]
    VoidReasonRequired,

    /// Rejection reason is required but not provided.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,
}

impl WorkflowError {
    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::IllegalTransition { .. }
            | Self::ConcurrentTransition { .. }
            | Self::ReversalRequiresPosted { .. }
            | Self::ResubmitRequiresRejected { .. } => ErrorKind::IllegalTransition,

            Self::NotEditable { .. } | Self::CanOnlyDeleteDraft { .. } | Self::AlreadyReversed { .. } => {
                ErrorKind::Conflict
            }

            Self::InsufficientRole { .. } => ErrorKind::Forbidden,

            Self::VoidReasonRequired | Self::RejectionReasonRequired => ErrorKind::Validation,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.kind().http_status_code()
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::IllegalTransition { .. } => "ILLEGAL_TRANSITION",
            Self::ConcurrentTransition { .. } => "CONCURRENT_TRANSITION",
            Self::NotEditable { .. } => "ENTRY_NOT_EDITABLE",
            Self::CanOnlyDeleteDraft { .. } => "CAN_ONLY_DELETE_DRAFT",
            Self::ReversalRequiresPosted { .. } => "REVERSAL_REQUIRES_POSTED",
            Self::AlreadyReversed { .. } => "ALREADY_REVERSED",
            Self::ResubmitRequiresRejected { .. } => "RESUBMIT_REQUIRES_REJECTED",
            Self::InsufficientRole { .. } => "INSUFFICIENT_ROLE",
            Self::VoidReasonRequired => "VOID_REASON_REQUIRED",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
        }
    }

    /// Returns the status the entry was found in, when the error carries one.
    #[must_use]
    pub const fn current_status(&self) -> Option<EntryStatus> {
        match self {
            Self::IllegalTransition { from: status, .. }
            | Self::ConcurrentTransition { actual: status, .. }
            | Self::NotEditable { status }
            | Self::CanOnlyDeleteDraft { status }
            | Self::ReversalRequiresPosted { status }
            | Self::ResubmitRequiresRejected { status } => Some(*status),
            _ => None,
        }
    }
}
