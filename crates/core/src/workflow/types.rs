//! Workflow domain types for journal entry lifecycle management.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tally_shared::types::UserId;

/// Journal entry status.
///
/// The valid transitions are:
/// - Draft → PendingApproval (request approval)
/// - PendingApproval → Approved (approve)
/// - PendingApproval → Rejected (reject, terminal)
/// - Approved → Posted (post)
/// - Posted → Voided (void, terminal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Being drafted; lines may change.
    Draft,
    /// Submitted for approval.
    PendingApproval,
    /// Approved and ready for posting.
    Approved,
    /// Rejected by an approver (terminal).
    Rejected,
    /// Posted to the ledger (append-only).
    Posted,
    /// Voided after posting (terminal).
    Voided,
}

impl EntryStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Draft,
        Self::PendingApproval,
        Self::Approved,
        Self::Rejected,
        Self::Posted,
        Self::Voided,
    ];

    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Posted => "posted",
            Self::Voided => "voided",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "pending_approval" => Some(Self::PendingApproval),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "posted" => Some(Self::Posted),
            "voided" => Some(Self::Voided),
            _ => None,
        }
    }

    /// Returns true if lines and header fields may change.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if attachments may be added or removed.
    ///
    /// The attachment collaborator queries this; the ledger itself stores no files.
    #[must_use]
    pub const fn allows_attachment_changes(&self) -> bool {
        matches!(self, Self::Draft | Self::PendingApproval)
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Voided)
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Workflow action representing a state transition with audit data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowAction {
    /// Submit a draft for approval.
    RequestApproval {
        /// Requesting user.
        requested_by: UserId,
        /// When approval was requested.
        requested_at: DateTime<Utc>,
    },
    /// Approve a pending entry.
    Approve {
        /// Approving user.
        approved_by: UserId,
        /// When the entry was approved.
        approved_at: DateTime<Utc>,
    },
    /// Reject a pending entry.
    Reject {
        /// Rejecting user.
        rejected_by: UserId,
        /// When the entry was rejected.
        rejected_at: DateTime<Utc>,
        /// Why.
        reason: String,
    },
    /// Post an approved entry.
    Post {
        /// Posting user.
        posted_by: UserId,
        /// When the entry was posted.
        posted_at: DateTime<Utc>,
    },
    /// Void a posted entry.
    Void {
        /// Voiding user.
        voided_by: UserId,
        /// When the entry was voided.
        voided_at: DateTime<Utc>,
        /// Why.
        reason: String,
    },
}

impl WorkflowAction {
    /// Returns the status required before this action.
    #[must_use]
    pub const fn from_status(&self) -> EntryStatus {
        match self {
            Self::RequestApproval { .. } => EntryStatus::Draft,
            Self::Approve { .. } | Self::Reject { .. } => EntryStatus::PendingApproval,
            Self::Post { .. } => EntryStatus::Approved,
            Self::Void { .. } => EntryStatus::Posted,
        }
    }

    /// Returns the new status resulting from this action.
    #[must_use]
    pub const fn new_status(&self) -> EntryStatus {
        match self {
            Self::RequestApproval { .. } => EntryStatus::PendingApproval,
            Self::Approve { .. } => EntryStatus::Approved,
            Self::Reject { .. } => EntryStatus::Rejected,
            Self::Post { .. } => EntryStatus::Posted,
            Self::Void { .. } => EntryStatus::Voided,
        }
    }
}
