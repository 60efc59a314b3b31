//! Workflow service for journal entry state transitions.
//!
//! This module implements the core state machine logic for
//! moving entries through the approval and posting lifecycle.

use chrono::{DateTime, Utc};
use tally_shared::types::UserId;

use crate::ledger::{JournalEntry, Stamp};
use crate::workflow::error::WorkflowError;
use crate::workflow::types::{EntryStatus, WorkflowAction};

/// Stateless service for managing entry workflow transitions.
///
/// All methods are associated functions that validate a transition and
/// return the `WorkflowAction` carrying its audit trail.
pub struct WorkflowService;

impl WorkflowService {
    /// Submit a draft entry for approval.
    ///
    /// Balance is checked by the caller before this runs.
    pub fn request_approval(
        current_status: EntryStatus,
        requested_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            EntryStatus::Draft => Ok(WorkflowAction::RequestApproval {
                requested_by,
                requested_at: now,
            }),
            _ => Err(WorkflowError::IllegalTransition {
                from: current_status,
                to: EntryStatus::PendingApproval,
            }),
        }
    }

    /// Approve a pending entry.
    pub fn approve(
        current_status: EntryStatus,
        approved_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            EntryStatus::PendingApproval => Ok(WorkflowAction::Approve {
                approved_by,
                approved_at: now,
            }),
            _ => Err(WorkflowError::IllegalTransition {
                from: current_status,
                to: EntryStatus::Approved,
            }),
        }
    }

    /// Reject a pending entry. The reason must not be blank.
    ///
    /// Status is checked before the reason.
    pub fn reject(
        current_status: EntryStatus,
        rejected_by: UserId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            EntryStatus::PendingApproval if reason.trim().is_empty() => {
                Err(WorkflowError::RejectionReasonRequired)
            }
            EntryStatus::PendingApproval => Ok(WorkflowAction::Reject {
                rejected_by,
                rejected_at: now,
                reason: reason.trim().to_string(),
            }),
            _ => Err(WorkflowError::IllegalTransition {
                from: current_status,
                to: EntryStatus::Rejected,
            }),
        }
    }

    /// Post an approved entry.
    ///
    /// Balance is re-validated by the caller immediately before this runs.
    pub fn post(
        current_status: EntryStatus,
        posted_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            EntryStatus::Approved => Ok(WorkflowAction::Post {
                posted_by,
                posted_at: now,
            }),
            _ => Err(WorkflowError::IllegalTransition {
                from: current_status,
                to: EntryStatus::Posted,
            }),
        }
    }

    /// Void a posted entry. The reason must not be blank.
    ///
    /// Status is checked before the reason.
    pub fn void(
        current_status: EntryStatus,
        voided_by: UserId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            EntryStatus::Posted if reason.trim().is_empty() => Err(WorkflowError::VoidReasonRequired),
            EntryStatus::Posted => Ok(WorkflowAction::Void {
                voided_by,
                voided_at: now,
                reason: reason.trim().to_string(),
            }),
            _ => Err(WorkflowError::IllegalTransition {
                from: current_status,
                to: EntryStatus::Voided,
            }),
        }
    }

    /// Applies a validated action to an entry: new status plus audit stamps.
    pub fn apply(entry: &mut JournalEntry, action: &WorkflowAction) {
        match action {
            WorkflowAction::RequestApproval {
                requested_by,
                requested_at,
            } => {
                entry.submitted = Some(Stamp::new(*requested_by, *requested_at));
                entry.updated_at = *requested_at;
            }
            WorkflowAction::Approve {
                approved_by,
                approved_at,
            } => {
                entry.approved = Some(Stamp::new(*approved_by, *approved_at));
                entry.updated_at = *approved_at;
            }
            WorkflowAction::Reject {
                rejected_by,
                rejected_at,
                reason,
            } => {
                entry.rejected = Some(Stamp::new(*rejected_by, *rejected_at));
                entry.rejection_reason = Some(reason.clone());
                entry.updated_at = *rejected_at;
            }
            WorkflowAction::Post {
                posted_by,
                posted_at,
            } => {
                entry.posted = Some(Stamp::new(*posted_by, *posted_at));
                entry.updated_at = *posted_at;
            }
            WorkflowAction::Void {
                voided_by,
                voided_at,
                reason,
            } => {
                entry.voided = Some(Stamp::new(*voided_by, *voided_at));
                entry.void_reason = Some(reason.clone());
                entry.updated_at = *voided_at;
            }
        }
        entry.status = action.new_status();
    }

    /// Check if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Draft → PendingApproval
    /// - PendingApproval → Approved | Rejected
    /// - Approved → Posted
    /// - Posted → Voided
    #[must_use]
    pub fn is_valid_transition(from: EntryStatus, to: EntryStatus) -> bool {
        matches!(
            (from, to),
            (EntryStatus::Draft, EntryStatus::PendingApproval)
                | (
                    EntryStatus::PendingApproval,
                    EntryStatus::Approved | EntryStatus::Rejected
                )
                | (EntryStatus::Approved, EntryStatus::Posted)
                | (EntryStatus::Posted, EntryStatus::Voided)
        )
    }

    /// Validate that an entry's lines or header can be modified.
    pub fn validate_can_modify(status: EntryStatus) -> Result<(), WorkflowError> {
        if status.is_editable() {
            Ok(())
        } else {
            Err(WorkflowError::NotEditable { status })
        }
    }

    /// Validate that an entry can be deleted.
    pub fn validate_can_delete(status: EntryStatus) -> Result<(), WorkflowError> {
        match status {
            EntryStatus::Draft => Ok(()),
            _ => Err(WorkflowError::CanOnlyDeleteDraft { status }),
        }
    }

    /// Validate that a rejected entry may be copied into a new draft.
    pub fn validate_can_resubmit(status: EntryStatus) -> Result<(), WorkflowError> {
        match status {
            EntryStatus::Rejected => Ok(()),
            _ => Err(WorkflowError::ResubmitRequiresRejected { status }),
        }
    }
}
