//! Property-based tests for the entry lifecycle state machine.

use chrono::Utc;
use proptest::prelude::*;
use tally_shared::types::UserId;
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::service::WorkflowService;
use crate::workflow::types::{EntryStatus, WorkflowAction};

/// Strategy for generating random EntryStatus values.
fn arb_status() -> impl Strategy<Value = EntryStatus> {
    prop::sample::select(EntryStatus::ALL.to_vec())
}

/// Strategy for generating random user IDs.
fn arb_user() -> impl Strategy<Value = UserId> {
    any::<u128>().prop_map(|n| UserId::from_uuid(Uuid::from_u128(n)))
}

/// Strategy for generating non-blank reasons.
fn arb_reason() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{1,40}"
}

/// Runs the operation that targets `to`, if there is one.
fn attempt(
    from: EntryStatus,
    to: EntryStatus,
    user: UserId,
    reason: &str,
) -> Option<Result<WorkflowAction, WorkflowError>> {
    let now = Utc::now();
    match to {
        EntryStatus::PendingApproval => Some(WorkflowService::request_approval(from, user, now)),
        EntryStatus::Approved => Some(WorkflowService::approve(from, user, now)),
        EntryStatus::Rejected => Some(WorkflowService::reject(from, user, reason, now)),
        EntryStatus::Posted => Some(WorkflowService::post(from, user, now)),
        EntryStatus::Voided => Some(WorkflowService::void(from, user, reason, now)),
        EntryStatus::Draft => None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every operation succeeds exactly when the transition table allows it.
    #[test]
    fn prop_operations_match_transition_table(
        from in arb_status(),
        to in arb_status(),
        user in arb_user(),
        reason in arb_reason(),
    ) {
        if let Some(result) = attempt(from, to, user, &reason) {
            let allowed = WorkflowService::is_valid_transition(from, to);
            prop_assert_eq!(result.is_ok(), allowed);
            match result {
                Ok(action) => {
                    prop_assert_eq!(action.from_status(), from);
                    prop_assert_eq!(action.new_status(), to);
                }
                Err(err) => {
                    prop_assert_eq!(err, WorkflowError::IllegalTransition { from, to });
                }
            }
        }
    }

    /// Nothing leaves a terminal state, and nothing re-enters draft.
    #[test]
    fn prop_terminal_states_are_final(from in arb_status(), to in arb_status()) {
        if from.is_terminal() || to == EntryStatus::Draft {
            prop_assert!(!WorkflowService::is_valid_transition(from, to));
        }
    }

    /// A blank reason fails as a missing reason from the right status, and as
    /// an illegal transition from any other.
    #[test]
    fn prop_blank_reason_rejected(from in arb_status(), user in arb_user(), pad in " {0,5}") {
        let expected = if from == EntryStatus::PendingApproval {
            WorkflowError::RejectionReasonRequired
        } else {
            WorkflowError::IllegalTransition { from, to: EntryStatus::Rejected }
        };
        prop_assert_eq!(WorkflowService::reject(from, user, &pad, Utc::now()).unwrap_err(), expected);

        let expected = if from == EntryStatus::Posted {
            WorkflowError::VoidReasonRequired
        } else {
            WorkflowError::IllegalTransition { from, to: EntryStatus::Voided }
        };
        prop_assert_eq!(WorkflowService::void(from, user, &pad, Utc::now()).unwrap_err(), expected);
    }

    /// Only drafts accept edits or deletion.
    #[test]
    fn prop_only_drafts_are_mutable(status in arb_status()) {
        let is_draft = status == EntryStatus::Draft;
        prop_assert_eq!(WorkflowService::validate_can_modify(status).is_ok(), is_draft);
        prop_assert_eq!(WorkflowService::validate_can_delete(status).is_ok(), is_draft);
    }
}
