//! Lifecycle transitions and resubmission.

use chrono::{DateTime, Utc};
use tally_shared::types::JournalEntryId;
use tracing::{info, instrument};

use super::{DraftWrite, EngineError, LedgerEngine};
use crate::ledger::{
    EntityScope, JournalEntry, NewEntry, ReferenceNumbers, require_balanced, require_both_sides,
};
use crate::store::{AuditAction, AuditSink, LedgerStore};
use crate::workflow::{Actor, Operation, WorkflowAction, WorkflowService};

impl<S: LedgerStore, A: AuditSink> LedgerEngine<S, A> {
    /// Submits a balanced draft for approval.
    ///
    /// # Errors
    ///
    /// Returns `IllegalTransition` outside `draft`, `Unbalanced`, or
    /// `SingleSided`.
    #[instrument(skip_all, fields(entity_id = %scope.entity_id, entry_id = %entry_id))]
    pub async fn request_approval(
        &self,
        actor: &Actor,
        scope: EntityScope,
        entry_id: JournalEntryId,
    ) -> Result<JournalEntry, EngineError> {
        self.transition(
            actor,
            scope,
            entry_id,
            Operation::RequestApproval,
            AuditAction::ApprovalRequested,
            |entry, now| {
                let action = WorkflowService::request_approval(entry.status, actor.user_id, now)?;
                let totals = require_balanced(&entry.lines)?;
                require_both_sides(&totals)?;
                Ok(action)
            },
        )
        .await
    }

    /// Approves a pending entry.
    ///
    /// # Errors
    ///
    /// Returns `IllegalTransition` outside `pending_approval`.
    #[instrument(skip_all, fields(entity_id = %scope.entity_id, entry_id = %entry_id))]
    pub async fn approve(
        &self,
        actor: &Actor,
        scope: EntityScope,
        entry_id: JournalEntryId,
    ) -> Result<JournalEntry, EngineError> {
        self.transition(
            actor,
            scope,
            entry_id,
            Operation::Approve,
            AuditAction::EntryApproved,
            |entry, now| Ok(WorkflowService::approve(entry.status, actor.user_id, now)?),
        )
        .await
    }

    /// Rejects a pending entry with a reason.
    ///
    /// # Errors
    ///
    /// Returns `IllegalTransition` unless pending, then `RejectionReasonRequired`
    /// for a blank reason.
    #[instrument(skip_all, fields(entity_id = %scope.entity_id, entry_id = %entry_id))]
    pub async fn reject(
        &self,
        actor: &Actor,
        scope: EntityScope,
        entry_id: JournalEntryId,
        reason: &str,
    ) -> Result<JournalEntry, EngineError> {
        self.transition(
            actor,
            scope,
            entry_id,
            Operation::Reject,
            AuditAction::EntryRejected,
            |entry, now| Ok(WorkflowService::reject(entry.status, actor.user_id, reason, now)?),
        )
        .await
    }

    /// Posts an approved entry, re-checking balance immediately before the flip.
    ///
    /// Of two concurrent posts, exactly one succeeds; the other gets
    /// `ConcurrentTransition`.
    ///
    /// # Errors
    ///
    /// Returns `IllegalTransition`, `ConcurrentTransition`, or `Unbalanced`.
    #[instrument(skip_all, fields(entity_id = %scope.entity_id, entry_id = %entry_id))]
    pub async fn post(
        &self,
        actor: &Actor,
        scope: EntityScope,
        entry_id: JournalEntryId,
    ) -> Result<JournalEntry, EngineError> {
        self.transition(
            actor,
            scope,
            entry_id,
            Operation::Post,
            AuditAction::EntryPosted,
            |entry, now| {
                let action = WorkflowService::post(entry.status, actor.user_id, now)?;
                let totals = require_balanced(&entry.lines)?;
                require_both_sides(&totals)?;
                Ok(action)
            },
        )
        .await
    }

    /// Voids a posted entry. Lines are kept and no reversal is created.
    ///
    /// # Errors
    ///
    /// Returns `IllegalTransition` unless posted, then `VoidReasonRequired` for a
    /// blank reason.
    #[instrument(skip_all, fields(entity_id = %scope.entity_id, entry_id = %entry_id))]
    pub async fn void(
        &self,
        actor: &Actor,
        scope: EntityScope,
        entry_id: JournalEntryId,
        reason: &str,
    ) -> Result<JournalEntry, EngineError> {
        self.transition(
            actor,
            scope,
            entry_id,
            Operation::Void,
            AuditAction::EntryVoided,
            |entry, now| Ok(WorkflowService::void(entry.status, actor.user_id, reason, now)?),
        )
        .await
    }

    /// Copies a rejected entry into a new draft under `{reference}-R1`.
    ///
    /// The rejected entry is left as it is.
    ///
    /// # Errors
    ///
    /// Returns `ResubmitRequiresRejected` or `EntryNotFound`.
    #[instrument(skip_all, fields(entity_id = %scope.entity_id, entry_id = %entry_id))]
    pub async fn resubmit(
        &self,
        actor: &Actor,
        scope: EntityScope,
        entry_id: JournalEntryId,
    ) -> Result<JournalEntry, EngineError> {
        self.guarded(
            actor,
            scope.client_id,
            Some(scope.entity_id),
            Operation::Resubmit,
            Some(entry_id.into_inner()),
            async move {
                let original = self.load_entry(scope, entry_id).await?;
                WorkflowService::validate_can_resubmit(original.status)?;

                let header = NewEntry {
                    client_id: original.client_id,
                    entity_id: original.entity_id,
                    entry_date: original.entry_date,
                    reference_number: String::new(),
                    description: original.description.clone(),
                    created_by: actor.user_id,
                };
                let mut draft = JournalEntry::draft(header, original.line_inputs(), Utc::now());
                draft.resubmitted_from = Some(original.id);

                let base = ReferenceNumbers::resubmission(&original.reference_number);
                let entry = self
                    .write_with_unique_reference(draft, &base, DraftWrite::Entry)
                    .await?;

                info!(
                    original = %original.reference_number,
                    reference = %entry.reference_number,
                    "Rejected entry resubmitted"
                );
                self.record(
                    actor,
                    scope.client_id,
                    Some(scope.entity_id),
                    AuditAction::EntryResubmitted,
                    Some(entry.id.into_inner()),
                    serde_json::json!({
                        "resubmitted_from": original.id,
                        "reference_number": entry.reference_number,
                    }),
                )
                .await;

                Ok(entry)
            },
        )
        .await
    }

    /// Loads the entry, lets `plan` validate the move, applies it, and writes
    /// it compare-and-set against the status that was read.
    async fn transition<F>(
        &self,
        actor: &Actor,
        scope: EntityScope,
        entry_id: JournalEntryId,
        operation: Operation,
        action_name: AuditAction,
        plan: F,
    ) -> Result<JournalEntry, EngineError>
    where
        F: FnOnce(&JournalEntry, DateTime<Utc>) -> Result<WorkflowAction, EngineError>,
    {
        self.guarded(
            actor,
            scope.client_id,
            Some(scope.entity_id),
            operation,
            Some(entry_id.into_inner()),
            async move {
                let mut entry = self.load_entry(scope, entry_id).await?;
                let action = plan(&entry, Utc::now())?;
                let from = action.from_status();

                WorkflowService::apply(&mut entry, &action);
                self.store.transition_entry(&entry, from).await?;

                info!(
                    reference = %entry.reference_number,
                    from = %from,
                    to = %entry.status,
                    "Journal entry status changed"
                );
                let reason = match &action {
                    WorkflowAction::Reject { reason, .. } | WorkflowAction::Void { reason, .. } => {
                        Some(reason.as_str())
                    }
                    _ => None,
                };
                self.record(
                    actor,
                    scope.client_id,
                    Some(scope.entity_id),
                    action_name,
                    Some(entry.id.into_inner()),
                    serde_json::json!({
                        "from": from,
                        "to": entry.status,
                        "reason": reason,
                    }),
                )
                .await;

                Ok(entry)
            },
        )
        .await
    }
}
