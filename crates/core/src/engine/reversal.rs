//! Reversing posted entries.

use chrono::Utc;
use tally_shared::types::JournalEntryId;
use tracing::{info, instrument};

use super::{DraftWrite, EngineError, LedgerEngine};
use crate::ledger::{EntityScope, JournalEntry, LedgerService, NewEntry};
use crate::store::{AuditAction, AuditSink, LedgerStore};
use crate::workflow::{Actor, Operation, ReversalOptions, ReversalService};

impl<S: LedgerStore, A: AuditSink> LedgerEngine<S, A> {
    /// Creates a draft that mirrors a posted entry with every side swapped.
    ///
    /// The original gains `reversed_by` and the draft `reversal_of` in one
    /// store write. A taken reference is suffixed rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns `ReversalRequiresPosted`, `AlreadyReversed`, `EntryNotFound`, or
    /// `ReferenceTooLong` for an oversized explicit reference.
    #[instrument(skip_all, fields(entity_id = %scope.entity_id, entry_id = %entry_id))]
    pub async fn reverse(
        &self,
        actor: &Actor,
        scope: EntityScope,
        entry_id: JournalEntryId,
        options: ReversalOptions,
    ) -> Result<JournalEntry, EngineError> {
        self.guarded(
            actor,
            scope.client_id,
            Some(scope.entity_id),
            Operation::Reverse,
            Some(entry_id.into_inner()),
            async move {
                if let Some(reference) = options.reference_number.as_deref().filter(|r| !r.trim().is_empty()) {
                    LedgerService::validate_reference(reference)?;
                }
                let original = self.load_entry(scope, entry_id).await?;
                let now = Utc::now();
                let plan = ReversalService::plan(
                    &original,
                    &self.config.reversal_prefix,
                    options,
                    now.date_naive(),
                )?;

                let header = NewEntry {
                    client_id: original.client_id,
                    entity_id: original.entity_id,
                    entry_date: plan.entry_date,
                    reference_number: String::new(),
                    description: plan.description,
                    created_by: actor.user_id,
                };
                let mut draft = JournalEntry::draft(header, plan.lines, now);
                draft.reversal_of = Some(original.id);

                let reversal = self
                    .write_with_unique_reference(
                        draft,
                        &plan.reference_number,
                        DraftWrite::Reversal(original.id),
                    )
                    .await?;

                info!(
                    original = %original.reference_number,
                    reversal_id = %reversal.id,
                    reference = %reversal.reference_number,
                    "Journal entry reversed"
                );
                self.record(
                    actor,
                    scope.client_id,
                    Some(scope.entity_id),
                    AuditAction::EntryReversed,
                    Some(original.id.into_inner()),
                    serde_json::json!({
                        "reversal_id": reversal.id,
                        "reference_number": reversal.reference_number,
                    }),
                )
                .await;

                Ok(reversal)
            },
        )
        .await
    }
}
