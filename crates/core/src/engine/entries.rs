//! Draft entries: creation, listing, editing, and deletion.

use chrono::Utc;
use garde::Validate;
use tally_shared::types::{JournalEntryId, JournalLineId, PageRequest, PageResponse};
use tracing::{info, instrument};

use super::commands::{CreateEntry, LineEdit, UpdateEntry};
use super::{DraftWrite, EngineError, LedgerEngine};
use crate::ledger::{
    EntityScope, JournalEntry, JournalLine, LedgerError, LedgerService, LineInput, NewEntry,
};
use crate::store::{AuditAction, AuditSink, EntryFilter, LedgerStore};
use crate::workflow::{Actor, EntryStatus, Operation, WorkflowService};

impl<S: LedgerStore, A: AuditSink> LedgerEngine<S, A> {
    /// Creates a draft entry.
    ///
    /// Lines must balance and post to active accounts of the entity. An
    /// explicit reference that is already taken is a conflict; without one,
    /// a `{prefix}-{date}-{id}` reference is generated.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad lines, `DuplicateReference`, or
    /// `EntityNotFound`.
    #[instrument(skip_all, fields(entity_id = %scope.entity_id))]
    pub async fn create_entry(
        &self,
        actor: &Actor,
        scope: EntityScope,
        cmd: CreateEntry,
    ) -> Result<JournalEntry, EngineError> {
        self.guarded(actor, scope.client_id, Some(scope.entity_id), Operation::CreateEntry, None, async move {
            cmd.validate()?;
            self.require_entity(scope).await?;
            LedgerService::validate_header(cmd.reference_number.as_deref(), &cmd.description)?;

            let infos = self.account_infos(cmd.lines.iter().map(|l| l.account_id)).await?;
            let totals =
                LedgerService::validate_lines(scope.entity_id, &cmd.lines, |id| infos.get(&id).copied())?;

            let explicit = cmd.reference_number.map(|r| r.trim().to_string());
            let header = NewEntry {
                client_id: scope.client_id,
                entity_id: scope.entity_id,
                entry_date: cmd.entry_date,
                reference_number: explicit.clone().unwrap_or_default(),
                description: cmd.description.trim().to_string(),
                created_by: actor.user_id,
            };
            let draft = JournalEntry::draft(header, cmd.lines, Utc::now());

            let entry = match explicit {
                Some(reference) => {
                    if self.store.reference_exists(scope.entity_id, &reference).await? {
                        return Err(LedgerError::DuplicateReference(reference).into());
                    }
                    self.store.insert_entry(&draft).await?;
                    draft
                }
                None => self.write_with_generated_reference(draft).await?,
            };

            info!(
                entry_id = %entry.id,
                reference = %entry.reference_number,
                total = %totals.total_debit,
                "Journal entry created"
            );
            self.record(
                actor,
                scope.client_id,
                Some(scope.entity_id),
                AuditAction::EntryCreated,
                Some(entry.id.into_inner()),
                serde_json::json!({
                    "reference_number": entry.reference_number,
                    "total_debit": totals.total_debit,
                    "total_credit": totals.total_credit,
                    "lines": entry.lines.len(),
                }),
            )
            .await;

            Ok(entry)
        })
        .await
    }

    /// Returns an entry with its lines.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if it is missing or outside the scope.
    pub async fn get_entry(
        &self,
        actor: &Actor,
        scope: EntityScope,
        entry_id: JournalEntryId,
    ) -> Result<JournalEntry, EngineError> {
        self.guarded(actor, scope.client_id, Some(scope.entity_id), Operation::Read, None, async move {
            self.load_entry(scope, entry_id).await
        })
        .await
    }

    /// Lists entries newest first.
    ///
    /// The filter's client and entity are replaced by the scope's.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` or a storage error.
    pub async fn list_entries(
        &self,
        actor: &Actor,
        scope: EntityScope,
        mut filter: EntryFilter,
        page: PageRequest,
    ) -> Result<PageResponse<JournalEntry>, EngineError> {
        self.guarded(actor, scope.client_id, Some(scope.entity_id), Operation::Read, None, async move {
            self.require_entity(scope).await?;
            filter.client_id = scope.client_id;
            filter.entity_id = scope.entity_id;
            let (entries, total) = self.store.list_entries(&filter, page).await?;
            Ok(PageResponse::new(entries, page, total))
        })
        .await
    }

    /// Edits a draft's header and optionally replaces all of its lines.
    ///
    /// A replacement line set must balance.
    ///
    /// # Errors
    ///
    /// Returns `NotEditable` outside `draft`, a line validation error, or
    /// `DuplicateReference`.
    #[instrument(skip_all, fields(entity_id = %scope.entity_id, entry_id = %entry_id))]
    pub async fn update_entry(
        &self,
        actor: &Actor,
        scope: EntityScope,
        entry_id: JournalEntryId,
        cmd: UpdateEntry,
    ) -> Result<JournalEntry, EngineError> {
        self.guarded(
            actor,
            scope.client_id,
            Some(scope.entity_id),
            Operation::EditEntry,
            Some(entry_id.into_inner()),
            async move {
                cmd.validate()?;
                let mut entry = self.load_entry(scope, entry_id).await?;
                WorkflowService::validate_can_modify(entry.status)?;

                let description = cmd.description.as_deref().unwrap_or(&entry.description);
                LedgerService::validate_header(cmd.reference_number.as_deref(), description)?;

                if let Some(reference) = cmd.reference_number.map(|r| r.trim().to_string())
                    && reference != entry.reference_number
                {
                    if self.store.reference_exists(scope.entity_id, &reference).await? {
                        return Err(LedgerError::DuplicateReference(reference).into());
                    }
                    entry.reference_number = reference;
                }
                if let Some(description) = cmd.description {
                    entry.description = description.trim().to_string();
                }
                if let Some(entry_date) = cmd.entry_date {
                    entry.entry_date = entry_date;
                }
                let replaced = cmd.lines.is_some();
                if let Some(lines) = cmd.lines {
                    let infos = self.account_infos(lines.iter().map(|l| l.account_id)).await?;
                    LedgerService::validate_lines(scope.entity_id, &lines, |id| infos.get(&id).copied())?;
                    entry.lines = JournalEntry::materialize_lines(entry.id, lines);
                }
                entry.updated_at = Utc::now();

                self.store.replace_entry(&entry, EntryStatus::Draft).await?;

                info!(reference = %entry.reference_number, replaced_lines = replaced, "Journal entry updated");
                self.record(
                    actor,
                    scope.client_id,
                    Some(scope.entity_id),
                    AuditAction::EntryUpdated,
                    Some(entry.id.into_inner()),
                    serde_json::json!({ "replaced_lines": replaced }),
                )
                .await;

                Ok(entry)
            },
        )
        .await
    }

    /// Hard-deletes a draft.
    ///
    /// # Errors
    ///
    /// Returns `CanOnlyDeleteDraft` outside `draft` or `EntryNotFound`.
    #[instrument(skip_all, fields(entity_id = %scope.entity_id, entry_id = %entry_id))]
    pub async fn delete_entry(
        &self,
        actor: &Actor,
        scope: EntityScope,
        entry_id: JournalEntryId,
    ) -> Result<(), EngineError> {
        self.guarded(
            actor,
            scope.client_id,
            Some(scope.entity_id),
            Operation::DeleteEntry,
            Some(entry_id.into_inner()),
            async move {
                let entry = self.load_entry(scope, entry_id).await?;
                WorkflowService::validate_can_delete(entry.status)?;
                self.store.delete_entry(entry_id, EntryStatus::Draft).await?;

                info!(reference = %entry.reference_number, "Journal entry deleted");
                self.record(
                    actor,
                    scope.client_id,
                    Some(scope.entity_id),
                    AuditAction::EntryDeleted,
                    Some(entry_id.into_inner()),
                    serde_json::json!({ "reference_number": entry.reference_number }),
                )
                .await;
                Ok(())
            },
        )
        .await
    }

    /// Appends a line to a draft and reports the resulting totals.
    ///
    /// # Errors
    ///
    /// Returns `NotEditable`, `InvalidAmount`, or an account error.
    pub async fn add_line(
        &self,
        actor: &Actor,
        scope: EntityScope,
        entry_id: JournalEntryId,
        line: LineInput,
    ) -> Result<LineEdit, EngineError> {
        self.edit_lines(actor, scope, entry_id, move |entry| {
            let index = entry.lines.len();
            entry.lines.push(JournalLine::from_input(entry.id, 0, line));
            entry.renumber_lines();
            Ok(Some(index))
        })
        .await
    }

    /// Replaces one line of a draft and reports the resulting totals.
    ///
    /// # Errors
    ///
    /// Returns `NotEditable`, `LineNotFound`, `InvalidAmount`, or an account error.
    pub async fn update_line(
        &self,
        actor: &Actor,
        scope: EntityScope,
        entry_id: JournalEntryId,
        line_id: JournalLineId,
        line: LineInput,
    ) -> Result<LineEdit, EngineError> {
        self.edit_lines(actor, scope, entry_id, move |entry| {
            let index = entry
                .lines
                .iter()
                .position(|l| l.id == line_id)
                .ok_or(LedgerError::LineNotFound(line_id))?;
            let position = entry.lines[index].position;
            let mut replacement = JournalLine::from_input(entry.id, position, line);
            replacement.id = line_id;
            entry.lines[index] = replacement;
            Ok(Some(index))
        })
        .await
    }

    /// Removes one line of a draft and reports the resulting totals.
    ///
    /// # Errors
    ///
    /// Returns `NotEditable`, `LineNotFound`, or `LastLineRemoval`.
    pub async fn remove_line(
        &self,
        actor: &Actor,
        scope: EntityScope,
        entry_id: JournalEntryId,
        line_id: JournalLineId,
    ) -> Result<LineEdit, EngineError> {
        self.edit_lines(actor, scope, entry_id, move |entry| {
            let index = entry
                .lines
                .iter()
                .position(|l| l.id == line_id)
                .ok_or(LedgerError::LineNotFound(line_id))?;
            LedgerService::validate_line_removal(entry.lines.len())?;
            entry.lines.remove(index);
            entry.renumber_lines();
            Ok(None)
        })
        .await
    }

    /// Whether attachments may still be added to or removed from the entry.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound`.
    pub async fn attachments_mutable(
        &self,
        actor: &Actor,
        scope: EntityScope,
        entry_id: JournalEntryId,
    ) -> Result<bool, EngineError> {
        let entry = self.get_entry(actor, scope, entry_id).await?;
        Ok(entry.status.allows_attachment_changes())
    }

    /// Applies `edit` to a draft's lines, validates the touched line, and
    /// persists the whole entry.
    ///
    /// `edit` returns the index of a line to validate, if any.
    async fn edit_lines<F>(
        &self,
        actor: &Actor,
        scope: EntityScope,
        entry_id: JournalEntryId,
        edit: F,
    ) -> Result<LineEdit, EngineError>
    where
        F: FnOnce(&mut JournalEntry) -> Result<Option<usize>, LedgerError>,
    {
        self.guarded(
            actor,
            scope.client_id,
            Some(scope.entity_id),
            Operation::EditEntry,
            Some(entry_id.into_inner()),
            async move {
                let mut entry = self.load_entry(scope, entry_id).await?;
                WorkflowService::validate_can_modify(entry.status)?;

                if let Some(index) = edit(&mut entry)? {
                    let input = entry.lines[index].to_input();
                    let infos = self.account_infos([input.account_id]).await?;
                    LedgerService::validate_line(scope.entity_id, index, &input, |id| {
                        infos.get(&id).copied()
                    })?;
                }
                let balance = LedgerService::totals_after_edit(&entry.line_inputs())?;
                entry.updated_at = Utc::now();

                self.store.replace_entry(&entry, EntryStatus::Draft).await?;

                info!(
                    entry_id = %entry.id,
                    lines = entry.lines.len(),
                    balanced = balance.balanced,
                    "Journal entry lines edited"
                );
                self.record(
                    actor,
                    scope.client_id,
                    Some(scope.entity_id),
                    AuditAction::EntryUpdated,
                    Some(entry.id.into_inner()),
                    serde_json::json!({
                        "lines": entry.lines.len(),
                        "balanced": balance.balanced,
                        "total_debit": balance.totals.total_debit,
                        "total_credit": balance.totals.total_credit,
                    }),
                )
                .await;

                Ok(LineEdit { entry, balance })
            },
        )
        .await
    }
}
