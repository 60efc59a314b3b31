//! Batch import of entries.

use std::collections::HashMap;

use chrono::Utc;
use garde::Validate;
use tally_shared::types::AccountId;
use tracing::{info, instrument, warn};

use super::{DraftWrite, EngineError, LedgerEngine};
use crate::batch::{
    BatchError, BatchImportResult, BatchNormalizer, BatchRow, CreatedRow, NormalizedRow, RowFailure,
};
use crate::error::ErrorKind;
use crate::ledger::{AccountInfo, EntityScope, JournalEntry, LedgerService, NewEntry};
use crate::store::{AuditAction, AuditSink, LedgerStore};
use crate::workflow::{Actor, Operation};

impl<S: LedgerStore, A: AuditSink> LedgerEngine<S, A> {
    /// Imports rows as draft entries, each row on its own.
    ///
    /// A failing row is reported at its index and does not affect the
    /// others. Taken references are suffixed rather than rejected. Rows are
    /// normalized in parallel above the configured threshold and written in
    /// input order.
    ///
    /// # Errors
    ///
    /// Returns `EmptyBatch` for no rows, `EntityNotFound`, or
    /// `InsufficientRole`. Row problems are reported in the result.
    #[instrument(skip_all, fields(entity_id = %scope.entity_id, rows = rows.len()))]
    pub async fn create_batch(
        &self,
        actor: &Actor,
        scope: EntityScope,
        rows: Vec<BatchRow>,
    ) -> Result<BatchImportResult, EngineError> {
        self.guarded(actor, scope.client_id, Some(scope.entity_id), Operation::ImportBatch, None, async move {
            if rows.is_empty() {
                return Err(BatchError::EmptyBatch.into());
            }
            self.require_entity(scope).await?;

            let chart: HashMap<AccountId, AccountInfo> = self
                .store
                .list_accounts(scope.entity_id)
                .await?
                .iter()
                .map(|a| (a.id, AccountInfo::from(a)))
                .collect();

            let normalizer = BatchNormalizer::new(
                self.config.ambiguous_line_policy,
                self.config.parallel_batch_threshold,
            );
            let normalized = normalizer.normalize_all(&rows);

            let mut result = BatchImportResult::default();
            for (row_index, (row, outcome)) in rows.iter().zip(normalized).enumerate() {
                let outcome = match row.validate() {
                    Err(report) => Err(RowFailure {
                        row_index,
                        kind: ErrorKind::Validation,
                        code: "INVALID_COMMAND",
                        message: report.to_string(),
                    }),
                    Ok(()) => match outcome {
                        Err(err) => Err(RowFailure {
                            row_index,
                            kind: err.kind(),
                            code: err.error_code(),
                            message: err.to_string(),
                        }),
                        Ok(normalized) => self.import_row(actor, scope, &chart, normalized, &mut result).await,
                    },
                };

                match outcome {
                    Ok(created) => {
                        result.success_count += 1;
                        result.created.push(created);
                    }
                    Err(failure) => {
                        warn!(row_index, code = failure.code, "Batch row failed: {}", failure.message);
                        result.failures.push(failure);
                    }
                }
            }

            info!(
                succeeded = result.success_count,
                failed = result.failures.len(),
                warnings = result.warnings.len(),
                "Batch import finished"
            );
            self.record(
                actor,
                scope.client_id,
                Some(scope.entity_id),
                AuditAction::BatchImported,
                None,
                serde_json::json!({
                    "rows": rows.len(),
                    "succeeded": result.success_count,
                    "failed": result.failures.len(),
                    "warnings": result.warnings.len(),
                }),
            )
            .await;

            Ok(result)
        })
        .await
    }

    /// Validates accounts and writes one normalized row.
    async fn import_row(
        &self,
        actor: &Actor,
        scope: EntityScope,
        chart: &HashMap<AccountId, AccountInfo>,
        row: NormalizedRow,
        result: &mut BatchImportResult,
    ) -> Result<CreatedRow, RowFailure> {
        let row_index = row.row_index;
        let failure = |err: EngineError| RowFailure {
            row_index,
            kind: err.kind(),
            code: err.error_code(),
            message: err.to_string(),
        };

        LedgerService::validate_accounts(scope.entity_id, &row.lines, &|id| chart.get(&id).copied())
            .map_err(|e| failure(e.into()))?;

        let header = NewEntry {
            client_id: scope.client_id,
            entity_id: scope.entity_id,
            entry_date: row.entry_date,
            reference_number: String::new(),
            description: row.description.trim().to_string(),
            created_by: actor.user_id,
        };
        let draft = JournalEntry::draft(header, row.lines, Utc::now());

        let requested = row.reference.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        let entry = match requested {
            Some(base) => self.write_with_unique_reference(draft, &base, DraftWrite::Entry).await,
            None => self.write_with_generated_reference(draft).await,
        }
        .map_err(failure)?;

        result.warnings.extend(row.warnings);
        Ok(CreatedRow {
            row_index,
            entry_id: entry.id,
            reference_number: entry.reference_number,
        })
    }
}
