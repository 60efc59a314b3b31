//! Reversal Generator: builds a balancing counter-entry for a posted entry.
//!
//! Reversal is distinct from voiding. Voiding marks the original as void and
//! leaves its lines alone; reversal produces a new draft whose lines cancel
//! the original per account once posted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ledger::{JournalEntry, JournalLine, LineInput, ReferenceNumbers};
use crate::workflow::error::WorkflowError;
use crate::workflow::types::EntryStatus;

/// Caller overrides for a reversal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversalOptions {
    /// Effective date of the reversal; today when absent.
    pub entry_date: Option<NaiveDate>,
    /// Reference number; `{prefix}-{original}` when absent.
    pub reference_number: Option<String>,
    /// Description; `Reversal of {ref}: {description}` when absent.
    pub description: Option<String>,
}

/// Header and lines of a reversing draft, before reference uniqueness is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReversalPlan {
    /// Effective date.
    pub entry_date: NaiveDate,
    /// Requested reference number.
    pub reference_number: String,
    /// Description.
    pub description: String,
    /// Mirrored lines.
    pub lines: Vec<LineInput>,
}

/// Stateless service for creating reversing entries.
pub struct ReversalService;

impl ReversalService {
    /// Validates that `entry` can be reversed.
    ///
    /// # Errors
    ///
    /// Returns `ReversalRequiresPosted` or `AlreadyReversed`.
    pub fn validate_source(entry: &JournalEntry) -> Result<(), WorkflowError> {
        if entry.status != EntryStatus::Posted {
            return Err(WorkflowError::ReversalRequiresPosted {
                status: entry.status,
            });
        }
        if let Some(reversed_by) = entry.reversed_by {
            return Err(WorkflowError::AlreadyReversed {
                entry_id: entry.id,
                reversed_by,
            });
        }
        Ok(())
    }

    /// Swaps the side of every line; accounts, amounts, memos, and tags are kept.
    #[must_use]
    pub fn reversing_lines(lines: &[JournalLine]) -> Vec<LineInput> {
        lines
            .iter()
            .map(|line| LineInput {
                account_id: line.account_id,
                side: line.side.opposite(),
                amount: line.amount,
                description: line.description.clone(),
                dimensions: line.dimensions.clone(),
            })
            .collect()
    }

    /// Default reversal reference for `original`.
    #[must_use]
    pub fn reversal_reference(prefix: &str, original: &str) -> String {
        ReferenceNumbers::fitted(&format!("{prefix}-"), original, "")
    }

    /// Default reversal description.
    #[must_use]
    pub fn reversal_description(original_reference: &str, original_description: &str) -> String {
        format!("Reversal of {original_reference}: {original_description}")
    }

    /// Validates `entry` and builds the reversing draft's contents.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::validate_source`].
    pub fn plan(
        entry: &JournalEntry,
        reference_prefix: &str,
        options: ReversalOptions,
        today: NaiveDate,
    ) -> Result<ReversalPlan, WorkflowError> {
        Self::validate_source(entry)?;

        Ok(ReversalPlan {
            entry_date: options.entry_date.unwrap_or(today),
            reference_number: options
                .reference_number
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| {
                    Self::reversal_reference(reference_prefix, &entry.reference_number)
                }),
            description: options
                .description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| {
                    Self::reversal_description(&entry.reference_number, &entry.description)
                }),
            lines: Self::reversing_lines(&entry.lines),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tally_shared::types::{AccountId, ClientId, EntityId, JournalEntryId, UserId};

    use crate::ledger::{EntrySide, NewEntry};

    fn posted_entry() -> JournalEntry {
        let cash = AccountId::new();
        let ap = AccountId::new();
        let mut entry = JournalEntry::draft(
            NewEntry {
                client_id: ClientId::new(),
                entity_id: EntityId::new(),
                entry_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
                reference_number: "JE-0007".into(),
                description: "Supplier invoice".into(),
                created_by: UserId::new(),
            },
            vec![
                LineInput::debit(cash, dec!(100.00)).with_description("Office supplies"),
                LineInput::credit(ap, dec!(100.00)),
            ],
            Utc::now(),
        );
        entry.lines[0].dimensions = vec!["dept:ops".into()];
        entry.status = EntryStatus::Posted;
        entry
    }

    #[test]
    fn test_reversing_lines_swap_sides() {
        let entry = posted_entry();
        let lines = ReversalService::reversing_lines(&entry.lines);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].side, EntrySide::Credit);
        assert_eq!(lines[0].account_id, entry.lines[0].account_id);
        assert_eq!(lines[0].amount, dec!(100.00));
        assert_eq!(lines[0].description.as_deref(), Some("Office supplies"));
        assert_eq!(lines[0].dimensions, vec!["dept:ops".to_string()]);
        assert_eq!(lines[1].side, EntrySide::Debit);
    }

    #[test]
    fn test_plan_defaults() {
        let entry = posted_entry();
        let today = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let plan = ReversalService::plan(&entry, "REV", ReversalOptions::default(), today).unwrap();

        assert_eq!(plan.entry_date, today);
        assert_eq!(plan.reference_number, "REV-JE-0007");
        assert_eq!(plan.description, "Reversal of JE-0007: Supplier invoice");
    }

    #[test]
    fn test_default_reference_fits_column() {
        let mut entry = posted_entry();
        entry.reference_number = "X".repeat(crate::ledger::MAX_REFERENCE_LEN);
        let today = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let plan = ReversalService::plan(&entry, "REV", ReversalOptions::default(), today).unwrap();

        assert_eq!(plan.reference_number.chars().count(), crate::ledger::MAX_REFERENCE_LEN);
        assert!(plan.reference_number.starts_with("REV-XXX"));
    }

    #[test]
    fn test_plan_overrides() {
        let entry = posted_entry();
        let date = NaiveDate::from_ymd_opt(2026, 2, 28).unwrap();
        let plan = ReversalService::plan(
            &entry,
            "REV",
            ReversalOptions {
                entry_date: Some(date),
                reference_number: Some("ADJ-1".into()),
                description: Some("Month-end accrual reversal".into()),
            },
            NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
        )
        .unwrap();

        assert_eq!(plan.entry_date, date);
        assert_eq!(plan.reference_number, "ADJ-1");
        assert_eq!(plan.description, "Month-end accrual reversal");
    }

    #[test]
    fn test_non_posted_source_rejected() {
        let mut entry = posted_entry();
        entry.status = EntryStatus::Approved;
        assert_eq!(
            ReversalService::validate_source(&entry).unwrap_err(),
            WorkflowError::ReversalRequiresPosted {
                status: EntryStatus::Approved
            }
        );
    }

    #[test]
    fn test_second_reversal_rejected() {
        let mut entry = posted_entry();
        let existing = JournalEntryId::new();
        entry.reversed_by = Some(existing);
        assert_eq!(
            ReversalService::validate_source(&entry).unwrap_err(),
            WorkflowError::AlreadyReversed {
                entry_id: entry.id,
                reversed_by: existing,
            }
        );
    }
}
