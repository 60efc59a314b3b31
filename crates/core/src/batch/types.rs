//! Batch import wire format and results.

use chrono::NaiveDate;
use garde::Validate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, JournalEntryId};

use crate::error::ErrorKind;
use crate::ledger::{EntrySide, LineInput};

/// One imported line in the dual debit/credit column format.
///
/// Exactly one column is expected to hold a positive amount. Blank
/// columns read as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct BatchLineInput {
    /// Account to post to.
    #[garde(skip)]
    pub account_id: AccountId,
    /// Debit column.
    #[garde(length(max = 40))]
    #[serde(default)]
    pub debit: String,
    /// Credit column.
    #[garde(length(max = 40))]
    #[serde(default)]
    pub credit: String,
    /// Line memo.
    #[garde(length(max = 500))]
    pub description: Option<String>,
    /// Dimension tags.
    #[garde(inner(length(min = 1, max = 100)))]
    #[serde(default)]
    pub dimensions: Vec<String>,
}

impl BatchLineInput {
    /// Creates a line with the given raw columns.
    #[must_use]
    pub fn new(account_id: AccountId, debit: impl Into<String>, credit: impl Into<String>) -> Self {
        Self {
            account_id,
            debit: debit.into(),
            credit: credit.into(),
            description: None,
            dimensions: Vec::new(),
        }
    }
}

/// One imported entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct BatchRow {
    /// Effective date.
    #[garde(skip)]
    pub entry_date: NaiveDate,
    /// Requested reference; generated when absent.
    #[garde(length(max = 100))]
    pub reference: Option<String>,
    /// Description.
    #[garde(length(max = 1000))]
    pub description: String,
    /// Lines.
    #[garde(dive)]
    pub lines: Vec<BatchLineInput>,
}

/// A line whose debit and credit columns were both positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchWarning {
    /// Zero-based row index.
    pub row_index: usize,
    /// Zero-based line index within the row.
    pub line_index: usize,
    /// Debit column value.
    pub debit: Decimal,
    /// Credit column value.
    pub credit: Decimal,
    /// Side the line was given.
    pub chosen_side: EntrySide,
}

impl BatchWarning {
    /// Human-readable description.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "Row {} line {}: both debit ({}) and credit ({}) set, recorded as {} {}",
            self.row_index,
            self.line_index,
            self.debit,
            self.credit,
            self.chosen_side,
            self.debit.max(self.credit)
        )
    }
}

/// A row after amount parsing and side normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow {
    /// Zero-based row index.
    pub row_index: usize,
    /// Effective date.
    pub entry_date: NaiveDate,
    /// Requested reference.
    pub reference: Option<String>,
    /// Description.
    pub description: String,
    /// Lines in single-side form.
    pub lines: Vec<LineInput>,
    /// Disambiguation warnings.
    pub warnings: Vec<BatchWarning>,
}

/// A row that could not be imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    /// Zero-based row index.
    pub row_index: usize,
    /// Error category.
    pub kind: ErrorKind,
    /// Error code.
    pub code: &'static str,
    /// Error message.
    pub message: String,
}

/// A row that produced an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedRow {
    /// Zero-based row index.
    pub row_index: usize,
    /// The new draft.
    pub entry_id: JournalEntryId,
    /// Reference actually stored, after collision resolution.
    pub reference_number: String,
}

/// Outcome of a batch import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchImportResult {
    /// Number of rows imported.
    pub success_count: usize,
    /// Failed rows in input order.
    pub failures: Vec<RowFailure>,
    /// Created entries in input order.
    pub created: Vec<CreatedRow>,
    /// Disambiguated lines in input order.
    pub warnings: Vec<BatchWarning>,
}
