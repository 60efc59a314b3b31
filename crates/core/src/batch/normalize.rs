//! Row normalization: dual-column amounts to single-side lines.
//!
//! Normalization is pure and rows are independent, so large batches are
//! normalized on the rayon pool. Results keep input order.

use rayon::prelude::*;
use rust_decimal::Decimal;
use tally_shared::config::AmbiguousLinePolicy;
use tally_shared::types::parse_amount;

use super::error::BatchRowError;
use super::types::{BatchLineInput, BatchRow, BatchWarning, NormalizedRow};
use crate::ledger::{EntrySide, LedgerService, LineInput, require_balanced};

/// Converts imported rows into validated single-side line sets.
#[derive(Debug, Clone, Copy)]
pub struct BatchNormalizer {
    policy: AmbiguousLinePolicy,
    parallel_threshold: usize,
}

impl BatchNormalizer {
    /// Creates a normalizer.
    ///
    /// Batches with more than `parallel_threshold` rows are normalized in parallel.
    #[must_use]
    pub const fn new(policy: AmbiguousLinePolicy, parallel_threshold: usize) -> Self {
        Self {
            policy,
            parallel_threshold,
        }
    }

    /// Normalizes every row, in input order.
    #[must_use]
    pub fn normalize_all(&self, rows: &[BatchRow]) -> Vec<Result<NormalizedRow, BatchRowError>> {
        if rows.len() > self.parallel_threshold {
            rows.par_iter()
                .enumerate()
                .map(|(row_index, row)| self.normalize_row(row_index, row))
                .collect()
        } else {
            rows.iter()
                .enumerate()
                .map(|(row_index, row)| self.normalize_row(row_index, row))
                .collect()
        }
    }

    /// Normalizes one row: header check, per-line side resolution, balance.
    ///
    /// Account existence is checked later, against the store.
    ///
    /// # Errors
    ///
    /// Returns the first line or balance error in the row.
    pub fn normalize_row(&self, row_index: usize, row: &BatchRow) -> Result<NormalizedRow, BatchRowError> {
        LedgerService::validate_header(row.reference.as_deref(), &row.description)?;

        let mut lines = Vec::with_capacity(row.lines.len());
        let mut warnings = Vec::new();
        for (line_index, raw) in row.lines.iter().enumerate() {
            let (line, warning) = self.normalize_line(row_index, line_index, raw)?;
            lines.push(line);
            warnings.extend(warning);
        }

        require_balanced(&lines)?;

        Ok(NormalizedRow {
            row_index,
            entry_date: row.entry_date,
            reference: row.reference.clone(),
            description: row.description.clone(),
            lines,
            warnings,
        })
    }

    /// Resolves one line's side and amount.
    ///
    /// A negative value in either column fails the line; sides come from
    /// the column, never from the sign.
    ///
    /// # Errors
    ///
    /// Returns `MalformedAmount`, `NoPositiveAmount`, `EqualSides`, or
    /// `AmbiguousLine` under the reject policy.
    pub fn normalize_line(
        &self,
        row_index: usize,
        line_index: usize,
        raw: &BatchLineInput,
    ) -> Result<(LineInput, Option<BatchWarning>), BatchRowError> {
        let parse = |value: &str| {
            parse_amount(value).map_err(|source| BatchRowError::MalformedAmount { line_index, source })
        };
        let debit = parse(&raw.debit)?;
        let credit = parse(&raw.credit)?;

        let (side, amount, warning) = match (debit > Decimal::ZERO, credit > Decimal::ZERO) {
            (true, false) => (EntrySide::Debit, debit, None),
            (false, true) => (EntrySide::Credit, credit, None),
            (false, false) => return Err(BatchRowError::NoPositiveAmount { line_index }),
            (true, true) => {
                if debit == credit {
                    return Err(BatchRowError::EqualSides {
                        line_index,
                        amount: debit,
                    });
                }
                if self.policy == AmbiguousLinePolicy::Reject {
                    return Err(BatchRowError::AmbiguousLine {
                        line_index,
                        debit,
                        credit,
                    });
                }
                let side = if debit > credit {
                    EntrySide::Debit
                } else {
                    EntrySide::Credit
                };
                let warning = BatchWarning {
                    row_index,
                    line_index,
                    debit,
                    credit,
                    chosen_side: side,
                };
                (side, debit.max(credit), Some(warning))
            }
        };

        Ok((
            LineInput {
                account_id: raw.account_id,
                side,
                amount,
                description: raw.description.clone(),
                dimensions: raw.dimensions.clone(),
            },
            warning,
        ))
    }
}
