//! Batch import error types.

use rust_decimal::Decimal;
use tally_shared::types::AmountParseError;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::ledger::LedgerError;

/// Errors that fail a whole batch call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    /// The batch contains no rows.
    #[error("Batch must contain at least one row")]
    EmptyBatch,
}

impl BatchError {
    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        "EMPTY_BATCH"
    }
}

/// Errors that fail a single row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchRowError {
    /// A column is not a number.
    #[error("Line {line_index}: {source}")]
    MalformedAmount {
        /// Zero-based line index.
        line_index: usize,
        /// Parse failure.
        source: AmountParseError,
    },

    /// Neither column holds a positive amount.
    #[error("Line {line_index}: either debit or credit must be positive")]
    NoPositiveAmount {
        /// Zero-based line index.
        line_index: usize,
    },

    /// Both columns positive and the policy rejects such lines.
    #[error("Line {line_index}: both debit ({debit}) and credit ({credit}) are set")]
    AmbiguousLine {
        /// Zero-based line index.
        line_index: usize,
        /// Debit column value.
        debit: Decimal,
        /// Credit column value.
        credit: Decimal,
    },

    /// Both columns hold the same positive amount.
    #[error("Line {line_index}: debit and credit are both {amount}")]
    EqualSides {
        /// Zero-based line index.
        line_index: usize,
        /// The repeated amount.
        amount: Decimal,
    },

    /// Header or balance rule failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl BatchRowError {
    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Ledger(inner) => inner.kind(),
            _ => ErrorKind::Validation,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedAmount { .. } => "MALFORMED_AMOUNT",
            Self::NoPositiveAmount { .. } => "NO_POSITIVE_AMOUNT",
            Self::AmbiguousLine { .. } => "AMBIGUOUS_LINE",
            Self::EqualSides { .. } => "EQUAL_SIDES",
            Self::Ledger(inner) => inner.error_code(),
        }
    }
}
