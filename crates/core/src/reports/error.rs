//! Report error types.

use tally_shared::types::{AccountId, InvalidDateRange};
use thiserror::Error;

use crate::error::ErrorKind;

/// Errors that can occur during report generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// Account not found in the reported entity.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Invalid date range.
    #[error(transparent)]
    InvalidDateRange(#[from] InvalidDateRange),
}

impl ReportError {
    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AccountNotFound(_) => ErrorKind::NotFound,
            Self::InvalidDateRange(_) => ErrorKind::Validation,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::InvalidDateRange(_) => "INVALID_DATE_RANGE",
        }
    }
}
