//! Engine error type: every component error rolled into one.

use tally_shared::AppError;
use thiserror::Error;

use crate::batch::BatchError;
use crate::consolidation::ConsolidationError;
use crate::error::ErrorKind;
use crate::ledger::LedgerError;
use crate::reports::ReportError;
use crate::store::StoreError;
use crate::workflow::WorkflowError;

/// Errors returned by `LedgerEngine` operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Balance, account, or header rule.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Lifecycle, mutability, or role rule.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Structurally invalid batch.
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// Report parameters.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Consolidation group rule.
    #[error(transparent)]
    Consolidation(#[from] ConsolidationError),

    /// Storage failure or missing dependent row.
    #[error(transparent)]
    Store(StoreError),

    /// Command failed boundary validation.
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

impl From<StoreError> for EngineError {
    /// Store conflicts surface as the domain errors callers already handle.
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateReference { reference, .. } => {
                Self::Ledger(LedgerError::DuplicateReference(reference))
            }
            StoreError::DuplicateAccountCode { code, .. } => {
                Self::Ledger(LedgerError::DuplicateAccountCode(code))
            }
            StoreError::StatusConflict {
                expected, actual, ..
            } => Self::Workflow(WorkflowError::ConcurrentTransition { expected, actual }),
            StoreError::AlreadyReversed {
                entry_id,
                reversed_by,
            } => Self::Workflow(WorkflowError::AlreadyReversed {
                entry_id,
                reversed_by,
            }),
            other @ (StoreError::NotFound { .. } | StoreError::Unavailable(_)) => Self::Store(other),
        }
    }
}

impl From<garde::Report> for EngineError {
    fn from(report: garde::Report) -> Self {
        Self::InvalidCommand(report.to_string())
    }
}

impl EngineError {
    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Ledger(e) => e.kind(),
            Self::Workflow(e) => e.kind(),
            Self::Batch(e) => e.kind(),
            Self::Report(e) => e.kind(),
            Self::Consolidation(e) => e.kind(),
            Self::Store(e) => e.kind(),
            Self::InvalidCommand(_) => ErrorKind::Validation,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.error_code(),
            Self::Workflow(e) => e.error_code(),
            Self::Batch(e) => e.error_code(),
            Self::Report(e) => e.error_code(),
            Self::Consolidation(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::InvalidCommand(_) => "INVALID_COMMAND",
        }
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        self.kind().http_status_code()
    }

    /// Returns true for role denials and lifecycle violations, which are audited.
    #[must_use]
    pub const fn is_denial(&self) -> bool {
        match self {
            Self::Workflow(e) => !matches!(e.kind(), ErrorKind::Validation),
            _ => false,
        }
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        err.kind().into_app_error(err.to_string())
    }
}
