//! Error taxonomy shared by every ledger component.

use serde::Serialize;
use tally_shared::AppError;

/// Broad category of a failure, as seen by callers of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input failed a rule (unbalanced, malformed amount, blank reason, ...).
    Validation,
    /// Resource missing or outside the caller's client/entity.
    NotFound,
    /// Entry lifecycle state machine violation, including lost races.
    IllegalTransition,
    /// Duplicate reference or code, mutation in a non-mutable state, double reversal.
    Conflict,
    /// Actor role too low for the operation.
    Forbidden,
    /// Backing store failure.
    Storage,
}

impl ErrorKind {
    /// Returns the HTTP status code conventionally used for this kind.
    #[must_use]
    pub const fn http_status_code(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::IllegalTransition => 422,
            Self::Storage => 500,
        }
    }

    /// Wraps a message into the matching application error.
    #[must_use]
    pub fn into_app_error(self, message: String) -> AppError {
        match self {
            Self::Validation => AppError::Validation(message),
            Self::NotFound => AppError::NotFound(message),
            Self::IllegalTransition => AppError::IllegalTransition(message),
            Self::Conflict => AppError::Conflict(message),
            Self::Forbidden => AppError::Forbidden(message),
            Self::Storage => AppError::Storage(message),
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::IllegalTransition => "illegal_transition",
            Self::Conflict => "conflict",
            Self::Forbidden => "forbidden",
            Self::Storage => "storage",
        };
        f.write_str(name)
    }
}
