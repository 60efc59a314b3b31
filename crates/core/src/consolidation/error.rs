//! Consolidation error types.

use tally_shared::types::{ConsolidationGroupId, EntityId, InvalidDateRange};
use thiserror::Error;

use crate::error::ErrorKind;

/// Errors that can occur during consolidation operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsolidationError {
    /// Group missing or owned by another client.
    #[error("Consolidation group not found: {0}")]
    GroupNotFound(ConsolidationGroupId),

    /// Entity missing or owned by another client.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Entity is already a member.
    #[error("Entity {entity_id} is already a member of group {group_id}")]
    AlreadyMember {
        /// The group.
        group_id: ConsolidationGroupId,
        /// The entity.
        entity_id: EntityId,
    },

    /// Entity is not a member.
    #[error("Entity {entity_id} is not a member of group {group_id}")]
    NotAMember {
        /// The group.
        group_id: ConsolidationGroupId,
        /// The entity.
        entity_id: EntityId,
    },

    /// Group name is blank.
    #[error("Consolidation group name is required")]
    NameRequired,

    /// Reporting period start is after its end.
    #[error(transparent)]
    InvalidPeriod(#[from] InvalidDateRange),
}

impl ConsolidationError {
    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::GroupNotFound(_) | Self::EntityNotFound(_) | Self::NotAMember { .. } => {
                ErrorKind::NotFound
            }
            Self::AlreadyMember { .. } => ErrorKind::Conflict,
            Self::NameRequired | Self::InvalidPeriod(_) => ErrorKind::Validation,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::GroupNotFound(_) => "GROUP_NOT_FOUND",
            Self::EntityNotFound(_) => "ENTITY_NOT_FOUND",
            Self::AlreadyMember { .. } => "ALREADY_MEMBER",
            Self::NotAMember { .. } => "NOT_A_MEMBER",
            Self::NameRequired => "NAME_REQUIRED",
            Self::InvalidPeriod(_) => "INVALID_DATE_RANGE",
        }
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        self.kind().http_status_code()
    }
}
