//! Actor roles and the minimum role each ledger operation requires.

use serde::{Deserialize, Serialize};
use std::fmt;
use tally_shared::types::UserId;

use crate::workflow::error::WorkflowError;

/// Actor role within a client.
///
/// Roles are ordered from lowest to highest privilege.
/// Higher roles can perform all actions of lower roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    /// Can only read entries and reports.
    Viewer = 0,
    /// Can create, edit, and submit entries.
    Submitter = 1,
    /// Can approve or reject pending entries.
    Approver = 2,
    /// Can post, void, and reverse entries.
    Accountant = 3,
    /// Can also manage entities, accounts, and consolidation groups.
    Admin = 4,
}

impl ActorRole {
    /// Parse a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "viewer" => Some(Self::Viewer),
            "submitter" => Some(Self::Submitter),
            "approver" => Some(Self::Approver),
            "accountant" => Some(Self::Accountant),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Submitter => "submitter",
            Self::Approver => "approver",
            Self::Accountant => "accountant",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The user performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Acting user.
    pub user_id: UserId,
    /// Role within the client.
    pub role: ActorRole,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub const fn new(user_id: UserId, role: ActorRole) -> Self {
        Self { user_id, role }
    }
}

/// Ledger operations subject to role checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Read entries, accounts, or reports.
    Read,
    /// Create a draft entry.
    CreateEntry,
    /// Edit a draft entry or its lines.
    EditEntry,
    /// Delete a draft entry.
    DeleteEntry,
    /// Submit a draft for approval.
    RequestApproval,
    /// Approve a pending entry.
    Approve,
    /// Reject a pending entry.
    Reject,
    /// Post an approved entry.
    Post,
    /// Void a posted entry.
    Void,
    /// Create a reversing entry.
    Reverse,
    /// Copy a rejected entry into a new draft.
    Resubmit,
    /// Bulk import entries.
    ImportBatch,
    /// Register entities and manage the chart of accounts.
    ManageChart,
    /// Manage consolidation groups.
    ManageConsolidation,
}

impl Operation {
    /// Returns the operation as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::CreateEntry => "create_entry",
            Self::EditEntry => "edit_entry",
            Self::DeleteEntry => "delete_entry",
            Self::RequestApproval => "request_approval",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Post => "post",
            Self::Void => "void",
            Self::Reverse => "reverse",
            Self::Resubmit => "resubmit",
            Self::ImportBatch => "import_batch",
            Self::ManageChart => "manage_chart",
            Self::ManageConsolidation => "manage_consolidation",
        }
    }

    /// Returns the minimum role for this operation.
    #[must_use]
    pub const fn required_role(&self) -> ActorRole {
        match self {
            Self::Read => ActorRole::Viewer,
            Self::CreateEntry
            | Self::EditEntry
            | Self::DeleteEntry
            | Self::RequestApproval
            | Self::Resubmit
            | Self::ImportBatch => ActorRole::Submitter,
            Self::Approve | Self::Reject => ActorRole::Approver,
            Self::Post | Self::Void | Self::Reverse => ActorRole::Accountant,
            Self::ManageChart | Self::ManageConsolidation => ActorRole::Admin,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stateless role checks.
pub struct AccessPolicy;

impl AccessPolicy {
    /// Checks that `actor` may perform `operation`.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InsufficientRole` if the role is too low.
    pub fn authorize(actor: &Actor, operation: Operation) -> Result<(), WorkflowError> {
        let required = operation.required_role();
        if actor.role >= required {
            Ok(())
        } else {
            Err(WorkflowError::InsufficientRole {
                role: actor.role,
                required,
                operation,
            })
        }
    }
}
