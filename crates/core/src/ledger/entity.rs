//! Ledger entities: the tenancy unit that owns accounts and entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_shared::types::{ClientId, EntityId};

/// A legal or reporting entity belonging to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntity {
    /// Entity ID.
    pub id: EntityId,
    /// Owning client.
    pub client_id: ClientId,
    /// Display name.
    pub name: String,
    /// Functional currency (ISO 4217).
    pub currency: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Client and entity a request claims to act within.
///
/// Anything stored under a different client or entity is reported as not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityScope {
    /// Client (tenant) ID.
    pub client_id: ClientId,
    /// Entity ID.
    pub entity_id: EntityId,
}

impl EntityScope {
    /// Creates a scope.
    #[must_use]
    pub const fn new(client_id: ClientId, entity_id: EntityId) -> Self {
        Self {
            client_id,
            entity_id,
        }
    }

    /// Returns true if the given owner pair matches this scope.
    #[must_use]
    pub fn owns(&self, client_id: ClientId, entity_id: EntityId) -> bool {
        self.client_id == client_id && self.entity_id == entity_id
    }
}
