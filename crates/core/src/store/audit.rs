//! Audit events and the sinks that receive them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_shared::types::{AuditEventId, ClientId, EntityId, UserId};
use tokio::sync::Mutex;
use uuid::Uuid;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Entity registered.
    EntityRegistered,
    /// Account created.
    AccountCreated,
    /// Account updated.
    AccountUpdated,
    /// Draft entry created.
    EntryCreated,
    /// Draft header or lines changed.
    EntryUpdated,
    /// Draft deleted.
    EntryDeleted,
    /// Draft → pending approval.
    ApprovalRequested,
    /// Pending → approved.
    EntryApproved,
    /// Pending → rejected.
    EntryRejected,
    /// Approved → posted.
    EntryPosted,
    /// Posted → voided.
    EntryVoided,
    /// Reversing draft created.
    EntryReversed,
    /// Rejected entry copied into a new draft.
    EntryResubmitted,
    /// Batch import finished.
    BatchImported,
    /// Consolidation group created.
    GroupCreated,
    /// Entity added to a consolidation group.
    GroupEntityAdded,
    /// Entity removed from a consolidation group.
    GroupEntityRemoved,
    /// An operation was refused (role, state machine, or mutability).
    OperationDenied,
}

impl AuditAction {
    /// Returns the action name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EntityRegistered => "entity_registered",
            Self::AccountCreated => "account_created",
            Self::AccountUpdated => "account_updated",
            Self::EntryCreated => "entry_created",
            Self::EntryUpdated => "entry_updated",
            Self::EntryDeleted => "entry_deleted",
            Self::ApprovalRequested => "approval_requested",
            Self::EntryApproved => "entry_approved",
            Self::EntryRejected => "entry_rejected",
            Self::EntryPosted => "entry_posted",
            Self::EntryVoided => "entry_voided",
            Self::EntryReversed => "entry_reversed",
            Self::EntryResubmitted => "entry_resubmitted",
            Self::BatchImported => "batch_imported",
            Self::GroupCreated => "group_created",
            Self::GroupEntityAdded => "group_entity_added",
            Self::GroupEntityRemoved => "group_entity_removed",
            Self::OperationDenied => "operation_denied",
        }
    }

    /// Parses an action name.
    pub fn parse(s: &str) -> Option<Self> {
        [
            Self::EntityRegistered,
            Self::AccountCreated,
            Self::AccountUpdated,
            Self::EntryCreated,
            Self::EntryUpdated,
            Self::EntryDeleted,
            Self::ApprovalRequested,
            Self::EntryApproved,
            Self::EntryRejected,
            Self::EntryPosted,
            Self::EntryVoided,
            Self::EntryReversed,
            Self::EntryResubmitted,
            Self::BatchImported,
            Self::GroupCreated,
            Self::GroupEntityAdded,
            Self::GroupEntityRemoved,
            Self::OperationDenied,
        ]
        .into_iter()
        .find(|a| a.as_str() == s)
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single audit log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event ID.
    pub id: AuditEventId,
    /// Client the event belongs to.
    pub client_id: ClientId,
    /// Entity, when the event is entity-scoped.
    pub entity_id: Option<EntityId>,
    /// Acting user.
    pub actor_id: UserId,
    /// What happened.
    pub action: AuditAction,
    /// Affected record (entry, account, group, ...).
    pub target_id: Option<Uuid>,
    /// Structured detail payload.
    pub detail: serde_json::Value,
    /// When it happened.
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Creates an event stamped now.
    #[must_use]
    pub fn new(
        client_id: ClientId,
        entity_id: Option<EntityId>,
        actor_id: UserId,
        action: AuditAction,
        target_id: Option<Uuid>,
        detail: serde_json::Value,
    ) -> Self {
        Self {
            id: AuditEventId::new(),
            client_id,
            entity_id,
            actor_id,
            action,
            target_id,
            detail,
            occurred_at: Utc::now(),
        }
    }
}

/// Receives audit events. Fire-and-forget: sinks swallow and log their own failures.
pub trait AuditSink: Send + Sync {
    /// Records one event.
    fn record(&self, event: AuditEvent) -> impl std::future::Future<Output = ()> + Send;
}

/// Writes audit events as structured `tracing` events on the `tally::audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) {
        tracing::info!(
            target: "tally::audit",
            event_id = %event.id,
            client_id = %event.client_id,
            entity_id = ?event.entity_id.map(|e| e.to_string()),
            actor_id = %event.actor_id,
            action = event.action.as_str(),
            target_id = ?event.target_id,
            detail = %event.detail,
            "audit"
        );
    }
}

/// Keeps audit events in memory, for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of recorded events in arrival order.
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().await.clone()
    }

    /// Returns recorded events with the given action.
    pub async fn events_with(&self, action: AuditAction) -> Vec<AuditEvent> {
        self.events
            .lock()
            .await
            .iter()
            .filter(|e| e.action == action)
            .cloned()
            .collect()
    }
}

impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: AuditEvent) {
        self.events.lock().await.push(event);
    }
}
