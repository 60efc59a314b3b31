//! Audit log persisted to the `audit_events` table.

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use tally_core::store::{AuditAction, AuditEvent, AuditSink, StoreError};
use tally_shared::types::{AuditEventId, ClientId, EntityId, UserId};
use tracing::error;

use crate::entities::audit_events;
use crate::store::convert::{timestamp, utc};
use crate::store::error::{corrupt, storage};

/// Audit sink that inserts one row per event.
///
/// Insert failures are logged and dropped; the operation that produced the
/// event has already committed.
#[derive(Debug, Clone)]
pub struct DbAuditSink {
    db: DatabaseConnection,
}

impl DbAuditSink {
    /// Creates a sink over `db`.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns a client's most recent events, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` on database failure or an
    /// unrecognised stored action.
    pub async fn recent(&self, client_id: ClientId, limit: u64) -> Result<Vec<AuditEvent>, StoreError> {
        audit_events::Entity::find()
            .filter(audit_events::Column::ClientId.eq(client_id.into_inner()))
            .order_by_desc(audit_events::Column::OccurredAt)
            .order_by_desc(audit_events::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(storage)?
            .into_iter()
            .map(event_from_row)
            .collect()
    }
}

fn event_from_row(row: audit_events::Model) -> Result<AuditEvent, StoreError> {
    let action = AuditAction::parse(&row.action)
        .ok_or_else(|| corrupt("audit_events", format!("unknown action {}", row.action)))?;
    Ok(AuditEvent {
        id: AuditEventId::from_uuid(row.id),
        client_id: ClientId::from_uuid(row.client_id),
        entity_id: row.entity_id.map(EntityId::from_uuid),
        actor_id: UserId::from_uuid(row.actor_id),
        action,
        target_id: row.target_id,
        detail: row.detail,
        occurred_at: utc(row.occurred_at),
    })
}

impl AuditSink for DbAuditSink {
    async fn record(&self, event: AuditEvent) {
        let model = audit_events::ActiveModel {
            id: Set(event.id.into_inner()),
            client_id: Set(event.client_id.into_inner()),
            entity_id: Set(event.entity_id.map(EntityId::into_inner)),
            actor_id: Set(event.actor_id.into_inner()),
            action: Set(event.action.as_str().to_string()),
            target_id: Set(event.target_id),
            detail: Set(event.detail),
            occurred_at: Set(timestamp(event.occurred_at)),
        };
        if let Err(err) = audit_events::Entity::insert(model).exec_without_returning(&self.db).await {
            error!(
                error = %err,
                event_id = %event.id,
                action = event.action.as_str(),
                "Failed to persist audit event"
            );
        }
    }
}
