//! Consolidation groups and consolidated reports.

use std::collections::BTreeSet;

use chrono::Utc;
use garde::Validate;
use tally_shared::types::{ClientId, ConsolidationGroupId, DateRange, EntityId};
use tracing::{info, instrument};

use super::commands::CreateConsolidationGroup;
use super::{EngineError, LedgerEngine};
use crate::consolidation::{
    ConsolidatedReport, ConsolidatedReportKind, ConsolidationAggregator, ConsolidationError,
    ConsolidationGroup,
};
use crate::store::{ActivityQuery, AuditAction, AuditSink, LedgerStore};
use crate::workflow::{Actor, EntryStatus, Operation};

impl<S: LedgerStore, A: AuditSink> LedgerEngine<S, A> {
    /// Creates a group of the client's entities.
    ///
    /// # Errors
    ///
    /// Returns `NameRequired`, `InvalidPeriod`, or `EntityNotFound` for a
    /// member outside the client.
    #[instrument(skip_all, fields(%client_id))]
    pub async fn create_consolidation_group(
        &self,
        actor: &Actor,
        client_id: ClientId,
        cmd: CreateConsolidationGroup,
    ) -> Result<ConsolidationGroup, EngineError> {
        self.guarded(actor, client_id, None, Operation::ManageConsolidation, None, async move {
            cmd.validate()?;
            let name = cmd.name.trim();
            if name.is_empty() {
                return Err(ConsolidationError::NameRequired.into());
            }
            DateRange::new(cmd.period_start, cmd.period_end).map_err(ConsolidationError::from)?;

            let mut members = BTreeSet::new();
            for entity_id in cmd.members {
                self.client_entity(client_id, entity_id).await?;
                members.insert(entity_id);
            }

            let group = ConsolidationGroup {
                id: ConsolidationGroupId::new(),
                client_id,
                name: name.to_string(),
                currency: cmd.currency.to_uppercase(),
                period_start: cmd.period_start,
                period_end: cmd.period_end,
                members,
                created_at: Utc::now(),
            };
            self.store.insert_group(&group).await?;

            info!(group_id = %group.id, members = group.members.len(), "Consolidation group created");
            self.record(
                actor,
                client_id,
                None,
                AuditAction::GroupCreated,
                Some(group.id.into_inner()),
                serde_json::json!({ "name": group.name, "members": group.members }),
            )
            .await;

            Ok(group)
        })
        .await
    }

    /// Returns a group of the client.
    ///
    /// # Errors
    ///
    /// Returns `GroupNotFound` if it is missing or owned by another client.
    pub async fn get_consolidation_group(
        &self,
        actor: &Actor,
        client_id: ClientId,
        group_id: ConsolidationGroupId,
    ) -> Result<ConsolidationGroup, EngineError> {
        self.guarded(actor, client_id, None, Operation::Read, None, async move {
            self.client_group(client_id, group_id).await
        })
        .await
    }

    /// Lists the client's groups by name.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list_consolidation_groups(
        &self,
        actor: &Actor,
        client_id: ClientId,
    ) -> Result<Vec<ConsolidationGroup>, EngineError> {
        self.guarded(actor, client_id, None, Operation::Read, None, async move {
            Ok(self.store.list_groups(client_id).await?)
        })
        .await
    }

    /// Adds an entity of the same client to a group.
    ///
    /// # Errors
    ///
    /// Returns `GroupNotFound`, `EntityNotFound`, or `AlreadyMember`.
    #[instrument(skip_all, fields(%client_id, %group_id, %entity_id))]
    pub async fn add_entity(
        &self,
        actor: &Actor,
        client_id: ClientId,
        group_id: ConsolidationGroupId,
        entity_id: EntityId,
    ) -> Result<ConsolidationGroup, EngineError> {
        self.guarded(
            actor,
            client_id,
            Some(entity_id),
            Operation::ManageConsolidation,
            Some(group_id.into_inner()),
            async move {
                let mut group = self.client_group(client_id, group_id).await?;
                self.client_entity(client_id, entity_id).await?;

                if !self.store.add_group_member(group_id, entity_id).await? {
                    return Err(ConsolidationError::AlreadyMember { group_id, entity_id }.into());
                }
                group.members.insert(entity_id);

                info!("Entity added to consolidation group");
                self.record(
                    actor,
                    client_id,
                    Some(entity_id),
                    AuditAction::GroupEntityAdded,
                    Some(group_id.into_inner()),
                    serde_json::json!({ "entity_id": entity_id }),
                )
                .await;

                Ok(group)
            },
        )
        .await
    }

    /// Removes an entity from a group.
    ///
    /// # Errors
    ///
    /// Returns `GroupNotFound` or `NotAMember`.
    #[instrument(skip_all, fields(%client_id, %group_id, %entity_id))]
    pub async fn remove_entity(
        &self,
        actor: &Actor,
        client_id: ClientId,
        group_id: ConsolidationGroupId,
        entity_id: EntityId,
    ) -> Result<ConsolidationGroup, EngineError> {
        self.guarded(
            actor,
            client_id,
            Some(entity_id),
            Operation::ManageConsolidation,
            Some(group_id.into_inner()),
            async move {
                let mut group = self.client_group(client_id, group_id).await?;

                if !self.store.remove_group_member(group_id, entity_id).await? {
                    return Err(ConsolidationError::NotAMember { group_id, entity_id }.into());
                }
                group.members.remove(&entity_id);

                info!("Entity removed from consolidation group");
                self.record(
                    actor,
                    client_id,
                    Some(entity_id),
                    AuditAction::GroupEntityRemoved,
                    Some(group_id.into_inner()),
                    serde_json::json!({ "entity_id": entity_id }),
                )
                .await;

                Ok(group)
            },
        )
        .await
    }

    /// Aggregates posted activity of the group's current members.
    ///
    /// `range` defaults to the group's period. Balance sheets read from
    /// inception to the range end.
    ///
    /// # Errors
    ///
    /// Returns `GroupNotFound` or `InvalidPeriod`.
    #[instrument(skip_all, fields(%client_id, %group_id, ?kind))]
    pub async fn generate_consolidated_report(
        &self,
        actor: &Actor,
        client_id: ClientId,
        group_id: ConsolidationGroupId,
        kind: ConsolidatedReportKind,
        range: Option<DateRange>,
    ) -> Result<ConsolidatedReport, EngineError> {
        self.guarded(actor, client_id, None, Operation::Read, None, async move {
            let group = self.client_group(client_id, group_id).await?;
            let requested = match range {
                Some(range) => range,
                None => group.default_range().map_err(ConsolidationError::from)?,
            };
            let effective = kind.effective_range(requested);

            let mut accounts = Vec::new();
            for entity_id in &group.members {
                accounts.extend(self.store.list_accounts(*entity_id).await?);
            }
            let activity = self
                .store
                .query_activity(&ActivityQuery {
                    entity_ids: group.members.iter().copied().collect(),
                    statuses: vec![EntryStatus::Posted],
                    range: effective,
                    account_ids: None,
                })
                .await?;

            let report =
                ConsolidationAggregator::aggregate(&group, kind, effective, &accounts, &activity, Utc::now());
            info!(lines = report.lines.len(), "Consolidated report generated");
            Ok(report)
        })
        .await
    }

    async fn client_group(
        &self,
        client_id: ClientId,
        group_id: ConsolidationGroupId,
    ) -> Result<ConsolidationGroup, EngineError> {
        self.store
            .get_group(group_id)
            .await?
            .filter(|g| g.client_id == client_id)
            .ok_or_else(|| ConsolidationError::GroupNotFound(group_id).into())
    }

    async fn client_entity(&self, client_id: ClientId, entity_id: EntityId) -> Result<(), EngineError> {
        self.store
            .get_entity(entity_id)
            .await?
            .filter(|e| e.client_id == client_id)
            .map(|_| ())
            .ok_or_else(|| ConsolidationError::EntityNotFound(entity_id).into())
    }
}
