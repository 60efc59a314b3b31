//! The ledger engine: every upward operation, orchestrated over an injected
//! store and audit sink.
//!
//! Each operation checks the actor's role, validates its command, runs the
//! pure ledger and workflow rules, persists through [`LedgerStore`] as one
//! atomic unit, and records an audit event. Role denials and lifecycle
//! violations are audited as `operation_denied`.
//!
//! Anything stored under a client or entity other than the one the caller
//! claims is reported as not found.

mod accounts;
mod batch;
pub mod commands;
mod consolidation;
mod entries;
pub mod error;
mod reports;
mod reversal;
mod transitions;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tally_shared::config::LedgerConfig;
use tally_shared::types::{AccountId, ClientId, EntityId, JournalEntryId};
use uuid::Uuid;

use crate::ledger::{AccountInfo, EntityScope, JournalEntry, LedgerEntity, LedgerError, ReferenceNumbers};
use crate::store::{AuditAction, AuditEvent, AuditSink, LedgerStore, StoreError};
use crate::workflow::{AccessPolicy, Actor, Operation};

pub use commands::{
    CreateAccount, CreateConsolidationGroup, CreateEntry, LineEdit, RegisterEntity, UpdateAccount,
    UpdateEntry,
};
pub use error::EngineError;

/// Ledger engine generic over its store and audit sink.
pub struct LedgerEngine<S: LedgerStore, A: AuditSink> {
    store: Arc<S>,
    audit: Arc<A>,
    config: LedgerConfig,
}

impl<S: LedgerStore, A: AuditSink> Clone for LedgerEngine<S, A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            audit: Arc::clone(&self.audit),
            config: self.config.clone(),
        }
    }
}

/// How a draft with a resolved reference is written.
#[derive(Debug, Clone, Copy)]
enum DraftWrite {
    /// Plain insert.
    Entry,
    /// Insert and link as the reversal of the given entry.
    Reversal(JournalEntryId),
}

impl<S: LedgerStore, A: AuditSink> LedgerEngine<S, A> {
    /// Create a new engine.
    #[must_use]
    pub fn new(store: Arc<S>, audit: Arc<A>, config: LedgerConfig) -> Self {
        Self {
            store,
            audit,
            config,
        }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Runs `work` if `actor` may perform `operation`, auditing denials.
    async fn guarded<T>(
        &self,
        actor: &Actor,
        client_id: ClientId,
        entity_id: Option<EntityId>,
        operation: Operation,
        target: Option<Uuid>,
        work: impl Future<Output = Result<T, EngineError>>,
    ) -> Result<T, EngineError> {
        let result = match AccessPolicy::authorize(actor, operation) {
            Ok(()) => work.await,
            Err(err) => Err(err.into()),
        };

        if let Err(err) = &result
            && err.is_denial()
        {
            tracing::warn!(
                user_id = %actor.user_id,
                role = %actor.role,
                operation = operation.as_str(),
                code = err.error_code(),
                "operation denied: {err}"
            );
            self.audit
                .record(AuditEvent::new(
                    client_id,
                    entity_id,
                    actor.user_id,
                    AuditAction::OperationDenied,
                    target,
                    serde_json::json!({
                        "operation": operation.as_str(),
                        "code": err.error_code(),
                        "message": err.to_string(),
                    }),
                ))
                .await;
        }

        result
    }

    /// Records a successful change.
    async fn record(
        &self,
        actor: &Actor,
        client_id: ClientId,
        entity_id: Option<EntityId>,
        action: AuditAction,
        target: Option<Uuid>,
        detail: serde_json::Value,
    ) {
        self.audit
            .record(AuditEvent::new(
                client_id,
                entity_id,
                actor.user_id,
                action,
                target,
                detail,
            ))
            .await;
    }

    /// Loads the scope's entity, verifying it belongs to the claimed client.
    async fn require_entity(&self, scope: EntityScope) -> Result<LedgerEntity, EngineError> {
        self.store
            .get_entity(scope.entity_id)
            .await?
            .filter(|e| e.client_id == scope.client_id)
            .ok_or_else(|| LedgerError::EntityNotFound(scope.entity_id).into())
    }

    /// Loads an entry within the scope.
    async fn load_entry(&self, scope: EntityScope, id: JournalEntryId) -> Result<JournalEntry, EngineError> {
        self.store
            .get_entry(id)
            .await?
            .filter(|e| scope.owns(e.client_id, e.entity_id))
            .ok_or_else(|| LedgerError::EntryNotFound(id).into())
    }

    /// Resolves the accounts referenced by a set of lines.
    async fn account_infos(
        &self,
        ids: impl IntoIterator<Item = AccountId>,
    ) -> Result<HashMap<AccountId, AccountInfo>, EngineError> {
        let mut infos = HashMap::new();
        for id in ids {
            if infos.contains_key(&id) {
                continue;
            }
            if let Some(account) = self.store.get_account(id).await? {
                infos.insert(id, AccountInfo::from(&account));
            }
        }
        Ok(infos)
    }

    /// Returns `base` if free in the entity, otherwise the first free
    /// collision candidate.
    async fn unique_reference(&self, entity_id: EntityId, base: &str) -> Result<String, EngineError> {
        if !self.store.reference_exists(entity_id, base).await? {
            return Ok(base.to_string());
        }

        let millis = Utc::now().timestamp_millis();
        for attempt in 0..self.config.max_reference_attempts {
            let candidate = ReferenceNumbers::collision_candidate(base, millis, attempt);
            if !self.store.reference_exists(entity_id, &candidate).await? {
                tracing::debug!(%entity_id, base, candidate, "reference regenerated");
                return Ok(candidate);
            }
        }

        Err(LedgerError::DuplicateReference(base.to_string()).into())
    }

    /// Writes a draft under `base`, or a suffixed variant if `base` is taken.
    ///
    /// A reference taken between the check and the write is retried with
    /// the next candidate.
    async fn write_with_unique_reference(
        &self,
        mut entry: JournalEntry,
        base: &str,
        write: DraftWrite,
    ) -> Result<JournalEntry, EngineError> {
        for _ in 0..=self.config.max_reference_attempts {
            entry.reference_number = self.unique_reference(entry.entity_id, base).await?;
            let written = match write {
                DraftWrite::Entry => self.store.insert_entry(&entry).await,
                DraftWrite::Reversal(original) => self.store.insert_reversal(&entry, original).await,
            };
            match written {
                Ok(()) => return Ok(entry),
                Err(StoreError::DuplicateReference { .. }) => {}
                Err(other) => return Err(other.into()),
            }
        }
        Err(LedgerError::DuplicateReference(base.to_string()).into())
    }

    /// Writes a draft under a generated `{prefix}-{date}-{id}` reference.
    ///
    /// The reference derives from the entry ID, so a collision retries with a
    /// fresh ID.
    async fn write_with_generated_reference(&self, mut entry: JournalEntry) -> Result<JournalEntry, EngineError> {
        for _ in 0..self.config.max_reference_attempts.max(1) {
            entry.reference_number =
                ReferenceNumbers::auto(&self.config.reference_prefix, entry.entry_date, entry.id);
            match self.store.insert_entry(&entry).await {
                Ok(()) => return Ok(entry),
                Err(StoreError::DuplicateReference { .. }) => {
                    let id = JournalEntryId::new();
                    entry.id = id;
                    for line in &mut entry.lines {
                        line.entry_id = id;
                    }
                }
                Err(other) => return Err(other.into()),
            }
        }
        Err(LedgerError::DuplicateReference(entry.reference_number).into())
    }
}
