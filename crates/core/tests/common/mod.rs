//! Shared fixtures for engine scenario tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_core::engine::{CreateAccount, CreateEntry, RegisterEntity};
use tally_core::ledger::{Account, AccountType, EntityScope, JournalEntry, LineInput};
use tally_core::store::{InMemoryLedgerStore, MemoryAuditSink};
use tally_core::workflow::{Actor, ActorRole};
use tally_core::LedgerEngine;
use tally_shared::config::LedgerConfig;
use tally_shared::types::{ClientId, UserId};

pub type Engine = LedgerEngine<InMemoryLedgerStore, MemoryAuditSink>;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn actor(role: ActorRole) -> Actor {
    Actor::new(UserId::new(), role)
}

pub struct Harness {
    pub engine: Engine,
    pub store: Arc<InMemoryLedgerStore>,
    pub audit: Arc<MemoryAuditSink>,
    pub client: ClientId,
    pub admin: Actor,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        let store = Arc::new(InMemoryLedgerStore::new());
        let audit = Arc::new(MemoryAuditSink::new());
        Self {
            engine: LedgerEngine::new(Arc::clone(&store), Arc::clone(&audit), config),
            store,
            audit,
            client: ClientId::new(),
            admin: actor(ActorRole::Admin),
        }
    }

    pub async fn entity(&self, name: &str) -> EntityScope {
        let entity = self
            .engine
            .register_entity(
                &self.admin,
                RegisterEntity {
                    client_id: self.client,
                    name: name.into(),
                    currency: "USD".into(),
                },
            )
            .await
            .unwrap();
        EntityScope::new(self.client, entity.id)
    }

    pub async fn account(
        &self,
        scope: EntityScope,
        code: &str,
        account_type: AccountType,
        subtype: Option<&str>,
    ) -> Account {
        self.engine
            .create_account(
                &self.admin,
                scope,
                CreateAccount {
                    code: code.into(),
                    name: format!("Account {code}"),
                    account_type,
                    subtype: subtype.map(str::to_string),
                    parent_id: None,
                    subledger: None,
                },
            )
            .await
            .unwrap()
    }

    pub async fn draft(&self, scope: EntityScope, on: NaiveDate, lines: Vec<LineInput>) -> JournalEntry {
        self.engine
            .create_entry(&self.admin, scope, entry(on, None, lines))
            .await
            .unwrap()
    }

    /// Creates an entry and walks it through approval to posted.
    pub async fn posted(&self, scope: EntityScope, on: NaiveDate, lines: Vec<LineInput>) -> JournalEntry {
        let draft = self.draft(scope, on, lines).await;
        self.post_draft(scope, &draft).await
    }

    pub async fn post_draft(&self, scope: EntityScope, draft: &JournalEntry) -> JournalEntry {
        self.engine
            .request_approval(&self.admin, scope, draft.id)
            .await
            .unwrap();
        self.engine.approve(&self.admin, scope, draft.id).await.unwrap();
        self.engine.post(&self.admin, scope, draft.id).await.unwrap()
    }
}

pub fn entry(on: NaiveDate, reference: Option<&str>, lines: Vec<LineInput>) -> CreateEntry {
    CreateEntry {
        entry_date: on,
        reference_number: reference.map(str::to_string),
        description: "Test entry".into(),
        lines,
    }
}

pub fn pair(debit: &Account, credit: &Account, amount: Decimal) -> Vec<LineInput> {
    vec![
        LineInput::debit(debit.id, amount),
        LineInput::credit(credit.id, amount),
    ]
}
