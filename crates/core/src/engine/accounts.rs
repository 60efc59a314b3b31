//! Entities and the chart of accounts.

use chrono::Utc;
use garde::Validate;
use tally_shared::types::{AccountId, EntityId};
use tracing::info;

use super::commands::{CreateAccount, RegisterEntity, UpdateAccount};
use super::{EngineError, LedgerEngine};
use crate::ledger::{Account, AccountDirectory, AccountNode, EntityScope, LedgerEntity, LedgerError};
use crate::store::{AuditAction, AuditSink, LedgerStore};
use crate::workflow::{Actor, Operation};

impl<S: LedgerStore, A: AuditSink> LedgerEngine<S, A> {
    /// Registers a new entity under the command's client.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientRole`, `InvalidCommand`, or a storage error.
    pub async fn register_entity(&self, actor: &Actor, cmd: RegisterEntity) -> Result<LedgerEntity, EngineError> {
        let client_id = cmd.client_id;
        self.guarded(actor, client_id, None, Operation::ManageChart, None, async move {
            cmd.validate()?;

            let entity = LedgerEntity {
                id: EntityId::new(),
                client_id,
                name: cmd.name.trim().to_string(),
                currency: cmd.currency.to_uppercase(),
                created_at: Utc::now(),
            };
            self.store.insert_entity(&entity).await?;

            info!(client_id = %client_id, entity_id = %entity.id, "Entity registered");
            self.record(
                actor,
                client_id,
                Some(entity.id),
                AuditAction::EntityRegistered,
                Some(entity.id.into_inner()),
                serde_json::json!({ "name": entity.name, "currency": entity.currency }),
            )
            .await;

            Ok(entity)
        })
        .await
    }

    /// Returns an entity of the scope's client.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if the entity is missing or owned by another client.
    pub async fn get_entity(&self, actor: &Actor, scope: EntityScope) -> Result<LedgerEntity, EngineError> {
        self.guarded(actor, scope.client_id, Some(scope.entity_id), Operation::Read, None, async move {
            self.require_entity(scope).await
        })
        .await
    }

    /// Adds an account to the entity's chart.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccountCode`, `DuplicateAccountCode`, `InvalidParent`,
    /// or `EntityNotFound`.
    pub async fn create_account(
        &self,
        actor: &Actor,
        scope: EntityScope,
        cmd: CreateAccount,
    ) -> Result<Account, EngineError> {
        self.guarded(actor, scope.client_id, Some(scope.entity_id), Operation::ManageChart, None, async move {
            cmd.validate()?;
            self.require_entity(scope).await?;
            AccountDirectory::validate_code(&cmd.code)?;

            if self
                .store
                .find_account_by_code(scope.entity_id, &cmd.code)
                .await?
                .is_some()
            {
                return Err(LedgerError::DuplicateAccountCode(cmd.code).into());
            }

            let account = Account {
                id: AccountId::new(),
                entity_id: scope.entity_id,
                code: cmd.code,
                name: cmd.name.trim().to_string(),
                account_type: cmd.account_type,
                subtype: cmd.subtype,
                parent_id: cmd.parent_id,
                is_active: true,
                subledger: cmd.subledger,
                created_at: Utc::now(),
            };

            if let Some(parent_id) = account.parent_id {
                let existing = self.store.list_accounts(scope.entity_id).await?;
                AccountDirectory::validate_parent(account.id, scope.entity_id, parent_id, &existing)?;
            }

            self.store.insert_account(&account).await?;

            info!(entity_id = %scope.entity_id, account_id = %account.id, code = %account.code, "Account created");
            self.record(
                actor,
                scope.client_id,
                Some(scope.entity_id),
                AuditAction::AccountCreated,
                Some(account.id.into_inner()),
                serde_json::json!({
                    "code": account.code,
                    "account_type": account.account_type,
                }),
            )
            .await;

            Ok(account)
        })
        .await
    }

    /// Changes an account's code, name, subtype, parent, or active flag.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `DuplicateAccountCode`, `InvalidParent`, or
    /// `AccountCycle`.
    pub async fn update_account(
        &self,
        actor: &Actor,
        scope: EntityScope,
        account_id: AccountId,
        cmd: UpdateAccount,
    ) -> Result<Account, EngineError> {
        self.guarded(
            actor,
            scope.client_id,
            Some(scope.entity_id),
            Operation::ManageChart,
            Some(account_id.into_inner()),
            async move {
                cmd.validate()?;
                self.require_entity(scope).await?;
                let mut account = self.scoped_account(scope, account_id).await?;

                if let Some(code) = cmd.code {
                    AccountDirectory::validate_code(&code)?;
                    if code != account.code {
                        let taken = self
                            .store
                            .find_account_by_code(scope.entity_id, &code)
                            .await?
                            .is_some_and(|other| other.id != account.id);
                        if taken {
                            return Err(LedgerError::DuplicateAccountCode(code).into());
                        }
                        account.code = code;
                    }
                }
                if let Some(name) = cmd.name {
                    account.name = name.trim().to_string();
                }
                if cmd.subtype.is_some() {
                    account.subtype = cmd.subtype;
                }
                if cmd.clear_parent {
                    account.parent_id = None;
                } else if let Some(parent_id) = cmd.parent_id {
                    let existing = self.store.list_accounts(scope.entity_id).await?;
                    AccountDirectory::validate_parent(account.id, scope.entity_id, parent_id, &existing)?;
                    account.parent_id = Some(parent_id);
                }
                if let Some(is_active) = cmd.is_active {
                    account.is_active = is_active;
                }

                self.store.update_account(&account).await?;

                info!(entity_id = %scope.entity_id, account_id = %account.id, "Account updated");
                self.record(
                    actor,
                    scope.client_id,
                    Some(scope.entity_id),
                    AuditAction::AccountUpdated,
                    Some(account.id.into_inner()),
                    serde_json::json!({
                        "code": account.code,
                        "is_active": account.is_active,
                    }),
                )
                .await;

                Ok(account)
            },
        )
        .await
    }

    /// Returns one account of the entity.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if it is missing or belongs elsewhere.
    pub async fn get_account(
        &self,
        actor: &Actor,
        scope: EntityScope,
        account_id: AccountId,
    ) -> Result<Account, EngineError> {
        self.guarded(actor, scope.client_id, Some(scope.entity_id), Operation::Read, None, async move {
            self.require_entity(scope).await?;
            self.scoped_account(scope, account_id).await
        })
        .await
    }

    /// Looks an account up by code.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` or a storage error.
    pub async fn find_account_by_code(
        &self,
        actor: &Actor,
        scope: EntityScope,
        code: &str,
    ) -> Result<Option<Account>, EngineError> {
        self.guarded(actor, scope.client_id, Some(scope.entity_id), Operation::Read, None, async move {
            self.require_entity(scope).await?;
            Ok(self.store.find_account_by_code(scope.entity_id, code).await?)
        })
        .await
    }

    /// Lists the entity's chart ordered by code.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` or a storage error.
    pub async fn list_accounts(&self, actor: &Actor, scope: EntityScope) -> Result<Vec<Account>, EngineError> {
        self.guarded(actor, scope.client_id, Some(scope.entity_id), Operation::Read, None, async move {
            self.require_entity(scope).await?;
            Ok(self.store.list_accounts(scope.entity_id).await?)
        })
        .await
    }

    /// Returns the chart as a forest.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` or a storage error.
    pub async fn account_tree(&self, actor: &Actor, scope: EntityScope) -> Result<Vec<AccountNode>, EngineError> {
        let accounts = self.list_accounts(actor, scope).await?;
        Ok(AccountDirectory::build_tree(&accounts))
    }

    async fn scoped_account(&self, scope: EntityScope, account_id: AccountId) -> Result<Account, EngineError> {
        self.store
            .get_account(account_id)
            .await?
            .filter(|a| a.entity_id == scope.entity_id)
            .ok_or_else(|| LedgerError::AccountNotFound(account_id).into())
    }
}
