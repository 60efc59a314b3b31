//! In-memory `LedgerStore` for tests and embedded use.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tally_shared::types::{
    AccountId, ClientId, ConsolidationGroupId, EntityId, JournalEntryId, PageRequest,
};
use tokio::sync::RwLock;

use super::error::StoreError;
use super::query::{ActivityLine, ActivityQuery, EntryFilter};
use super::LedgerStore;
use crate::consolidation::ConsolidationGroup;
use crate::ledger::{Account, JournalEntry, LedgerEntity};
use crate::workflow::EntryStatus;

#[derive(Debug, Default)]
struct Inner {
    entities: HashMap<EntityId, LedgerEntity>,
    accounts: HashMap<AccountId, Account>,
    entries: HashMap<JournalEntryId, JournalEntry>,
    groups: HashMap<ConsolidationGroupId, ConsolidationGroup>,
}

impl Inner {
    fn code_taken(&self, entity_id: EntityId, code: &str, except: Option<AccountId>) -> bool {
        self.accounts
            .values()
            .any(|a| a.entity_id == entity_id && a.code == code && Some(a.id) != except)
    }

    fn reference_taken(&self, entity_id: EntityId, reference: &str, except: Option<JournalEntryId>) -> bool {
        self.entries.values().any(|e| {
            e.entity_id == entity_id && e.reference_number == reference && Some(e.id) != except
        })
    }

    fn entry_with_status(
        &mut self,
        id: JournalEntryId,
        expected: EntryStatus,
    ) -> Result<&mut JournalEntry, StoreError> {
        let stored = self
            .entries
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Entry", id))?;
        if stored.status != expected {
            return Err(StoreError::StatusConflict {
                entry_id: id,
                expected,
                actual: stored.status,
            });
        }
        Ok(stored)
    }
}

/// `LedgerStore` holding everything behind one `RwLock`.
///
/// Each write method takes the write lock once, so entry-plus-lines writes
/// and compare-and-set transitions are atomic with respect to every reader.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    inner: RwLock<Inner>,
    unavailable: AtomicBool,
}

impl InMemoryLedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `Unavailable` until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store offline".into()));
        }
        Ok(())
    }
}

impl LedgerStore for InMemoryLedgerStore {
    async fn insert_entity(&self, entity: &LedgerEntity) -> Result<(), StoreError> {
        self.check_available()?;
        self.inner
            .write()
            .await
            .entities
            .insert(entity.id, entity.clone());
        Ok(())
    }

    async fn get_entity(&self, id: EntityId) -> Result<Option<LedgerEntity>, StoreError> {
        self.check_available()?;
        Ok(self.inner.read().await.entities.get(&id).cloned())
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        self.check_available()?;
        let mut inner = self.inner.write().await;
        if inner.code_taken(account.entity_id, &account.code, None) {
            return Err(StoreError::DuplicateAccountCode {
                entity_id: account.entity_id,
                code: account.code.clone(),
            });
        }
        inner.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn update_account(&self, account: &Account) -> Result<(), StoreError> {
        self.check_available()?;
        let mut inner = self.inner.write().await;
        if !inner.accounts.contains_key(&account.id) {
            return Err(StoreError::not_found("Account", account.id));
        }
        if inner.code_taken(account.entity_id, &account.code, Some(account.id)) {
            return Err(StoreError::DuplicateAccountCode {
                entity_id: account.entity_id,
                code: account.code.clone(),
            });
        }
        inner.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        self.check_available()?;
        Ok(self.inner.read().await.accounts.get(&id).cloned())
    }

    async fn find_account_by_code(
        &self,
        entity_id: EntityId,
        code: &str,
    ) -> Result<Option<Account>, StoreError> {
        self.check_available()?;
        Ok(self
            .inner
            .read()
            .await
            .accounts
            .values()
            .find(|a| a.entity_id == entity_id && a.code == code)
            .cloned())
    }

    async fn list_accounts(&self, entity_id: EntityId) -> Result<Vec<Account>, StoreError> {
        self.check_available()?;
        let mut accounts: Vec<Account> = self
            .inner
            .read()
            .await
            .accounts
            .values()
            .filter(|a| a.entity_id == entity_id)
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(accounts)
    }

    async fn insert_entry(&self, entry: &JournalEntry) -> Result<(), StoreError> {
        self.check_available()?;
        let mut inner = self.inner.write().await;
        if inner.reference_taken(entry.entity_id, &entry.reference_number, None) {
            return Err(StoreError::DuplicateReference {
                entity_id: entry.entity_id,
                reference: entry.reference_number.clone(),
            });
        }
        inner.entries.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn get_entry(&self, id: JournalEntryId) -> Result<Option<JournalEntry>, StoreError> {
        self.check_available()?;
        Ok(self.inner.read().await.entries.get(&id).cloned())
    }

    async fn list_entries(
        &self,
        filter: &EntryFilter,
        page: PageRequest,
    ) -> Result<(Vec<JournalEntry>, u64), StoreError> {
        self.check_available()?;
        let inner = self.inner.read().await;
        let mut matches: Vec<&JournalEntry> = inner
            .entries
            .values()
            .filter(|e| e.client_id == filter.client_id && e.entity_id == filter.entity_id)
            .filter(|e| filter.matches_status(e.status))
            .filter(|e| filter.matches_date(e.entry_date))
            .filter(|e| filter.matches_text(&e.reference_number, &e.description))
            .filter(|e| {
                filter
                    .account_id
                    .is_none_or(|account| e.lines.iter().any(|l| l.account_id == account))
            })
            .collect();
        matches.sort_by(|a, b| {
            b.entry_date
                .cmp(&a.entry_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| b.id.cmp(&a.id))
        });

        let total = matches.len() as u64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        let data = matches
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((data, total))
    }

    async fn reference_exists(&self, entity_id: EntityId, reference: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self
            .inner
            .read()
            .await
            .reference_taken(entity_id, reference, None))
    }

    async fn replace_entry(&self, entry: &JournalEntry, expected: EntryStatus) -> Result<(), StoreError> {
        self.check_available()?;
        let mut inner = self.inner.write().await;
        if inner.reference_taken(entry.entity_id, &entry.reference_number, Some(entry.id)) {
            return Err(StoreError::DuplicateReference {
                entity_id: entry.entity_id,
                reference: entry.reference_number.clone(),
            });
        }
        let stored = inner.entry_with_status(entry.id, expected)?;
        *stored = entry.clone();
        Ok(())
    }

    async fn transition_entry(&self, entry: &JournalEntry, expected: EntryStatus) -> Result<(), StoreError> {
        self.check_available()?;
        let mut inner = self.inner.write().await;
        let stored = inner.entry_with_status(entry.id, expected)?;
        stored.status = entry.status;
        stored.updated_at = entry.updated_at;
        stored.submitted = entry.submitted;
        stored.approved = entry.approved;
        stored.rejected = entry.rejected;
        stored.rejection_reason.clone_from(&entry.rejection_reason);
        stored.posted = entry.posted;
        stored.voided = entry.voided;
        stored.void_reason.clone_from(&entry.void_reason);
        Ok(())
    }

    async fn delete_entry(&self, id: JournalEntryId, expected: EntryStatus) -> Result<(), StoreError> {
        self.check_available()?;
        let mut inner = self.inner.write().await;
        inner.entry_with_status(id, expected)?;
        if let Some(removed) = inner.entries.remove(&id)
            && let Some(original) = removed.reversal_of
            && let Some(original) = inner.entries.get_mut(&original)
            && original.reversed_by == Some(id)
        {
            original.reversed_by = None;
        }
        Ok(())
    }

    async fn insert_reversal(
        &self,
        reversal: &JournalEntry,
        original_id: JournalEntryId,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let mut inner = self.inner.write().await;
        if inner.reference_taken(reversal.entity_id, &reversal.reference_number, None) {
            return Err(StoreError::DuplicateReference {
                entity_id: reversal.entity_id,
                reference: reversal.reference_number.clone(),
            });
        }

        let original = inner.entry_with_status(original_id, EntryStatus::Posted)?;
        if let Some(reversed_by) = original.reversed_by {
            return Err(StoreError::AlreadyReversed {
                entry_id: original_id,
                reversed_by,
            });
        }
        original.reversed_by = Some(reversal.id);
        original.updated_at = reversal.created_at;
        inner.entries.insert(reversal.id, reversal.clone());
        Ok(())
    }

    async fn query_activity(&self, query: &ActivityQuery) -> Result<Vec<ActivityLine>, StoreError> {
        self.check_available()?;
        let inner = self.inner.read().await;
        let mut rows: Vec<ActivityLine> = inner
            .entries
            .values()
            .filter(|e| query.matches_entry(e.entity_id, e.status, e.entry_date))
            .flat_map(|entry| {
                entry
                    .lines
                    .iter()
                    .filter(|line| query.matches_account(line.account_id))
                    .map(move |line| ActivityLine {
                        entity_id: entry.entity_id,
                        entry_id: entry.id,
                        entry_date: entry.entry_date,
                        reference_number: entry.reference_number.clone(),
                        entry_description: entry.description.clone(),
                        status: entry.status,
                        created_at: entry.created_at,
                        line_id: line.id,
                        account_id: line.account_id,
                        side: line.side,
                        amount: line.amount,
                        line_description: line.description.clone(),
                        position: line.position,
                    })
            })
            .collect();
        rows.sort_by_key(ActivityLine::chronological_key);
        Ok(rows)
    }

    async fn insert_group(&self, group: &ConsolidationGroup) -> Result<(), StoreError> {
        self.check_available()?;
        self.inner
            .write()
            .await
            .groups
            .insert(group.id, group.clone());
        Ok(())
    }

    async fn get_group(&self, id: ConsolidationGroupId) -> Result<Option<ConsolidationGroup>, StoreError> {
        self.check_available()?;
        Ok(self.inner.read().await.groups.get(&id).cloned())
    }

    async fn list_groups(&self, client_id: ClientId) -> Result<Vec<ConsolidationGroup>, StoreError> {
        self.check_available()?;
        let mut groups: Vec<ConsolidationGroup> = self
            .inner
            .read()
            .await
            .groups
            .values()
            .filter(|g| g.client_id == client_id)
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn add_group_member(
        &self,
        group_id: ConsolidationGroupId,
        entity_id: EntityId,
    ) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut inner = self.inner.write().await;
        let group = inner
            .groups
            .get_mut(&group_id)
            .ok_or_else(|| StoreError::not_found("Consolidation group", group_id))?;
        Ok(group.members.insert(entity_id))
    }

    async fn remove_group_member(
        &self,
        group_id: ConsolidationGroupId,
        entity_id: EntityId,
    ) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut inner = self.inner.write().await;
        let group = inner
            .groups
            .get_mut(&group_id)
            .ok_or_else(|| StoreError::not_found("Consolidation group", group_id))?;
        Ok(group.members.remove(&entity_id))
    }
}
