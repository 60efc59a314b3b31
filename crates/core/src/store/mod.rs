//! Persistence and audit seams.
//!
//! The engine talks to storage only through [`LedgerStore`] and to the audit
//! log only through [`AuditSink`]. The db crate provides the PostgreSQL
//! implementations; [`InMemoryLedgerStore`] backs tests and embedded use.
//!
//! Every method that writes an entry together with its lines is a single
//! atomic unit. Status-changing writes are compare-and-set against the
//! status the caller read; a lost race is reported as
//! [`StoreError::StatusConflict`] and nothing is written.

pub mod audit;
pub mod error;
pub mod memory;
pub mod query;

use tally_shared::types::{
    AccountId, ClientId, ConsolidationGroupId, EntityId, JournalEntryId, PageRequest,
};

use crate::consolidation::ConsolidationGroup;
use crate::ledger::{Account, JournalEntry, LedgerEntity};
use crate::workflow::EntryStatus;

pub use audit::{AuditAction, AuditEvent, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use error::StoreError;
pub use memory::InMemoryLedgerStore;
pub use query::{ActivityLine, ActivityQuery, EntryFilter};

/// Repository trait for ledger persistence.
pub trait LedgerStore: Send + Sync {
    // ========== Entities ==========

    /// Insert a new entity.
    fn insert_entity(
        &self,
        entity: &LedgerEntity,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Find an entity by ID.
    fn get_entity(
        &self,
        id: EntityId,
    ) -> impl std::future::Future<Output = Result<Option<LedgerEntity>, StoreError>> + Send;

    // ========== Accounts ==========

    /// Insert a new account. Fails with `DuplicateAccountCode` if the code is taken.
    fn insert_account(
        &self,
        account: &Account,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Overwrite an existing account. Fails with `DuplicateAccountCode` if a
    /// changed code collides with another account.
    fn update_account(
        &self,
        account: &Account,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Find an account by ID.
    fn get_account(
        &self,
        id: AccountId,
    ) -> impl std::future::Future<Output = Result<Option<Account>, StoreError>> + Send;

    /// Find an account by code within an entity.
    fn find_account_by_code(
        &self,
        entity_id: EntityId,
        code: &str,
    ) -> impl std::future::Future<Output = Result<Option<Account>, StoreError>> + Send;

    /// List an entity's accounts ordered by code.
    fn list_accounts(
        &self,
        entity_id: EntityId,
    ) -> impl std::future::Future<Output = Result<Vec<Account>, StoreError>> + Send;

    // ========== Entries ==========

    /// Insert an entry with its lines atomically.
    ///
    /// Fails with `DuplicateReference` if the reference is taken in the entity.
    fn insert_entry(
        &self,
        entry: &JournalEntry,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Find an entry with its lines.
    fn get_entry(
        &self,
        id: JournalEntryId,
    ) -> impl std::future::Future<Output = Result<Option<JournalEntry>, StoreError>> + Send;

    /// List entries matching `filter`, newest effective date first.
    ///
    /// Returns the requested page and the total number of matches.
    fn list_entries(
        &self,
        filter: &EntryFilter,
        page: PageRequest,
    ) -> impl std::future::Future<Output = Result<(Vec<JournalEntry>, u64), StoreError>> + Send;

    /// Returns true if `reference` is taken in `entity_id`.
    fn reference_exists(
        &self,
        entity_id: EntityId,
        reference: &str,
    ) -> impl std::future::Future<Output = Result<bool, StoreError>> + Send;

    /// Replace an entry's header and its whole line set, if its stored status
    /// is still `expected`.
    fn replace_entry(
        &self,
        entry: &JournalEntry,
        expected: EntryStatus,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Write an entry's status and lifecycle stamps, if its stored status is
    /// still `expected`. Lines are not touched.
    fn transition_entry(
        &self,
        entry: &JournalEntry,
        expected: EntryStatus,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Delete an entry and its lines, if its stored status is still `expected`.
    fn delete_entry(
        &self,
        id: JournalEntryId,
        expected: EntryStatus,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Insert a reversing entry and link it to `original_id` atomically.
    ///
    /// Fails with `StatusConflict` if the original is no longer posted and
    /// with `AlreadyReversed` if it already has a reversal.
    fn insert_reversal(
        &self,
        reversal: &JournalEntry,
        original_id: JournalEntryId,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    // ========== Activity ==========

    /// Lines joined with their entry headers, in chronological order.
    fn query_activity(
        &self,
        query: &ActivityQuery,
    ) -> impl std::future::Future<Output = Result<Vec<ActivityLine>, StoreError>> + Send;

    // ========== Consolidation groups ==========

    /// Insert a new group with its members.
    fn insert_group(
        &self,
        group: &ConsolidationGroup,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Find a group with its current members.
    fn get_group(
        &self,
        id: ConsolidationGroupId,
    ) -> impl std::future::Future<Output = Result<Option<ConsolidationGroup>, StoreError>> + Send;

    /// List a client's groups ordered by name.
    fn list_groups(
        &self,
        client_id: ClientId,
    ) -> impl std::future::Future<Output = Result<Vec<ConsolidationGroup>, StoreError>> + Send;

    /// Add a member. Returns false if it was already a member.
    fn add_group_member(
        &self,
        group_id: ConsolidationGroupId,
        entity_id: EntityId,
    ) -> impl std::future::Future<Output = Result<bool, StoreError>> + Send;

    /// Remove a member. Returns false if it was not a member.
    fn remove_group_member(
        &self,
        group_id: ConsolidationGroupId,
        entity_id: EntityId,
    ) -> impl std::future::Future<Output = Result<bool, StoreError>> + Send;
}
