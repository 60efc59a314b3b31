//! Query shapes passed to the store, and the activity rows it returns.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, ClientId, DateRange, EntityId, JournalEntryId, JournalLineId};

use crate::ledger::EntrySide;
use crate::workflow::EntryStatus;

/// Filters for listing entries of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFilter {
    /// Owning client.
    pub client_id: ClientId,
    /// Owning entity.
    pub entity_id: EntityId,
    /// Statuses to include; empty means all.
    #[serde(default)]
    pub statuses: Vec<EntryStatus>,
    /// Earliest effective date (inclusive).
    pub date_from: Option<NaiveDate>,
    /// Latest effective date (inclusive).
    pub date_to: Option<NaiveDate>,
    /// Only entries with a line on this account.
    pub account_id: Option<AccountId>,
    /// Case-insensitive match on reference number or description.
    pub search: Option<String>,
}

impl EntryFilter {
    /// A filter matching every entry of the entity.
    #[must_use]
    pub const fn all(client_id: ClientId, entity_id: EntityId) -> Self {
        Self {
            client_id,
            entity_id,
            statuses: Vec::new(),
            date_from: None,
            date_to: None,
            account_id: None,
            search: None,
        }
    }

    /// Returns true if `status` passes the status filter.
    #[must_use]
    pub fn matches_status(&self, status: EntryStatus) -> bool {
        self.statuses.is_empty() || self.statuses.contains(&status)
    }

    /// Returns true if `date` passes the date filters.
    #[must_use]
    pub fn matches_date(&self, date: NaiveDate) -> bool {
        self.date_from.is_none_or(|from| date >= from) && self.date_to.is_none_or(|to| date <= to)
    }

    /// Returns true if the text filter matches.
    #[must_use]
    pub fn matches_text(&self, reference: &str, description: &str) -> bool {
        self.search.as_deref().is_none_or(|needle| {
            let needle = needle.to_lowercase();
            reference.to_lowercase().contains(&needle)
                || description.to_lowercase().contains(&needle)
        })
    }
}

/// Line activity query used by reports and consolidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityQuery {
    /// Entities to read.
    pub entity_ids: Vec<EntityId>,
    /// Entry statuses to include.
    pub statuses: Vec<EntryStatus>,
    /// Effective-date range.
    pub range: DateRange,
    /// Restrict to these accounts; `None` means all.
    pub account_ids: Option<Vec<AccountId>>,
}

impl ActivityQuery {
    /// Returns true if an entry with these attributes is in scope.
    #[must_use]
    pub fn matches_entry(&self, entity_id: EntityId, status: EntryStatus, date: NaiveDate) -> bool {
        self.entity_ids.contains(&entity_id) && self.statuses.contains(&status) && self.range.contains(date)
    }

    /// Returns true if a line on `account_id` is in scope.
    #[must_use]
    pub fn matches_account(&self, account_id: AccountId) -> bool {
        self.account_ids
            .as_ref()
            .is_none_or(|ids| ids.contains(&account_id))
    }
}

/// One journal line joined with its entry header.
///
/// Stores return these ordered by effective date, entry creation time,
/// entry ID, then line position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLine {
    /// Owning entity.
    pub entity_id: EntityId,
    /// Entry ID.
    pub entry_id: JournalEntryId,
    /// Entry effective date.
    pub entry_date: NaiveDate,
    /// Entry reference number.
    pub reference_number: String,
    /// Entry description.
    pub entry_description: String,
    /// Entry status.
    pub status: EntryStatus,
    /// Entry creation time, used to order same-day entries.
    pub created_at: DateTime<Utc>,
    /// Line ID.
    pub line_id: JournalLineId,
    /// Account posted to.
    pub account_id: AccountId,
    /// Debit or credit.
    pub side: EntrySide,
    /// Amount.
    pub amount: Decimal,
    /// Line memo.
    pub line_description: Option<String>,
    /// Position within the entry.
    pub position: u32,
}

impl ActivityLine {
    /// Sort key giving chronological order.
    #[must_use]
    pub fn chronological_key(&self) -> (NaiveDate, DateTime<Utc>, JournalEntryId, u32) {
        (self.entry_date, self.created_at, self.entry_id, self.position)
    }
}
