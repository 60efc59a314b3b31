//! Typed engine commands, validated once at the boundary with `garde`.

use chrono::NaiveDate;
use garde::Validate;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, ClientId, EntityId};

use crate::ledger::{AccountType, BalanceCheck, JournalEntry, LineInput, SubledgerKind};

/// Register a new entity under a client.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterEntity {
    /// Owning client.
    #[garde(skip)]
    pub client_id: ClientId,
    /// Display name.
    #[garde(length(min = 1, max = 200))]
    pub name: String,
    /// ISO 4217 functional currency.
    #[garde(length(min = 3, max = 3))]
    pub currency: String,
}

/// Add an account to an entity's chart.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAccount {
    /// Code, unique within the entity.
    #[garde(length(min = 1, max = 20))]
    pub code: String,
    /// Display name.
    #[garde(length(min = 1, max = 200))]
    pub name: String,
    /// Classification.
    #[garde(skip)]
    pub account_type: AccountType,
    /// Subtype label.
    #[garde(length(min = 1, max = 50))]
    pub subtype: Option<String>,
    /// Parent account.
    #[garde(skip)]
    pub parent_id: Option<AccountId>,
    /// Subledger marker.
    #[garde(skip)]
    pub subledger: Option<SubledgerKind>,
}

/// Change an existing account. Absent fields are left as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateAccount {
    /// New code.
    #[garde(length(min = 1, max = 20))]
    pub code: Option<String>,
    /// New name.
    #[garde(length(min = 1, max = 200))]
    pub name: Option<String>,
    /// New subtype label.
    #[garde(length(min = 1, max = 50))]
    pub subtype: Option<String>,
    /// New parent account.
    #[garde(skip)]
    pub parent_id: Option<AccountId>,
    /// Detach from the current parent.
    #[garde(skip)]
    #[serde(default)]
    pub clear_parent: bool,
    /// Activate or deactivate.
    #[garde(skip)]
    pub is_active: Option<bool>,
}

/// Create a draft entry.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateEntry {
    /// Effective date.
    #[garde(skip)]
    pub entry_date: NaiveDate,
    /// Reference number; generated when absent.
    #[garde(length(max = 100))]
    pub reference_number: Option<String>,
    /// Description.
    #[garde(length(max = 1000))]
    pub description: String,
    /// Lines in input order.
    #[garde(dive)]
    pub lines: Vec<LineInput>,
}

/// Edit a draft's header and optionally replace its whole line set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateEntry {
    /// New effective date.
    #[garde(skip)]
    pub entry_date: Option<NaiveDate>,
    /// New reference number.
    #[garde(length(max = 100))]
    pub reference_number: Option<String>,
    /// New description.
    #[garde(length(max = 1000))]
    pub description: Option<String>,
    /// Replacement line set; must balance.
    #[garde(dive)]
    pub lines: Option<Vec<LineInput>>,
}

/// Create a consolidation group.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateConsolidationGroup {
    /// Display name.
    #[garde(length(max = 200))]
    pub name: String,
    /// Reporting currency.
    #[garde(length(min = 3, max = 3))]
    pub currency: String,
    /// Default period start.
    #[garde(skip)]
    pub period_start: NaiveDate,
    /// Default period end.
    #[garde(skip)]
    pub period_end: NaiveDate,
    /// Initial members.
    #[garde(skip)]
    #[serde(default)]
    pub members: Vec<EntityId>,
}

/// Result of a single-line edit on a draft.
///
/// A single edit may leave the draft unbalanced; `balance` reports where it stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineEdit {
    /// The entry after the edit.
    pub entry: JournalEntry,
    /// Totals after the edit.
    pub balance: BalanceCheck,
}
