//! Journal entries and their lines.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, ClientId, EntityId, JournalEntryId, JournalLineId, UserId};

use super::types::{BalanceTotals, EntrySide, LineInput, SidedAmount};
use crate::workflow::EntryStatus;

/// Who performed a lifecycle step, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    /// Acting user.
    pub user_id: UserId,
    /// When it happened.
    pub at: DateTime<Utc>,
}

impl Stamp {
    /// Creates a stamp for `user_id` at `at`.
    #[must_use]
    pub const fn new(user_id: UserId, at: DateTime<Utc>) -> Self {
        Self { user_id, at }
    }
}

/// A persisted journal line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Line ID.
    pub id: JournalLineId,
    /// Owning entry.
    pub entry_id: JournalEntryId,
    /// Account posted to.
    pub account_id: AccountId,
    /// Debit or credit.
    pub side: EntrySide,
    /// Strictly positive amount.
    pub amount: Decimal,
    /// Optional line memo.
    pub description: Option<String>,
    /// Dimension tags.
    pub dimensions: Vec<String>,
    /// Zero-based position preserving input order.
    pub position: u32,
}

impl JournalLine {
    /// Materializes an input line at `position` of `entry_id`.
    #[must_use]
    pub fn from_input(entry_id: JournalEntryId, position: u32, input: LineInput) -> Self {
        Self {
            id: JournalLineId::new(),
            entry_id,
            account_id: input.account_id,
            side: input.side,
            amount: input.amount,
            description: input.description,
            dimensions: input.dimensions,
            position,
        }
    }

    /// Returns the line as caller-facing input.
    #[must_use]
    pub fn to_input(&self) -> LineInput {
        LineInput {
            account_id: self.account_id,
            side: self.side,
            amount: self.amount,
            description: self.description.clone(),
            dimensions: self.dimensions.clone(),
        }
    }
}

impl SidedAmount for JournalLine {
    fn side(&self) -> EntrySide {
        self.side
    }

    fn amount(&self) -> Decimal {
        self.amount
    }
}

/// A dated, balanced set of debit and credit lines with its lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Entry ID.
    pub id: JournalEntryId,
    /// Owning client.
    pub client_id: ClientId,
    /// Owning entity.
    pub entity_id: EntityId,
    /// Effective date.
    pub entry_date: NaiveDate,
    /// Human reference number, unique per entity.
    pub reference_number: String,
    /// Free-text description.
    pub description: String,
    /// Lifecycle status.
    pub status: EntryStatus,
    /// Creator.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Approval requested.
    pub submitted: Option<Stamp>,
    /// Approved.
    pub approved: Option<Stamp>,
    /// Rejected.
    pub rejected: Option<Stamp>,
    /// Reason given on rejection.
    pub rejection_reason: Option<String>,
    /// Posted.
    pub posted: Option<Stamp>,
    /// Voided.
    pub voided: Option<Stamp>,
    /// Reason given on void.
    pub void_reason: Option<String>,
    /// Entry this one reverses.
    pub reversal_of: Option<JournalEntryId>,
    /// Entry that reverses this one.
    pub reversed_by: Option<JournalEntryId>,
    /// Rejected entry this draft was copied from.
    pub resubmitted_from: Option<JournalEntryId>,
    /// Lines in input order.
    pub lines: Vec<JournalLine>,
}

/// Header fields for a new draft.
#[derive(Debug, Clone)]
pub struct NewEntry {
    /// Owning client.
    pub client_id: ClientId,
    /// Owning entity.
    pub entity_id: EntityId,
    /// Effective date.
    pub entry_date: NaiveDate,
    /// Reference number.
    pub reference_number: String,
    /// Description.
    pub description: String,
    /// Creator.
    pub created_by: UserId,
}

impl JournalEntry {
    /// Creates a draft entry with the given lines.
    #[must_use]
    pub fn draft(header: NewEntry, lines: Vec<LineInput>, now: DateTime<Utc>) -> Self {
        let id = JournalEntryId::new();
        let lines = Self::materialize_lines(id, lines);
        Self {
            id,
            client_id: header.client_id,
            entity_id: header.entity_id,
            entry_date: header.entry_date,
            reference_number: header.reference_number,
            description: header.description,
            status: EntryStatus::Draft,
            created_by: header.created_by,
            created_at: now,
            updated_at: now,
            submitted: None,
            approved: None,
            rejected: None,
            rejection_reason: None,
            posted: None,
            voided: None,
            void_reason: None,
            reversal_of: None,
            reversed_by: None,
            resubmitted_from: None,
            lines,
        }
    }

    /// Assigns positions and fresh IDs to input lines.
    #[must_use]
    pub fn materialize_lines(entry_id: JournalEntryId, lines: Vec<LineInput>) -> Vec<JournalLine> {
        lines
            .into_iter()
            .zip(0u32..)
            .map(|(input, position)| JournalLine::from_input(entry_id, position, input))
            .collect()
    }

    /// Renumbers line positions after an insertion or removal.
    pub fn renumber_lines(&mut self) {
        for (line, position) in self.lines.iter_mut().zip(0u32..) {
            line.position = position;
        }
    }

    /// Returns the debit/credit totals of the current lines.
    #[must_use]
    pub fn totals(&self) -> BalanceTotals {
        let mut totals = BalanceTotals::default();
        for line in &self.lines {
            totals.add(line.side, line.amount);
        }
        totals
    }

    /// Returns the lines as caller-facing inputs.
    #[must_use]
    pub fn line_inputs(&self) -> Vec<LineInput> {
        self.lines.iter().map(JournalLine::to_input).collect()
    }
}
