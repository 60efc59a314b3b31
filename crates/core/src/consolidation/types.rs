//! Consolidation group and report types.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{ClientId, ConsolidationGroupId, DateRange, EntityId, InvalidDateRange};

use crate::ledger::AccountType;

/// A named set of entities reported together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationGroup {
    /// Group ID.
    pub id: ConsolidationGroupId,
    /// Owning client.
    pub client_id: ClientId,
    /// Display name.
    pub name: String,
    /// Reporting currency.
    pub currency: String,
    /// Default reporting period start.
    pub period_start: NaiveDate,
    /// Default reporting period end.
    pub period_end: NaiveDate,
    /// Member entities.
    pub members: BTreeSet<EntityId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ConsolidationGroup {
    /// The group's default reporting range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if the stored bounds are inverted.
    pub fn default_range(&self) -> Result<DateRange, InvalidDateRange> {
        DateRange::new(self.period_start, self.period_end)
    }
}

/// Which consolidated statement to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsolidatedReportKind {
    /// Every account type over the range.
    TrialBalance,
    /// Asset, liability and equity accounts from inception to range end,
    /// plus current earnings closed into equity.
    BalanceSheet,
    /// Revenue and expense accounts over the range.
    IncomeStatement,
}

impl ConsolidatedReportKind {
    /// Returns true if accounts of `account_type` belong in this report.
    #[must_use]
    pub const fn includes(self, account_type: AccountType) -> bool {
        match self {
            Self::TrialBalance => true,
            Self::BalanceSheet => account_type.is_balance_sheet(),
            Self::IncomeStatement => !account_type.is_balance_sheet(),
        }
    }

    /// Returns the activity range for this report given the requested range.
    ///
    /// Balance sheets are cumulative, so only the end bound applies.
    #[must_use]
    pub fn effective_range(self, requested: DateRange) -> DateRange {
        match self {
            Self::BalanceSheet => DateRange::up_to(requested.end()),
            Self::TrialBalance | Self::IncomeStatement => requested,
        }
    }
}

/// One member entity's share of a consolidated line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityBalance {
    /// Member entity.
    pub entity_id: EntityId,
    /// Debit total for the range.
    pub total_debit: Decimal,
    /// Credit total for the range.
    pub total_credit: Decimal,
    /// Net under the account type's sign convention.
    pub balance: Decimal,
}

/// One account, matched across members by code and type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedLine {
    /// Account code; empty on the synthetic "Current earnings" line.
    pub code: String,
    /// Account name, taken from the first member holding the code.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Debit total across members.
    pub total_debit: Decimal,
    /// Credit total across members.
    pub total_credit: Decimal,
    /// Net balance across members.
    pub balance: Decimal,
    /// Per-member figures, ordered by entity ID.
    pub breakdown: Vec<EntityBalance>,
}

/// Report-level totals.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConsolidatedTotals {
    /// Sum of line debits.
    pub total_debit: Decimal,
    /// Sum of line credits.
    pub total_credit: Decimal,
    /// Debits equal credits within tolerance.
    pub is_balanced: bool,
    /// Revenue minus expense over the report's activity.
    pub net_income: Decimal,
}

/// A consolidated statement for one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedReport {
    /// Group reported on.
    pub group_id: ConsolidationGroupId,
    /// Statement produced.
    pub kind: ConsolidatedReportKind,
    /// Activity range actually used.
    pub range: DateRange,
    /// Members at generation time.
    pub members: BTreeSet<EntityId>,
    /// Lines ordered by account code, then type.
    pub lines: Vec<ConsolidatedLine>,
    /// Totals.
    pub totals: ConsolidatedTotals,
    /// Generation timestamp.
    pub generated_at: DateTime<Utc>,
}
