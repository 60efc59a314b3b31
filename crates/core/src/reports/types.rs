//! Report data types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, DateRange, EntityId, JournalEntryId};

use crate::ledger::AccountType;
use crate::workflow::EntryStatus;

/// Options shared by every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOptions {
    /// Include draft entries alongside posted ones.
    #[serde(default)]
    pub include_drafts: bool,
    /// List accounts that had no activity.
    #[serde(default = "default_true")]
    pub include_zero_balances: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            include_drafts: false,
            include_zero_balances: true,
        }
    }
}

impl ReportOptions {
    /// Entry statuses the report reads.
    #[must_use]
    pub fn statuses(&self) -> Vec<EntryStatus> {
        if self.include_drafts {
            vec![EntryStatus::Posted, EntryStatus::Draft]
        } else {
            vec![EntryStatus::Posted]
        }
    }
}

/// Account balance for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportAccountLine {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Account subtype.
    pub subtype: Option<String>,
    /// Total debit amount.
    pub total_debit: Decimal,
    /// Total credit amount.
    pub total_credit: Decimal,
    /// Net balance under the account type's sign convention.
    pub balance: Decimal,
}

/// Trial balance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceReport {
    /// Entity reported on.
    pub entity_id: EntityId,
    /// Activity range.
    pub range: DateRange,
    /// Account balances ordered by code.
    pub accounts: Vec<ReportAccountLine>,
    /// Totals.
    pub totals: TrialBalanceTotals,
    /// Generation timestamp.
    pub generated_at: DateTime<Utc>,
}

/// Trial balance totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    /// Total debit.
    pub total_debit: Decimal,
    /// Total credit.
    pub total_credit: Decimal,
    /// Whether debits equal credits within tolerance.
    pub is_balanced: bool,
}

/// A titled group of accounts with a subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSubsection {
    /// Subtype label, `other` when the account has none.
    pub name: String,
    /// Subsection total.
    pub total: Decimal,
    /// Accounts in this subsection.
    pub accounts: Vec<ReportAccountLine>,
}

/// A statement section (assets, liabilities, equity, revenue, expenses).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportSection {
    /// Section total.
    pub total: Decimal,
    /// Subsections ordered by name.
    pub subsections: Vec<ReportSubsection>,
}

/// Balance sheet report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheetReport {
    /// Entity reported on.
    pub entity_id: EntityId,
    /// As-of date.
    pub as_of: NaiveDate,
    /// Assets section.
    pub assets: ReportSection,
    /// Liabilities section.
    pub liabilities: ReportSection,
    /// Equity section, including the current earnings subsection.
    pub equity: ReportSection,
    /// Revenue minus expense up to the as-of date.
    pub current_earnings: Decimal,
    /// Total assets.
    pub total_assets: Decimal,
    /// Total liabilities.
    pub total_liabilities: Decimal,
    /// Total equity, current earnings included.
    pub total_equity: Decimal,
    /// Liabilities plus equity.
    pub liabilities_and_equity: Decimal,
    /// Whether assets equal liabilities plus equity within tolerance.
    pub is_balanced: bool,
    /// Generation timestamp.
    pub generated_at: DateTime<Utc>,
}

/// Income statement report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeStatementReport {
    /// Entity reported on.
    pub entity_id: EntityId,
    /// Period.
    pub range: DateRange,
    /// Revenue section.
    pub revenue: ReportSection,
    /// Expense section.
    pub expenses: ReportSection,
    /// Revenue total minus expense total.
    pub net_income: Decimal,
    /// Generation timestamp.
    pub generated_at: DateTime<Utc>,
}

/// One line of cash movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashMovement {
    /// Entry ID.
    pub entry_id: JournalEntryId,
    /// Entry date.
    pub entry_date: NaiveDate,
    /// Entry reference.
    pub reference_number: String,
    /// Entry description.
    pub description: String,
    /// Cash account moved.
    pub account_id: AccountId,
    /// Debit to cash.
    pub inflow: Decimal,
    /// Credit to cash.
    pub outflow: Decimal,
    /// Cash balance after this line.
    pub running_balance: Decimal,
}

/// Cash flow report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowReport {
    /// Entity reported on.
    pub entity_id: EntityId,
    /// Period.
    pub range: DateRange,
    /// Accounts treated as cash.
    pub cash_accounts: Vec<AccountId>,
    /// Cash balance before the period.
    pub opening_balance: Decimal,
    /// Sum of inflows in the period.
    pub total_inflows: Decimal,
    /// Sum of outflows in the period.
    pub total_outflows: Decimal,
    /// Cash balance at period end.
    pub closing_balance: Decimal,
    /// Chronological movements.
    pub movements: Vec<CashMovement>,
    /// Generation timestamp.
    pub generated_at: DateTime<Utc>,
}

/// General ledger filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralLedgerOptions {
    /// Restrict to these accounts.
    pub account_ids: Option<Vec<AccountId>>,
    /// Explicit status set; overrides the posted/draft default.
    pub statuses: Option<Vec<EntryStatus>>,
    /// Include drafts when no explicit status set is given.
    #[serde(default)]
    pub include_drafts: bool,
}

impl GeneralLedgerOptions {
    /// Entry statuses the report reads.
    #[must_use]
    pub fn statuses(&self) -> Vec<EntryStatus> {
        self.statuses.clone().unwrap_or_else(|| {
            ReportOptions {
                include_drafts: self.include_drafts,
                include_zero_balances: true,
            }
            .statuses()
        })
    }
}

/// One line of general ledger detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLine {
    /// Entry ID.
    pub entry_id: JournalEntryId,
    /// Entry date.
    pub entry_date: NaiveDate,
    /// Entry reference.
    pub reference_number: String,
    /// Entry description.
    pub description: String,
    /// Line memo.
    pub line_description: Option<String>,
    /// Entry status.
    pub status: EntryStatus,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Account balance after this line.
    pub running_balance: Decimal,
}

/// One account's ledger detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAccountSection {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Balance before the period.
    pub opening_balance: Decimal,
    /// Period debits.
    pub total_debit: Decimal,
    /// Period credits.
    pub total_credit: Decimal,
    /// Balance at period end.
    pub closing_balance: Decimal,
    /// Chronological lines.
    pub lines: Vec<LedgerLine>,
}

/// General ledger report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralLedgerReport {
    /// Entity reported on.
    pub entity_id: EntityId,
    /// Period.
    pub range: DateRange,
    /// Statuses included.
    pub statuses: Vec<EntryStatus>,
    /// Accounts ordered by code.
    pub accounts: Vec<LedgerAccountSection>,
    /// Generation timestamp.
    pub generated_at: DateTime<Utc>,
}
