//! Postgres enum types and their mapping to domain enums.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::ledger;
use tally_core::workflow;

/// `account_type` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
pub enum AccountType {
    /// Asset.
    #[sea_orm(string_value = "asset")]
    Asset,
    /// Liability.
    #[sea_orm(string_value = "liability")]
    Liability,
    /// Equity.
    #[sea_orm(string_value = "equity")]
    Equity,
    /// Revenue.
    #[sea_orm(string_value = "revenue")]
    Revenue,
    /// Expense.
    #[sea_orm(string_value = "expense")]
    Expense,
}

/// `entry_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_status")]
pub enum EntryStatus {
    /// Draft.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Pending approval.
    #[sea_orm(string_value = "pending_approval")]
    PendingApproval,
    /// Approved.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Rejected.
    #[sea_orm(string_value = "rejected")]
    Rejected,
    /// Posted.
    #[sea_orm(string_value = "posted")]
    Posted,
    /// Voided.
    #[sea_orm(string_value = "voided")]
    Voided,
}

/// `entry_side` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_side")]
pub enum EntrySide {
    /// Debit.
    #[sea_orm(string_value = "debit")]
    Debit,
    /// Credit.
    #[sea_orm(string_value = "credit")]
    Credit,
}

impl From<ledger::AccountType> for AccountType {
    fn from(value: ledger::AccountType) -> Self {
        match value {
            ledger::AccountType::Asset => Self::Asset,
            ledger::AccountType::Liability => Self::Liability,
            ledger::AccountType::Equity => Self::Equity,
            ledger::AccountType::Revenue => Self::Revenue,
            ledger::AccountType::Expense => Self::Expense,
        }
    }
}

impl From<AccountType> for ledger::AccountType {
    fn from(value: AccountType) -> Self {
        match value {
            AccountType::Asset => Self::Asset,
            AccountType::Liability => Self::Liability,
            AccountType::Equity => Self::Equity,
            AccountType::Revenue => Self::Revenue,
            AccountType::Expense => Self::Expense,
        }
    }
}

impl From<workflow::EntryStatus> for EntryStatus {
    fn from(value: workflow::EntryStatus) -> Self {
        match value {
            workflow::EntryStatus::Draft => Self::Draft,
            workflow::EntryStatus::PendingApproval => Self::PendingApproval,
            workflow::EntryStatus::Approved => Self::Approved,
            workflow::EntryStatus::Rejected => Self::Rejected,
            workflow::EntryStatus::Posted => Self::Posted,
            workflow::EntryStatus::Voided => Self::Voided,
        }
    }
}

impl From<EntryStatus> for workflow::EntryStatus {
    fn from(value: EntryStatus) -> Self {
        match value {
            EntryStatus::Draft => Self::Draft,
            EntryStatus::PendingApproval => Self::PendingApproval,
            EntryStatus::Approved => Self::Approved,
            EntryStatus::Rejected => Self::Rejected,
            EntryStatus::Posted => Self::Posted,
            EntryStatus::Voided => Self::Voided,
        }
    }
}

impl From<ledger::EntrySide> for EntrySide {
    fn from(value: ledger::EntrySide) -> Self {
        match value {
            ledger::EntrySide::Debit => Self::Debit,
            ledger::EntrySide::Credit => Self::Credit,
        }
    }
}

impl From<EntrySide> for ledger::EntrySide {
    fn from(value: EntrySide) -> Self {
        match value {
            EntrySide::Debit => Self::Debit,
            EntrySide::Credit => Self::Credit,
        }
    }
}
