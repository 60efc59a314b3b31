//! Chart of accounts: account types, sign conventions, and hierarchy rules.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, EntityId};

use super::error::LedgerError;

/// Account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Resources owned.
    Asset,
    /// Obligations owed.
    Liability,
    /// Owner's residual interest.
    Equity,
    /// Income earned.
    Revenue,
    /// Costs incurred.
    Expense,
}

impl AccountType {
    /// Returns the type as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        }
    }

    /// Parses a type from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asset" => Some(Self::Asset),
            "liability" => Some(Self::Liability),
            "equity" => Some(Self::Equity),
            "revenue" => Some(Self::Revenue),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Returns the side that increases this account.
    #[must_use]
    pub const fn normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalBalance::Credit,
        }
    }

    /// Returns true for asset, liability, and equity accounts.
    #[must_use]
    pub const fn is_balance_sheet(self) -> bool {
        matches!(self, Self::Asset | Self::Liability | Self::Equity)
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sign convention of an account type.
///
/// - Asset/Expense: balance += debit - credit (debit-normal)
/// - Liability/Equity/Revenue: balance += credit - debit (credit-normal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalBalance {
    /// Debit-normal accounts (Asset, Expense).
    Debit,
    /// Credit-normal accounts (Liability, Equity, Revenue).
    Credit,
}

impl NormalBalance {
    /// Calculates the balance change for the given debit and credit amounts.
    #[must_use]
    pub fn balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }
}

/// Subsidiary ledger an account controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubledgerKind {
    /// Accounts receivable.
    Receivable,
    /// Accounts payable.
    Payable,
}

impl SubledgerKind {
    /// Returns the kind as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Receivable => "receivable",
            Self::Payable => "payable",
        }
    }

    /// Parses a kind from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "receivable" => Some(Self::Receivable),
            "payable" => Some(Self::Payable),
            _ => None,
        }
    }
}

/// Subtypes the cash flow report treats as cash.
pub const CASH_SUBTYPES: [&str; 2] = ["cash", "bank"];

/// A chart of accounts entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Owning entity.
    pub entity_id: EntityId,
    /// Code, unique per entity.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
    /// Free-form subtype label such as `cash` or `operating_expense`.
    pub subtype: Option<String>,
    /// Parent account in the same entity.
    pub parent_id: Option<AccountId>,
    /// Inactive accounts cannot receive new lines.
    pub is_active: bool,
    /// Subledger marker.
    pub subledger: Option<SubledgerKind>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Returns true if the cash flow report should treat this account as cash.
    #[must_use]
    pub fn is_cash(&self) -> bool {
        self.subtype
            .as_deref()
            .is_some_and(|s| CASH_SUBTYPES.contains(&s))
    }
}

/// Account with its children, for hierarchical display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountNode {
    /// The account.
    pub account: Account,
    /// Direct children ordered by code.
    pub children: Vec<AccountNode>,
}

/// Longest account code, matching the `accounts.code` column.
pub const MAX_ACCOUNT_CODE_LEN: usize = 20;

/// Hierarchy and uniqueness rules for the chart of accounts.
pub struct AccountDirectory;

impl AccountDirectory {
    /// Validates an account code: non-blank, no whitespace, at most
    /// [`MAX_ACCOUNT_CODE_LEN`] characters.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccountCode` otherwise.
    pub fn validate_code(code: &str) -> Result<(), LedgerError> {
        if code.is_empty() || code.chars().count() > MAX_ACCOUNT_CODE_LEN || code.chars().any(char::is_whitespace) {
            return Err(LedgerError::InvalidAccountCode(code.to_string()));
        }
        Ok(())
    }

    /// Validates that `parent_id` may become the parent of `account_id`.
    ///
    /// `existing` is every account of the owning entity. The parent must
    /// exist in that entity and must not be the account itself or one of
    /// its descendants.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParent` or `AccountCycle`.
    pub fn validate_parent(
        account_id: AccountId,
        entity_id: EntityId,
        parent_id: AccountId,
        existing: &[Account],
    ) -> Result<(), LedgerError> {
        let by_id: HashMap<AccountId, &Account> = existing.iter().map(|a| (a.id, a)).collect();

        let parent = by_id
            .get(&parent_id)
            .filter(|p| p.entity_id == entity_id)
            .ok_or(LedgerError::InvalidParent(parent_id))?;

        let mut seen = HashSet::new();
        let mut cursor = Some(parent.id);
        while let Some(current) = cursor {
            if current == account_id || !seen.insert(current) {
                return Err(LedgerError::AccountCycle(account_id));
            }
            cursor = by_id.get(&current).and_then(|a| a.parent_id);
        }

        Ok(())
    }

    /// Builds the account forest, roots and children ordered by code.
    ///
    /// Accounts whose parent is missing from the input are treated as roots.
    #[must_use]
    pub fn build_tree(accounts: &[Account]) -> Vec<AccountNode> {
        let ids: HashSet<AccountId> = accounts.iter().map(|a| a.id).collect();
        let mut children: HashMap<AccountId, Vec<&Account>> = HashMap::new();
        let mut roots = Vec::new();

        for account in accounts {
            match account.parent_id {
                Some(parent) if ids.contains(&parent) => {
                    children.entry(parent).or_default().push(account);
                }
                _ => roots.push(account),
            }
        }

        roots.sort_by(|a, b| a.code.cmp(&b.code));
        roots
            .into_iter()
            .map(|root| Self::build_node(root, &children))
            .collect()
    }

    fn build_node(account: &Account, children: &HashMap<AccountId, Vec<&Account>>) -> AccountNode {
        let mut kids: Vec<&Account> = children.get(&account.id).cloned().unwrap_or_default();
        kids.sort_by(|a, b| a.code.cmp(&b.code));
        AccountNode {
            account: account.clone(),
            children: kids
                .into_iter()
                .map(|child| Self::build_node(child, children))
                .collect(),
        }
    }
}
