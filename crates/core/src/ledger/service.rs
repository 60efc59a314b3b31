//! Ledger service: line and header checks run before anything is persisted.

use tally_shared::types::{AccountId, EntityId};

use super::accounts::Account;
use super::error::LedgerError;
use super::reference::MAX_REFERENCE_LEN;
use super::types::{BalanceCheck, BalanceTotals, LineInput};
use super::validation::{check_balance, is_valid_line_amount, require_balanced};

/// Information about an account needed for line validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountInfo {
    /// The account ID.
    pub id: AccountId,
    /// Owning entity.
    pub entity_id: EntityId,
    /// Whether the account is active.
    pub is_active: bool,
}

impl From<&Account> for AccountInfo {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            entity_id: account.entity_id,
            is_active: account.is_active,
        }
    }
}

/// Ledger service for entry validation.
///
/// Pure business logic; account lookup is supplied by the caller.
pub struct LedgerService;

impl LedgerService {
    /// Validates a complete line set for a new entry or a full replacement.
    ///
    /// Steps:
    /// 1. Every line has a positive amount and there is at least one line
    /// 2. Every account exists, belongs to `entity_id`, and is active
    /// 3. Debits equal credits within tolerance
    ///
    /// # Errors
    ///
    /// Returns the first `LedgerError` encountered.
    pub fn validate_lines<A>(
        entity_id: EntityId,
        lines: &[LineInput],
        account_lookup: A,
    ) -> Result<BalanceTotals, LedgerError>
    where
        A: Fn(AccountId) -> Option<AccountInfo>,
    {
        check_balance(lines)?;
        Self::validate_accounts(entity_id, lines, &account_lookup)?;
        require_balanced(lines)
    }

    /// Validates a single line being added to or edited on a draft.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` or an account error.
    pub fn validate_line<A>(
        entity_id: EntityId,
        line_index: usize,
        line: &LineInput,
        account_lookup: A,
    ) -> Result<(), LedgerError>
    where
        A: Fn(AccountId) -> Option<AccountInfo>,
    {
        if !is_valid_line_amount(line.amount) {
            return Err(LedgerError::InvalidAmount {
                line_index,
                amount: line.amount,
            });
        }
        Self::validate_accounts(entity_id, std::slice::from_ref(line), &account_lookup)
    }

    /// Checks that every referenced account is usable by `entity_id`.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `AccountEntityMismatch`, or `AccountInactive`.
    pub fn validate_accounts<A>(
        entity_id: EntityId,
        lines: &[LineInput],
        account_lookup: &A,
    ) -> Result<(), LedgerError>
    where
        A: Fn(AccountId) -> Option<AccountInfo>,
    {
        for line in lines {
            let info =
                account_lookup(line.account_id).ok_or(LedgerError::AccountNotFound(line.account_id))?;
            if info.entity_id != entity_id {
                return Err(LedgerError::AccountEntityMismatch(line.account_id));
            }
            if !info.is_active {
                return Err(LedgerError::AccountInactive(line.account_id));
            }
        }
        Ok(())
    }

    /// Validates header text fields.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` for a blank description or a blank explicit
    /// reference, and `ReferenceTooLong` for an oversized one.
    pub fn validate_header(reference: Option<&str>, description: &str) -> Result<(), LedgerError> {
        if description.trim().is_empty() {
            return Err(LedgerError::MissingField("description"));
        }
        reference.map_or(Ok(()), Self::validate_reference)
    }

    /// Validates an explicit reference number.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` when blank and `ReferenceTooLong` past
    /// [`MAX_REFERENCE_LEN`] characters once trimmed.
    pub fn validate_reference(reference: &str) -> Result<(), LedgerError> {
        let trimmed = reference.trim();
        if trimmed.is_empty() {
            return Err(LedgerError::MissingField("reference_number"));
        }
        let length = trimmed.chars().count();
        if length > MAX_REFERENCE_LEN {
            return Err(LedgerError::ReferenceTooLong { length });
        }
        Ok(())
    }

    /// Validates that a line may be removed from an entry holding `line_count` lines.
    ///
    /// # Errors
    ///
    /// Returns `LastLineRemoval` when only one line remains.
    pub fn validate_line_removal(line_count: usize) -> Result<(), LedgerError> {
        if line_count <= 1 {
            return Err(LedgerError::LastLineRemoval);
        }
        Ok(())
    }

    /// Computes totals after a line edit; an unbalanced result is reported, not rejected.
    ///
    /// # Errors
    ///
    /// Returns `NoLines` or `InvalidAmount`.
    pub fn totals_after_edit(lines: &[LineInput]) -> Result<BalanceCheck, LedgerError> {
        check_balance(lines)
    }
}
