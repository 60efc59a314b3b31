//! Property-based tests for reversal generation.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, ClientId, EntityId, UserId};

use crate::ledger::{AccountBalance, JournalEntry, LineInput, NewEntry};
use crate::workflow::reversal::{ReversalOptions, ReversalService};
use crate::workflow::types::EntryStatus;

fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// A posted entry over a small pool of accounts, balanced by one closing credit.
fn posted_entry(debits: &[(usize, Decimal)], accounts: &[AccountId]) -> JournalEntry {
    let mut lines: Vec<LineInput> = debits
        .iter()
        .map(|(idx, amt)| LineInput::debit(accounts[idx % accounts.len()], *amt))
        .collect();
    let total: Decimal = debits.iter().map(|(_, a)| *a).sum();
    lines.push(LineInput::credit(accounts[0], total));

    let mut entry = JournalEntry::draft(
        NewEntry {
            client_id: ClientId::new(),
            entity_id: EntityId::new(),
            entry_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            reference_number: "JE-P".into(),
            description: "prop".into(),
            created_by: UserId::new(),
        },
        lines,
        Utc::now(),
    );
    entry.status = EntryStatus::Posted;
    entry
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Original plus reversal nets to zero on every account.
    #[test]
    fn prop_reversal_nets_to_zero_per_account(
        debits in prop::collection::vec((0usize..4, amount()), 1..10),
    ) {
        let accounts: Vec<AccountId> = (0..4).map(|_| AccountId::new()).collect();
        let entry = posted_entry(&debits, &accounts);
        let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let plan = ReversalService::plan(&entry, "REV", ReversalOptions::default(), today).unwrap();

        let mut per_account: HashMap<AccountId, AccountBalance> = HashMap::new();
        for line in &entry.lines {
            per_account.entry(line.account_id).or_default().add(line.side, line.amount);
        }
        for line in &plan.lines {
            per_account.entry(line.account_id).or_default().add(line.side, line.amount);
        }

        for balance in per_account.values() {
            prop_assert_eq!(balance.total_debit, balance.total_credit);
        }
        prop_assert_eq!(plan.lines.len(), entry.lines.len());
    }

    /// Any non-posted source is refused.
    #[test]
    fn prop_only_posted_sources(status in prop::sample::select(EntryStatus::ALL.to_vec())) {
        let accounts = vec![AccountId::new()];
        let mut entry = posted_entry(&[(0, Decimal::ONE)], &accounts);
        entry.status = status;
        let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let result = ReversalService::plan(&entry, "REV", ReversalOptions::default(), today);
        prop_assert_eq!(result.is_ok(), status == EntryStatus::Posted);
    }
}
