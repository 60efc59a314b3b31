//! Tests for the reports module.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_shared::types::{AccountId, DateRange, EntityId, JournalEntryId, JournalLineId};

use super::service::ReportService;
use super::types::ReportOptions;
use crate::ledger::{Account, AccountType, EntrySide};
use crate::store::ActivityLine;
use crate::workflow::EntryStatus;

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, m, d).unwrap()
}

fn account(entity_id: EntityId, code: &str, account_type: AccountType, subtype: Option<&str>) -> Account {
    Account {
        id: AccountId::new(),
        entity_id,
        code: code.into(),
        name: format!("Account {code}"),
        account_type,
        subtype: subtype.map(str::to_string),
        parent_id: None,
        is_active: true,
        subledger: None,
        created_at: Utc::now(),
    }
}

/// Builds the two lines of a simple two-account entry.
fn entry(
    on: NaiveDate,
    reference: &str,
    debit: &Account,
    credit: &Account,
    amount: Decimal,
) -> Vec<ActivityLine> {
    let entry_id = JournalEntryId::new();
    let created_at = Utc::now();
    [(debit, EntrySide::Debit, 0), (credit, EntrySide::Credit, 1)]
        .into_iter()
        .map(|(account, side, position)| ActivityLine {
            entity_id: account.entity_id,
            entry_id,
            entry_date: on,
            reference_number: reference.into(),
            entry_description: format!("Entry {reference}"),
            status: EntryStatus::Posted,
            created_at,
            line_id: JournalLineId::new(),
            account_id: account.id,
            side,
            amount,
            line_description: None,
            position,
        })
        .collect()
}

struct Books {
    entity: EntityId,
    cash: Account,
    bank: Account,
    payable: Account,
    capital: Account,
    sales: Account,
    rent: Account,
}

impl Books {
    fn new() -> Self {
        let entity = EntityId::new();
        Self {
            entity,
            cash: account(entity, "1000", AccountType::Asset, Some("cash")),
            bank: account(entity, "1010", AccountType::Asset, Some("bank")),
            payable: account(entity, "2000", AccountType::Liability, Some("current_liability")),
            capital: account(entity, "3000", AccountType::Equity, None),
            sales: account(entity, "4000", AccountType::Revenue, None),
            rent: account(entity, "6000", AccountType::Expense, Some("operating_expense")),
        }
    }

    fn accounts(&self) -> Vec<Account> {
        vec![
            self.cash.clone(),
            self.bank.clone(),
            self.payable.clone(),
            self.capital.clone(),
            self.sales.clone(),
            self.rent.clone(),
        ]
    }

    /// Capital in January, sales and rent in February, a bill in March.
    fn activity(&self) -> Vec<ActivityLine> {
        let mut lines = Vec::new();
        lines.extend(entry(date(1, 2), "JE-1", &self.bank, &self.capital, dec!(1000)));
        lines.extend(entry(date(2, 3), "JE-2", &self.cash, &self.sales, dec!(400)));
        lines.extend(entry(date(2, 10), "JE-3", &self.rent, &self.cash, dec!(150)));
        lines.extend(entry(date(3, 1), "JE-4", &self.rent, &self.payable, dec!(75.50)));
        lines
    }
}

#[test]
fn test_trial_balance_totals_and_zero_rows() {
    let books = Books::new();
    let report = ReportService::trial_balance(
        books.entity,
        DateRange::up_to(date(12, 31)),
        &books.accounts(),
        &books.activity(),
        ReportOptions::default(),
        Utc::now(),
    );

    assert_eq!(report.accounts.len(), 6);
    assert_eq!(report.totals.total_debit, dec!(1625.50));
    assert_eq!(report.totals.total_credit, dec!(1625.50));
    assert!(report.totals.is_balanced);

    let cash = report.accounts.iter().find(|a| a.code == "1000").unwrap();
    assert_eq!(cash.balance, dec!(250));
}

#[test]
fn test_trial_balance_can_hide_zero_rows() {
    let books = Books::new();
    let report = ReportService::trial_balance(
        books.entity,
        DateRange::new(date(3, 1), date(3, 31)).unwrap(),
        &books.accounts(),
        &books.activity(),
        ReportOptions {
            include_zero_balances: false,
            ..ReportOptions::default()
        },
        Utc::now(),
    );

    let codes: Vec<&str> = report.accounts.iter().map(|a| a.code.as_str()).collect();
    assert_eq!(codes, vec!["2000", "6000"]);
}

#[test]
fn test_balance_sheet_folds_current_earnings() {
    let books = Books::new();
    let report = ReportService::balance_sheet(
        books.entity,
        date(3, 31),
        &books.accounts(),
        &books.activity(),
        ReportOptions::default(),
        Utc::now(),
    );

    assert_eq!(report.total_assets, dec!(1250));
    assert_eq!(report.total_liabilities, dec!(75.50));
    assert_eq!(report.current_earnings, dec!(174.50));
    assert_eq!(report.total_equity, dec!(1174.50));
    assert!(report.is_balanced);

    let names: Vec<&str> = report
        .assets
        .subsections
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(names, vec!["bank", "cash"]);
    assert_eq!(
        report.equity.subsections.last().map(|s| s.name.as_str()),
        Some("Current earnings")
    );
}

#[test]
fn test_balance_sheet_ignores_later_activity() {
    let books = Books::new();
    let report = ReportService::balance_sheet(
        books.entity,
        date(1, 31),
        &books.accounts(),
        &books.activity(),
        ReportOptions::default(),
        Utc::now(),
    );
    assert_eq!(report.total_assets, dec!(1000));
    assert_eq!(report.current_earnings, Decimal::ZERO);
}

#[test]
fn test_income_statement_net_income() {
    let books = Books::new();
    let report = ReportService::income_statement(
        books.entity,
        DateRange::new(date(2, 1), date(2, 28)).unwrap(),
        &books.accounts(),
        &books.activity(),
        ReportOptions::default(),
        Utc::now(),
    );
    assert_eq!(report.revenue.total, dec!(400));
    assert_eq!(report.expenses.total, dec!(150));
    assert_eq!(report.net_income, dec!(250));
}

#[test]
fn test_cash_flow_opening_and_running_balance() {
    let books = Books::new();
    let report = ReportService::cash_flow(
        books.entity,
        DateRange::new(date(2, 1), date(2, 28)).unwrap(),
        &[books.cash.clone(), books.bank.clone()],
        &books.activity(),
        Utc::now(),
    );

    assert_eq!(report.opening_balance, dec!(1000));
    assert_eq!(report.total_inflows, dec!(400));
    assert_eq!(report.total_outflows, dec!(150));
    assert_eq!(report.closing_balance, dec!(1250));
    let running: Vec<Decimal> = report.movements.iter().map(|m| m.running_balance).collect();
    assert_eq!(running, vec![dec!(1400), dec!(1250)]);
}

#[test]
fn test_general_ledger_running_balances() {
    let books = Books::new();
    let report = ReportService::general_ledger(
        books.entity,
        DateRange::new(date(2, 1), date(3, 31)).unwrap(),
        &books.accounts(),
        &books.activity(),
        vec![EntryStatus::Posted],
        false,
        Utc::now(),
    );

    let rent = report.accounts.iter().find(|a| a.code == "6000").unwrap();
    assert_eq!(rent.opening_balance, Decimal::ZERO);
    assert_eq!(rent.closing_balance, dec!(225.50));
    let running: Vec<Decimal> = rent.lines.iter().map(|l| l.running_balance).collect();
    assert_eq!(running, vec![dec!(150), dec!(225.50)]);

    let capital = report.accounts.iter().find(|a| a.code == "3000").unwrap();
    assert_eq!(capital.opening_balance, dec!(1000));
    assert!(capital.lines.is_empty());
}

fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Balanced entries always produce a balanced trial balance.
    #[test]
    fn prop_trial_balance_of_balanced_entries_balances(
        amounts in prop::collection::vec(amount(), 1..30),
        picks in prop::collection::vec((0usize..6, 0usize..6), 30),
    ) {
        let books = Books::new();
        let accounts = books.accounts();
        let activity: Vec<ActivityLine> = amounts
            .iter()
            .zip(picks.iter())
            .enumerate()
            .flat_map(|(i, (amt, (d, c)))| {
                entry(date(1, 1), &format!("JE-{i}"), &accounts[*d], &accounts[*c], *amt)
            })
            .collect();

        let report = ReportService::trial_balance(
            books.entity,
            DateRange::up_to(date(12, 31)),
            &accounts,
            &activity,
            ReportOptions::default(),
            Utc::now(),
        );

        let expected: Decimal = amounts.iter().copied().sum();
        prop_assert_eq!(report.totals.total_debit, expected);
        prop_assert_eq!(report.totals.total_credit, expected);
        prop_assert!(report.totals.is_balanced);
    }

    /// Assets always equal liabilities plus equity once earnings are folded in.
    #[test]
    fn prop_balance_sheet_equation_holds(
        amounts in prop::collection::vec(amount(), 1..30),
        picks in prop::collection::vec((0usize..6, 0usize..6), 30),
    ) {
        let books = Books::new();
        let accounts = books.accounts();
        let activity: Vec<ActivityLine> = amounts
            .iter()
            .zip(picks.iter())
            .enumerate()
            .flat_map(|(i, (amt, (d, c)))| {
                entry(date(1, 1), &format!("JE-{i}"), &accounts[*d], &accounts[*c], *amt)
            })
            .collect();

        let report = ReportService::balance_sheet(
            books.entity,
            date(12, 31),
            &accounts,
            &activity,
            ReportOptions::default(),
            Utc::now(),
        );

        prop_assert_eq!(report.total_assets, report.liabilities_and_equity);
        prop_assert!(report.is_balanced);
    }
}
