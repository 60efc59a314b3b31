//! Engine scenarios for financial reports.

mod common;

use rust_decimal_macros::dec;
use tally_core::ledger::{Account, AccountType, EntityScope};
use tally_core::reports::{GeneralLedgerOptions, ReportOptions};
use tally_core::workflow::{ActorRole, EntryStatus};
use tally_core::ErrorKind;
use tally_shared::types::AccountId;

use common::{Harness, actor, date, pair};

struct Books {
    scope: EntityScope,
    cash: Account,
    rent: Account,
}

/// Owner invests 1000 in January; February earns 300 and pays 120 rent,
/// with a further 50 of rent still in draft.
async fn books(h: &Harness) -> Books {
    let scope = h.entity("Shop").await;
    let cash = h.account(scope, "1000", AccountType::Asset, Some("cash")).await;
    let capital = h.account(scope, "3000", AccountType::Equity, None).await;
    let sales = h.account(scope, "4000", AccountType::Revenue, None).await;
    let rent = h.account(scope, "6000", AccountType::Expense, None).await;
    h.account(scope, "2000", AccountType::Liability, None).await;

    h.posted(scope, date(2026, 1, 5), pair(&cash, &capital, dec!(1000))).await;
    h.posted(scope, date(2026, 2, 3), pair(&cash, &sales, dec!(300))).await;
    h.posted(scope, date(2026, 2, 10), pair(&rent, &cash, dec!(120))).await;
    h.draft(scope, date(2026, 2, 20), pair(&rent, &cash, dec!(50))).await;

    Books { scope, cash, rent }
}

#[tokio::test]
async fn test_trial_balance_period_and_cumulative() {
    let h = Harness::new();
    let b = books(&h).await;

    let february = h
        .engine
        .trial_balance(&h.admin, b.scope, Some(date(2026, 2, 1)), date(2026, 2, 28), ReportOptions::default())
        .await
        .unwrap();
    let cash = february.accounts.iter().find(|a| a.code == "1000").unwrap();
    assert_eq!((cash.total_debit, cash.total_credit), (dec!(300), dec!(120)));
    assert_eq!(february.totals.total_debit, dec!(420));
    assert!(february.totals.is_balanced);

    let cumulative = h
        .engine
        .trial_balance(&h.admin, b.scope, None, date(2026, 2, 28), ReportOptions::default())
        .await
        .unwrap();
    let cash = cumulative.accounts.iter().find(|a| a.code == "1000").unwrap();
    assert_eq!(cash.balance, dec!(1180));
    assert_eq!(cumulative.totals.total_debit, cumulative.totals.total_credit);

    let trimmed = h
        .engine
        .trial_balance(
            &h.admin,
            b.scope,
            None,
            date(2026, 2, 28),
            ReportOptions {
                include_zero_balances: false,
                ..ReportOptions::default()
            },
        )
        .await
        .unwrap();
    assert!(trimmed.accounts.iter().all(|a| a.code != "2000"));
}

#[tokio::test]
async fn test_balance_sheet_carries_current_earnings() {
    let h = Harness::new();
    let b = books(&h).await;

    let report = h
        .engine
        .balance_sheet(&h.admin, b.scope, date(2026, 2, 28), ReportOptions::default())
        .await
        .unwrap();

    assert_eq!(report.total_assets, dec!(1180));
    assert_eq!(report.current_earnings, dec!(180));
    assert_eq!(report.total_equity, dec!(1180));
    assert!(report.is_balanced);

    let january = h
        .engine
        .balance_sheet(&h.admin, b.scope, date(2026, 1, 31), ReportOptions::default())
        .await
        .unwrap();
    assert_eq!(january.total_assets, dec!(1000));
    assert_eq!(january.current_earnings, dec!(0));
}

#[tokio::test]
async fn test_income_statement_draft_toggle() {
    let h = Harness::new();
    let b = books(&h).await;

    let posted_only = h
        .engine
        .income_statement(&h.admin, b.scope, date(2026, 2, 1), date(2026, 2, 28), ReportOptions::default())
        .await
        .unwrap();
    assert_eq!(posted_only.revenue.total, dec!(300));
    assert_eq!(posted_only.expenses.total, dec!(120));
    assert_eq!(posted_only.net_income, dec!(180));

    let with_drafts = h
        .engine
        .income_statement(
            &h.admin,
            b.scope,
            date(2026, 2, 1),
            date(2026, 2, 28),
            ReportOptions {
                include_drafts: true,
                ..ReportOptions::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(with_drafts.net_income, dec!(130));
}

#[tokio::test]
async fn test_cash_flow_running_balance() {
    let h = Harness::new();
    let b = books(&h).await;

    let report = h
        .engine
        .cash_flow(&h.admin, b.scope, date(2026, 2, 1), date(2026, 2, 28), None, ReportOptions::default())
        .await
        .unwrap();

    assert_eq!(report.cash_accounts, vec![b.cash.id]);
    assert_eq!(report.opening_balance, dec!(1000));
    assert_eq!(report.total_inflows, dec!(300));
    assert_eq!(report.total_outflows, dec!(120));
    assert_eq!(report.closing_balance, dec!(1180));
    let running: Vec<_> = report.movements.iter().map(|m| m.running_balance).collect();
    assert_eq!(running, vec![dec!(1300), dec!(1180)]);

    let err = h
        .engine
        .cash_flow(
            &h.admin,
            b.scope,
            date(2026, 2, 1),
            date(2026, 2, 28),
            Some(vec![AccountId::new()]),
            ReportOptions::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_general_ledger_filters() {
    let h = Harness::new();
    let b = books(&h).await;

    let report = h
        .engine
        .general_ledger(
            &h.admin,
            b.scope,
            Some(date(2026, 2, 1)),
            date(2026, 2, 28),
            GeneralLedgerOptions {
                account_ids: Some(vec![b.rent.id]),
                ..GeneralLedgerOptions::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(report.accounts.len(), 1);
    let rent = &report.accounts[0];
    assert_eq!(rent.opening_balance, dec!(0));
    assert_eq!(rent.closing_balance, dec!(120));
    assert_eq!(rent.lines.len(), 1);

    let drafts_only = h
        .engine
        .general_ledger(
            &h.admin,
            b.scope,
            None,
            date(2026, 2, 28),
            GeneralLedgerOptions {
                statuses: Some(vec![EntryStatus::Draft]),
                ..GeneralLedgerOptions::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(drafts_only.statuses, vec![EntryStatus::Draft]);
    let codes: Vec<&str> = drafts_only.accounts.iter().map(|a| a.code.as_str()).collect();
    assert_eq!(codes, vec!["1000", "6000"]);

    let cash = h
        .engine
        .general_ledger(&h.admin, b.scope, Some(date(2026, 2, 1)), date(2026, 2, 28), GeneralLedgerOptions::default())
        .await
        .unwrap();
    let cash = cash.accounts.iter().find(|a| a.account_id == b.cash.id).unwrap();
    assert_eq!(cash.opening_balance, dec!(1000));
    assert_eq!(cash.lines.last().unwrap().running_balance, dec!(1180));
}

#[tokio::test]
async fn test_report_range_and_access() {
    let h = Harness::new();
    let b = books(&h).await;

    let err = h
        .engine
        .income_statement(&h.admin, b.scope, date(2026, 3, 1), date(2026, 2, 1), ReportOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let viewer = actor(ActorRole::Viewer);
    assert!(
        h.engine
            .trial_balance(&viewer, b.scope, None, date(2026, 2, 28), ReportOptions::default())
            .await
            .is_ok()
    );
}
