//! Report generation service.
//!
//! Reports are projections over an entity's chart of accounts and the line
//! activity the store returns. Nothing here reads storage directly.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, DateRange, EntityId};

use super::types::{
    BalanceSheetReport, CashFlowReport, CashMovement, GeneralLedgerReport, IncomeStatementReport,
    LedgerAccountSection, LedgerLine, ReportAccountLine, ReportOptions, ReportSection,
    ReportSubsection, TrialBalanceReport, TrialBalanceTotals,
};
use crate::ledger::{Account, AccountBalance, AccountType, BALANCE_TOLERANCE};
use crate::store::ActivityLine;
use crate::workflow::EntryStatus;

/// Subsection name for accounts without a subtype.
const OTHER_SUBSECTION: &str = "other";

/// Subsection holding revenue minus expense on the balance sheet.
pub(crate) const CURRENT_EARNINGS: &str = "Current earnings";

/// Service for generating financial reports.
pub struct ReportService;

impl ReportService {
    /// Accumulates per-account debit and credit totals.
    #[must_use]
    pub fn balances<'a>(
        activity: impl IntoIterator<Item = &'a ActivityLine>,
    ) -> HashMap<AccountId, AccountBalance> {
        let mut balances: HashMap<AccountId, AccountBalance> = HashMap::new();
        for line in activity {
            balances
                .entry(line.account_id)
                .or_default()
                .add(line.side, line.amount);
        }
        balances
    }

    fn account_line(account: &Account, balance: AccountBalance) -> ReportAccountLine {
        ReportAccountLine {
            account_id: account.id,
            code: account.code.clone(),
            name: account.name.clone(),
            account_type: account.account_type,
            subtype: account.subtype.clone(),
            total_debit: balance.total_debit,
            total_credit: balance.total_credit,
            balance: balance.net(account.account_type),
        }
    }

    fn sorted_by_code(accounts: &[Account]) -> Vec<&Account> {
        let mut sorted: Vec<&Account> = accounts.iter().collect();
        sorted.sort_by(|a, b| a.code.cmp(&b.code));
        sorted
    }

    /// Report lines for accounts of the given types, ordered by code.
    fn lines_for(
        accounts: &[Account],
        balances: &HashMap<AccountId, AccountBalance>,
        types: &[AccountType],
        options: ReportOptions,
    ) -> Vec<ReportAccountLine> {
        Self::sorted_by_code(accounts)
            .into_iter()
            .filter(|a| types.contains(&a.account_type))
            .filter_map(|account| {
                let balance = balances.get(&account.id).copied().unwrap_or_default();
                (options.include_zero_balances || !balance.is_empty())
                    .then(|| Self::account_line(account, balance))
            })
            .collect()
    }

    /// Groups lines into subsections by subtype.
    fn section(lines: Vec<ReportAccountLine>) -> ReportSection {
        let mut groups: BTreeMap<String, Vec<ReportAccountLine>> = BTreeMap::new();
        for line in lines {
            let name = line
                .subtype
                .clone()
                .unwrap_or_else(|| OTHER_SUBSECTION.to_string());
            groups.entry(name).or_default().push(line);
        }

        let subsections: Vec<ReportSubsection> = groups
            .into_iter()
            .map(|(name, accounts)| ReportSubsection {
                name,
                total: accounts.iter().map(|a| a.balance).sum(),
                accounts,
            })
            .collect();

        ReportSection {
            total: subsections.iter().map(|s| s.total).sum(),
            subsections,
        }
    }

    /// Generates a trial balance from in-range activity.
    #[must_use]
    pub fn trial_balance(
        entity_id: EntityId,
        range: DateRange,
        accounts: &[Account],
        activity: &[ActivityLine],
        options: ReportOptions,
        generated_at: DateTime<Utc>,
    ) -> TrialBalanceReport {
        let balances = Self::balances(activity.iter().filter(|l| range.contains(l.entry_date)));
        let lines = Self::lines_for(
            accounts,
            &balances,
            &[
                AccountType::Asset,
                AccountType::Liability,
                AccountType::Equity,
                AccountType::Revenue,
                AccountType::Expense,
            ],
            options,
        );

        let total_debit: Decimal = lines.iter().map(|a| a.total_debit).sum();
        let total_credit: Decimal = lines.iter().map(|a| a.total_credit).sum();

        TrialBalanceReport {
            entity_id,
            range,
            accounts: lines,
            totals: TrialBalanceTotals {
                total_debit,
                total_credit,
                is_balanced: (total_debit - total_credit).abs() <= BALANCE_TOLERANCE,
            },
            generated_at,
        }
    }

    /// Generates a balance sheet as of `as_of`.
    ///
    /// Revenue minus expense to date is folded into equity under
    /// "Current earnings", so consistent books satisfy
    /// `assets = liabilities + equity`.
    #[must_use]
    pub fn balance_sheet(
        entity_id: EntityId,
        as_of: NaiveDate,
        accounts: &[Account],
        activity: &[ActivityLine],
        options: ReportOptions,
        generated_at: DateTime<Utc>,
    ) -> BalanceSheetReport {
        let balances = Self::balances(activity.iter().filter(|l| l.entry_date <= as_of));

        let assets = Self::section(Self::lines_for(accounts, &balances, &[AccountType::Asset], options));
        let liabilities =
            Self::section(Self::lines_for(accounts, &balances, &[AccountType::Liability], options));
        let mut equity =
            Self::section(Self::lines_for(accounts, &balances, &[AccountType::Equity], options));

        let current_earnings = Self::net_income(accounts, &balances);
        if options.include_zero_balances || !current_earnings.is_zero() {
            equity.subsections.push(ReportSubsection {
                name: CURRENT_EARNINGS.to_string(),
                total: current_earnings,
                accounts: Vec::new(),
            });
            equity.total += current_earnings;
        }

        let total_assets = assets.total;
        let total_liabilities = liabilities.total;
        let total_equity = equity.total;
        let liabilities_and_equity = total_liabilities + total_equity;

        BalanceSheetReport {
            entity_id,
            as_of,
            assets,
            liabilities,
            equity,
            current_earnings,
            total_assets,
            total_liabilities,
            total_equity,
            liabilities_and_equity,
            is_balanced: (total_assets - liabilities_and_equity).abs() <= BALANCE_TOLERANCE,
            generated_at,
        }
    }

    /// Revenue minus expense over the given balances.
    fn net_income(accounts: &[Account], balances: &HashMap<AccountId, AccountBalance>) -> Decimal {
        accounts
            .iter()
            .filter_map(|account| {
                let balance = balances.get(&account.id)?;
                match account.account_type {
                    AccountType::Revenue => Some(balance.net(AccountType::Revenue)),
                    AccountType::Expense => Some(-balance.net(AccountType::Expense)),
                    _ => None,
                }
            })
            .sum()
    }

    /// Generates an income statement over `range`.
    #[must_use]
    pub fn income_statement(
        entity_id: EntityId,
        range: DateRange,
        accounts: &[Account],
        activity: &[ActivityLine],
        options: ReportOptions,
        generated_at: DateTime<Utc>,
    ) -> IncomeStatementReport {
        let balances = Self::balances(activity.iter().filter(|l| range.contains(l.entry_date)));
        let revenue = Self::section(Self::lines_for(accounts, &balances, &[AccountType::Revenue], options));
        let expenses = Self::section(Self::lines_for(accounts, &balances, &[AccountType::Expense], options));
        let net_income = revenue.total - expenses.total;

        IncomeStatementReport {
            entity_id,
            range,
            revenue,
            expenses,
            net_income,
            generated_at,
        }
    }

    /// Generates a cash flow report.
    ///
    /// `activity` must cover the cash accounts from inception to the range
    /// end; lines before the range start form the opening balance.
    #[must_use]
    pub fn cash_flow(
        entity_id: EntityId,
        range: DateRange,
        cash_accounts: &[Account],
        activity: &[ActivityLine],
        generated_at: DateTime<Utc>,
    ) -> CashFlowReport {
        let cash_ids: Vec<AccountId> = Self::sorted_by_code(cash_accounts)
            .into_iter()
            .map(|a| a.id)
            .collect();
        let cash_lines = activity.iter().filter(|l| cash_ids.contains(&l.account_id));

        let mut opening_balance = Decimal::ZERO;
        let mut total_inflows = Decimal::ZERO;
        let mut total_outflows = Decimal::ZERO;
        let mut movements = Vec::new();

        for line in cash_lines {
            let (inflow, outflow) = line.side.columns(line.amount);
            if range.is_before_start(line.entry_date) {
                opening_balance += inflow - outflow;
                continue;
            }
            if !range.contains(line.entry_date) {
                continue;
            }
            total_inflows += inflow;
            total_outflows += outflow;
            movements.push(CashMovement {
                entry_id: line.entry_id,
                entry_date: line.entry_date,
                reference_number: line.reference_number.clone(),
                description: line.entry_description.clone(),
                account_id: line.account_id,
                inflow,
                outflow,
                running_balance: opening_balance + total_inflows - total_outflows,
            });
        }

        CashFlowReport {
            entity_id,
            range,
            cash_accounts: cash_ids,
            opening_balance,
            total_inflows,
            total_outflows,
            closing_balance: opening_balance + total_inflows - total_outflows,
            movements,
            generated_at,
        }
    }

    /// Generates general ledger detail.
    ///
    /// `activity` must cover `accounts` from inception to the range end.
    /// When `explicit_accounts` is false, accounts with no lines at all are
    /// omitted.
    #[must_use]
    pub fn general_ledger(
        entity_id: EntityId,
        range: DateRange,
        accounts: &[Account],
        activity: &[ActivityLine],
        statuses: Vec<EntryStatus>,
        explicit_accounts: bool,
        generated_at: DateTime<Utc>,
    ) -> GeneralLedgerReport {
        let mut by_account: HashMap<AccountId, Vec<&ActivityLine>> = HashMap::new();
        for line in activity {
            by_account.entry(line.account_id).or_default().push(line);
        }

        let sections = Self::sorted_by_code(accounts)
            .into_iter()
            .filter_map(|account| {
                let lines = by_account.remove(&account.id).unwrap_or_default();
                if lines.is_empty() && !explicit_accounts {
                    return None;
                }
                Some(Self::ledger_section(account, range, &lines))
            })
            .collect();

        GeneralLedgerReport {
            entity_id,
            range,
            statuses,
            accounts: sections,
            generated_at,
        }
    }

    fn ledger_section(account: &Account, range: DateRange, lines: &[&ActivityLine]) -> LedgerAccountSection {
        let sign = account.account_type.normal_balance();
        let mut opening = AccountBalance::default();
        let mut period = AccountBalance::default();
        let mut detail = Vec::new();

        for line in lines {
            if range.is_before_start(line.entry_date) {
                opening.add(line.side, line.amount);
                continue;
            }
            if !range.contains(line.entry_date) {
                continue;
            }
            period.add(line.side, line.amount);
            let (debit, credit) = line.side.columns(line.amount);
            let mut running = opening;
            running.merge(&period);
            detail.push(LedgerLine {
                entry_id: line.entry_id,
                entry_date: line.entry_date,
                reference_number: line.reference_number.clone(),
                description: line.entry_description.clone(),
                line_description: line.line_description.clone(),
                status: line.status,
                debit,
                credit,
                running_balance: sign.balance_change(running.total_debit, running.total_credit),
            });
        }

        let opening_balance = opening.net(account.account_type);
        LedgerAccountSection {
            account_id: account.id,
            code: account.code.clone(),
            name: account.name.clone(),
            account_type: account.account_type,
            opening_balance,
            total_debit: period.total_debit,
            total_credit: period.total_credit,
            closing_balance: opening_balance + period.net(account.account_type),
            lines: detail,
        }
    }
}
