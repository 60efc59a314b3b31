//! Consolidation Aggregator: combines member balances into one view.
//!
//! Accounts are matched across entities by `(code, type)`. Intercompany
//! balances are not eliminated. Balance sheets carry a synthetic
//! "Current earnings" equity line, as the entity-level balance sheet does.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, DateRange, EntityId};

use super::types::{
    ConsolidatedLine, ConsolidatedReport, ConsolidatedReportKind, ConsolidatedTotals,
    ConsolidationGroup, EntityBalance,
};
use crate::ledger::{Account, AccountBalance, AccountType, BALANCE_TOLERANCE};
use crate::reports::service::CURRENT_EARNINGS;
use crate::store::ActivityLine;

struct LineBuilder<'a> {
    name: &'a str,
    per_entity: BTreeMap<EntityId, AccountBalance>,
}

/// Stateless consolidation aggregator.
pub struct ConsolidationAggregator;

impl ConsolidationAggregator {
    /// Builds a consolidated report.
    ///
    /// `accounts` holds the charts of every member; `activity` holds the
    /// posted lines of every member within `range`, already narrowed with
    /// [`ConsolidatedReportKind::effective_range`]. Accounts and lines of
    /// non-members are ignored.
    #[must_use]
    pub fn aggregate(
        group: &ConsolidationGroup,
        kind: ConsolidatedReportKind,
        range: DateRange,
        accounts: &[Account],
        activity: &[ActivityLine],
        generated_at: DateTime<Utc>,
    ) -> ConsolidatedReport {
        let by_id: HashMap<AccountId, &Account> = accounts
            .iter()
            .filter(|a| group.members.contains(&a.entity_id))
            .map(|a| (a.id, a))
            .collect();

        let mut builders: BTreeMap<(String, AccountType), LineBuilder<'_>> = BTreeMap::new();
        let mut sorted: Vec<&Account> = by_id.values().copied().collect();
        sorted.sort_by(|a, b| a.code.cmp(&b.code).then_with(|| a.entity_id.cmp(&b.entity_id)));
        for account in sorted {
            if !kind.includes(account.account_type) {
                continue;
            }
            builders
                .entry((account.code.clone(), account.account_type))
                .or_insert_with(|| LineBuilder {
                    name: &account.name,
                    per_entity: BTreeMap::new(),
                })
                .per_entity
                .entry(account.entity_id)
                .or_default();
        }

        let mut all_activity = AccountBalance::default();
        let mut earnings: BTreeMap<EntityId, AccountBalance> = BTreeMap::new();
        for line in activity {
            let Some(account) = by_id.get(&line.account_id) else {
                continue;
            };
            all_activity.add(line.side, line.amount);

            if !account.account_type.is_balance_sheet() {
                earnings
                    .entry(account.entity_id)
                    .or_default()
                    .add(line.side, line.amount);
            }

            if let Some(builder) = builders.get_mut(&(account.code.clone(), account.account_type)) {
                builder
                    .per_entity
                    .entry(account.entity_id)
                    .or_default()
                    .add(line.side, line.amount);
            }
        }

        let net_income: Decimal = earnings.values().map(|b| b.net(AccountType::Revenue)).sum();
        let mut totals = ConsolidatedTotals {
            net_income,
            is_balanced: (all_activity.total_debit - all_activity.total_credit).abs()
                <= BALANCE_TOLERANCE,
            ..ConsolidatedTotals::default()
        };

        let mut lines: Vec<ConsolidatedLine> = builders
            .into_iter()
            .map(|((code, account_type), builder)| {
                let mut combined = AccountBalance::default();
                let breakdown: Vec<EntityBalance> = builder
                    .per_entity
                    .into_iter()
                    .map(|(entity_id, balance)| {
                        combined.merge(&balance);
                        EntityBalance {
                            entity_id,
                            total_debit: balance.total_debit,
                            total_credit: balance.total_credit,
                            balance: balance.net(account_type),
                        }
                    })
                    .collect();
                totals.total_debit += combined.total_debit;
                totals.total_credit += combined.total_credit;
                ConsolidatedLine {
                    code,
                    name: builder.name.to_string(),
                    account_type,
                    total_debit: combined.total_debit,
                    total_credit: combined.total_credit,
                    balance: combined.net(account_type),
                    breakdown,
                }
            })
            .collect();

        if kind == ConsolidatedReportKind::BalanceSheet && !net_income.is_zero() {
            let earnings_line = Self::current_earnings_line(&group.members, &earnings);
            totals.total_debit += earnings_line.total_debit;
            totals.total_credit += earnings_line.total_credit;
            lines.push(earnings_line);
        }

        ConsolidatedReport {
            group_id: group.id,
            kind,
            range,
            members: group.members.clone(),
            lines,
            totals,
            generated_at,
        }
    }

    /// Revenue minus expense per member, closed into equity.
    fn current_earnings_line(
        members: &BTreeSet<EntityId>,
        earnings: &BTreeMap<EntityId, AccountBalance>,
    ) -> ConsolidatedLine {
        let mut line = ConsolidatedLine {
            code: String::new(),
            name: CURRENT_EARNINGS.to_string(),
            account_type: AccountType::Equity,
            total_debit: Decimal::ZERO,
            total_credit: Decimal::ZERO,
            balance: Decimal::ZERO,
            breakdown: Vec::with_capacity(members.len()),
        };
        for &entity_id in members {
            let net = earnings
                .get(&entity_id)
                .map_or(Decimal::ZERO, |b| b.net(AccountType::Revenue));
            let (debit, credit) = if net.is_sign_negative() {
                (-net, Decimal::ZERO)
            } else {
                (Decimal::ZERO, net)
            };
            line.total_debit += debit;
            line.total_credit += credit;
            line.balance += net;
            line.breakdown.push(EntityBalance {
                entity_id,
                total_debit: debit,
                total_credit: credit,
                balance: net,
            });
        }
        line
    }
}
