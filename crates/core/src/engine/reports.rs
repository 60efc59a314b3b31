//! Read-only report projections for one entity.

use chrono::{NaiveDate, Utc};
use tally_shared::types::{AccountId, DateRange};
use tracing::instrument;

use super::{EngineError, LedgerEngine};
use crate::ledger::{Account, EntityScope};
use crate::reports::{
    BalanceSheetReport, CashFlowReport, GeneralLedgerOptions, GeneralLedgerReport,
    IncomeStatementReport, ReportError, ReportOptions, ReportService, TrialBalanceReport,
};
use crate::store::{ActivityLine, ActivityQuery, AuditSink, LedgerStore};
use crate::workflow::{Actor, EntryStatus, Operation};

fn report_range(start: Option<NaiveDate>, end: NaiveDate) -> Result<DateRange, EngineError> {
    DateRange::from_bounds(start, end).map_err(|e| ReportError::from(e).into())
}

impl<S: LedgerStore, A: AuditSink> LedgerEngine<S, A> {
    /// Trial balance over `[start, end]`, or everything up to `end`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` or `EntityNotFound`.
    #[instrument(skip_all, fields(entity_id = %scope.entity_id))]
    pub async fn trial_balance(
        &self,
        actor: &Actor,
        scope: EntityScope,
        start: Option<NaiveDate>,
        end: NaiveDate,
        options: ReportOptions,
    ) -> Result<TrialBalanceReport, EngineError> {
        self.guarded(actor, scope.client_id, Some(scope.entity_id), Operation::Read, None, async move {
            let range = report_range(start, end)?;
            let (accounts, activity) = self.report_inputs(scope, range, options.statuses()).await?;
            Ok(ReportService::trial_balance(
                scope.entity_id,
                range,
                &accounts,
                &activity,
                options,
                Utc::now(),
            ))
        })
        .await
    }

    /// Balance sheet as of a date.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound`.
    #[instrument(skip_all, fields(entity_id = %scope.entity_id, %as_of))]
    pub async fn balance_sheet(
        &self,
        actor: &Actor,
        scope: EntityScope,
        as_of: NaiveDate,
        options: ReportOptions,
    ) -> Result<BalanceSheetReport, EngineError> {
        self.guarded(actor, scope.client_id, Some(scope.entity_id), Operation::Read, None, async move {
            let range = DateRange::up_to(as_of);
            let (accounts, activity) = self.report_inputs(scope, range, options.statuses()).await?;
            Ok(ReportService::balance_sheet(
                scope.entity_id,
                as_of,
                &accounts,
                &activity,
                options,
                Utc::now(),
            ))
        })
        .await
    }

    /// Income statement over a period.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` or `EntityNotFound`.
    #[instrument(skip_all, fields(entity_id = %scope.entity_id))]
    pub async fn income_statement(
        &self,
        actor: &Actor,
        scope: EntityScope,
        start: NaiveDate,
        end: NaiveDate,
        options: ReportOptions,
    ) -> Result<IncomeStatementReport, EngineError> {
        self.guarded(actor, scope.client_id, Some(scope.entity_id), Operation::Read, None, async move {
            let range = report_range(Some(start), end)?;
            let (accounts, activity) = self.report_inputs(scope, range, options.statuses()).await?;
            Ok(ReportService::income_statement(
                scope.entity_id,
                range,
                &accounts,
                &activity,
                options,
                Utc::now(),
            ))
        })
        .await
    }

    /// Cash movements over a period.
    ///
    /// Cash accounts are the given ones, or every account with subtype
    /// `cash` or `bank`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange`, `AccountNotFound` for an unknown explicit
    /// account, or `EntityNotFound`.
    #[instrument(skip_all, fields(entity_id = %scope.entity_id))]
    pub async fn cash_flow(
        &self,
        actor: &Actor,
        scope: EntityScope,
        start: NaiveDate,
        end: NaiveDate,
        cash_accounts: Option<Vec<AccountId>>,
        options: ReportOptions,
    ) -> Result<CashFlowReport, EngineError> {
        self.guarded(actor, scope.client_id, Some(scope.entity_id), Operation::Read, None, async move {
            let range = report_range(Some(start), end)?;
            self.require_entity(scope).await?;
            let chart = self.store.list_accounts(scope.entity_id).await?;

            let cash: Vec<Account> = match cash_accounts {
                Some(ids) => select_accounts(&chart, &ids)?,
                None => chart.into_iter().filter(Account::is_cash).collect(),
            };
            let ids: Vec<AccountId> = cash.iter().map(|a| a.id).collect();

            let activity = self
                .store
                .query_activity(&ActivityQuery {
                    entity_ids: vec![scope.entity_id],
                    statuses: options.statuses(),
                    range: DateRange::up_to(range.end()),
                    account_ids: Some(ids),
                })
                .await?;

            Ok(ReportService::cash_flow(scope.entity_id, range, &cash, &activity, Utc::now()))
        })
        .await
    }

    /// Line detail with running balances over a period.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange`, `AccountNotFound` for an unknown explicit
    /// account, or `EntityNotFound`.
    #[instrument(skip_all, fields(entity_id = %scope.entity_id))]
    pub async fn general_ledger(
        &self,
        actor: &Actor,
        scope: EntityScope,
        start: Option<NaiveDate>,
        end: NaiveDate,
        options: GeneralLedgerOptions,
    ) -> Result<GeneralLedgerReport, EngineError> {
        self.guarded(actor, scope.client_id, Some(scope.entity_id), Operation::Read, None, async move {
            let range = report_range(start, end)?;
            self.require_entity(scope).await?;
            let chart = self.store.list_accounts(scope.entity_id).await?;

            let explicit = options.account_ids.is_some();
            let accounts = match &options.account_ids {
                Some(ids) => select_accounts(&chart, ids)?,
                None => chart,
            };
            let statuses = options.statuses();

            let activity = self
                .store
                .query_activity(&ActivityQuery {
                    entity_ids: vec![scope.entity_id],
                    statuses: statuses.clone(),
                    range: DateRange::up_to(range.end()),
                    account_ids: options.account_ids,
                })
                .await?;

            Ok(ReportService::general_ledger(
                scope.entity_id,
                range,
                &accounts,
                &activity,
                statuses,
                explicit,
                Utc::now(),
            ))
        })
        .await
    }

    /// Loads the chart and the activity a report reads.
    async fn report_inputs(
        &self,
        scope: EntityScope,
        range: DateRange,
        statuses: Vec<EntryStatus>,
    ) -> Result<(Vec<Account>, Vec<ActivityLine>), EngineError> {
        self.require_entity(scope).await?;
        let accounts = self.store.list_accounts(scope.entity_id).await?;
        let activity = self
            .store
            .query_activity(&ActivityQuery {
                entity_ids: vec![scope.entity_id],
                statuses,
                range,
                account_ids: None,
            })
            .await?;
        Ok((accounts, activity))
    }
}

/// Picks `ids` out of the entity's chart, in the order given.
fn select_accounts(chart: &[Account], ids: &[AccountId]) -> Result<Vec<Account>, EngineError> {
    ids.iter()
        .map(|id| {
            chart
                .iter()
                .find(|a| a.id == *id)
                .cloned()
                .ok_or_else(|| ReportError::AccountNotFound(*id).into())
        })
        .collect()
}
