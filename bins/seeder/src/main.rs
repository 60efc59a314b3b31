//! Database seeder for Tally development and testing.
//!
//! Seeds a demo client with two entities, a small chart of accounts, posted
//! and draft journal entries, a batch import, and a consolidation group.
//! Everything goes through the ledger engine, so the seeded data obeys the
//! same rules as real traffic.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_core::LedgerEngine;
use tally_core::batch::{BatchLineInput, BatchRow};
use tally_core::engine::{CreateAccount, CreateConsolidationGroup, CreateEntry};
use tally_core::ledger::{Account, AccountType, EntityScope, LedgerEntity, LineInput, SubledgerKind};
use tally_core::reports::ReportOptions;
use tally_core::store::LedgerStore;
use tally_core::workflow::{Actor, ActorRole};
use tally_db::{DbAuditSink, SeaOrmLedgerStore, connect_with};
use tally_shared::AppConfig;
use tally_shared::config::{LogFormat, LoggingConfig};
use tally_shared::types::{ClientId, EntityId, UserId};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

type Engine = LedgerEngine<SeaOrmLedgerStore, DbAuditSink>;

/// Demo client (consistent across runs).
const DEMO_CLIENT_ID: ClientId = ClientId::from_uuid(Uuid::from_u128(1));
/// Demo seeding user.
const DEMO_USER_ID: UserId = UserId::from_uuid(Uuid::from_u128(2));
/// Trading entity.
const TRADING_ENTITY_ID: EntityId = EntityId::from_uuid(Uuid::from_u128(11));
/// Services entity.
const SERVICES_ENTITY_ID: EntityId = EntityId::from_uuid(Uuid::from_u128(12));

/// Code, name, type, subtype, subledger.
const CHART: &[(&str, &str, AccountType, Option<&str>, Option<SubledgerKind>)] = &[
    ("1000", "Cash at Bank", AccountType::Asset, Some("cash"), None),
    ("1100", "Accounts Receivable", AccountType::Asset, Some("current"), Some(SubledgerKind::Receivable)),
    ("2000", "Accounts Payable", AccountType::Liability, Some("current"), Some(SubledgerKind::Payable)),
    ("3000", "Owner's Capital", AccountType::Equity, None, None),
    ("4000", "Sales", AccountType::Revenue, None, None),
    ("5000", "Cost of Sales", AccountType::Expense, None, None),
    ("6000", "Rent", AccountType::Expense, Some("operating"), None),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    let db = connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;
    let store = Arc::new(SeaOrmLedgerStore::new(db.clone()));
    let engine = LedgerEngine::new(Arc::clone(&store), Arc::new(DbAuditSink::new(db)), config.ledger);
    let admin = Actor::new(DEMO_USER_ID, ActorRole::Admin);

    if store.get_entity(TRADING_ENTITY_ID).await?.is_some() {
        info!(client_id = %DEMO_CLIENT_ID, "Demo data already exists, skipping");
        return Ok(());
    }

    info!("Seeding entities...");
    let trading = seed_entity(&store, TRADING_ENTITY_ID, "Demo Trading Co").await?;
    let services = seed_entity(&store, SERVICES_ENTITY_ID, "Demo Services Ltd").await?;

    info!("Seeding charts of accounts...");
    let trading_chart = seed_chart(&engine, &admin, trading).await?;
    let services_chart = seed_chart(&engine, &admin, services).await?;

    info!("Seeding journal entries...");
    seed_entries(&engine, &admin, trading, &trading_chart, dec!(50000)).await?;
    seed_entries(&engine, &admin, services, &services_chart, dec!(20000)).await?;

    info!("Seeding batch import...");
    seed_batch(&engine, &admin, trading, &trading_chart).await?;

    info!("Seeding consolidation group...");
    let group = engine
        .create_consolidation_group(
            &admin,
            DEMO_CLIENT_ID,
            CreateConsolidationGroup {
                name: "Demo Holdings".into(),
                currency: "USD".into(),
                period_start: date(2026, 1, 1),
                period_end: date(2026, 12, 31),
                members: vec![trading.entity_id, services.entity_id],
            },
        )
        .await?;

    let tb = engine
        .trial_balance(&admin, trading, None, date(2026, 12, 31), ReportOptions::default())
        .await?;
    info!(
        group_id = %group.id,
        total_debit = %tb.totals.total_debit,
        total_credit = %tb.totals.total_credit,
        balanced = tb.totals.is_balanced,
        "Seeding complete"
    );
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// Entities are inserted under fixed IDs so reruns can detect them.
async fn seed_entity(store: &SeaOrmLedgerStore, id: EntityId, name: &str) -> anyhow::Result<EntityScope> {
    store
        .insert_entity(&LedgerEntity {
            id,
            client_id: DEMO_CLIENT_ID,
            name: name.to_string(),
            currency: "USD".to_string(),
            created_at: Utc::now(),
        })
        .await?;
    Ok(EntityScope::new(DEMO_CLIENT_ID, id))
}

async fn seed_chart(engine: &Engine, admin: &Actor, scope: EntityScope) -> anyhow::Result<Vec<Account>> {
    let mut accounts = Vec::with_capacity(CHART.len());
    for &(code, name, account_type, subtype, subledger) in CHART {
        let account = engine
            .create_account(
                admin,
                scope,
                CreateAccount {
                    code: code.into(),
                    name: name.into(),
                    account_type,
                    subtype: subtype.map(str::to_string),
                    parent_id: None,
                    subledger,
                },
            )
            .await?;
        accounts.push(account);
    }
    Ok(accounts)
}

fn by_code<'a>(chart: &'a [Account], code: &str) -> anyhow::Result<&'a Account> {
    chart
        .iter()
        .find(|a| a.code == code)
        .with_context(|| format!("account {code} missing from seeded chart"))
}

/// Posts opening capital, a credit sale, its settlement, and rent; leaves a
/// purchase as a draft.
async fn seed_entries(
    engine: &Engine,
    admin: &Actor,
    scope: EntityScope,
    chart: &[Account],
    capital: Decimal,
) -> anyhow::Result<()> {
    let cash = by_code(chart, "1000")?;
    let receivable = by_code(chart, "1100")?;
    let payable = by_code(chart, "2000")?;
    let equity = by_code(chart, "3000")?;
    let sales = by_code(chart, "4000")?;
    let cost = by_code(chart, "5000")?;
    let rent = by_code(chart, "6000")?;

    let sale = capital / dec!(5);
    let posted = [
        (date(2026, 1, 2), "Owner capital injection", cash, equity, capital),
        (date(2026, 1, 15), "Invoice to customer", receivable, sales, sale),
        (date(2026, 2, 1), "Customer settlement", cash, receivable, sale),
        (date(2026, 2, 5), "February rent", rent, cash, dec!(1500)),
    ];
    for (entry_date, description, debit, credit, amount) in posted {
        let draft = engine
            .create_entry(
                admin,
                scope,
                CreateEntry {
                    entry_date,
                    reference_number: None,
                    description: description.into(),
                    lines: vec![
                        LineInput::debit(debit.id, amount),
                        LineInput::credit(credit.id, amount),
                    ],
                },
            )
            .await?;
        engine.request_approval(admin, scope, draft.id).await?;
        engine.approve(admin, scope, draft.id).await?;
        engine.post(admin, scope, draft.id).await?;
    }

    engine
        .create_entry(
            admin,
            scope,
            CreateEntry {
                entry_date: date(2026, 2, 20),
                reference_number: Some("PO-1001".into()),
                description: "Stock purchase on account".into(),
                lines: vec![
                    LineInput::debit(cost.id, dec!(3200)).with_description("Inventory"),
                    LineInput::credit(payable.id, dec!(3200)),
                ],
            },
        )
        .await?;
    Ok(())
}

/// Imports a small spreadsheet-style batch, including one malformed row.
async fn seed_batch(engine: &Engine, admin: &Actor, scope: EntityScope, chart: &[Account]) -> anyhow::Result<()> {
    let cash = by_code(chart, "1000")?;
    let sales = by_code(chart, "4000")?;

    let rows = ["125.00", "89.50", "12,x", "310.25"]
        .into_iter()
        .enumerate()
        .map(|(i, amount)| BatchRow {
            entry_date: date(2026, 3, 1),
            reference: Some(format!("POS-{}", i + 1)),
            description: "Point of sale takings".into(),
            lines: vec![
                BatchLineInput::new(cash.id, amount, ""),
                BatchLineInput::new(sales.id, "", amount),
            ],
        })
        .collect();

    let result = engine.create_batch(admin, scope, rows).await?;
    info!(
        imported = result.success_count,
        failed = result.failures.len(),
        "Batch import finished"
    );
    Ok(())
}
