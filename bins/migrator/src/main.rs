//! Database migration runner for Tally.
//!
//! Usage:
//!   migrator up      - Run all pending migrations (default)
//!   migrator down    - Roll back the last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations
//!
//! The connection comes from `AppConfig` (`config/` files and
//! `TALLY__DATABASE__URL`).

use anyhow::{Context, bail};
use sea_orm_migration::MigratorTrait;
use tally_db::{Migrator, connect_with};
use tally_shared::AppConfig;
use tally_shared::config::{LogFormat, LoggingConfig};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());
    let db = connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;

    match command.as_str() {
        "up" => Migrator::up(&db, None).await?,
        "down" => Migrator::down(&db, Some(1)).await?,
        "status" => Migrator::status(&db).await?,
        "fresh" => Migrator::fresh(&db).await?,
        other => bail!("Unknown command `{other}` (expected up, down, status or fresh)"),
    }

    info!(%command, "Migration command finished");
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
