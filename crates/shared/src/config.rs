//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger engine behaviour.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait when opening a new connection.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Seconds to wait for a pooled connection.
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_acquire_timeout() -> u64 {
    5
}

/// How the batch importer treats a line with positive debit and credit values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguousLinePolicy {
    /// Use the larger value's side and amount, and report a warning.
    #[default]
    FlagLarger,
    /// Fail the row.
    Reject,
}

/// Ledger engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Prefix for generated entry reference numbers.
    #[serde(default = "default_reference_prefix")]
    pub reference_prefix: String,
    /// Prefix for reversal entry reference numbers.
    #[serde(default = "default_reversal_prefix")]
    pub reversal_prefix: String,
    /// Treatment of batch lines with both sides populated.
    #[serde(default)]
    pub ambiguous_line_policy: AmbiguousLinePolicy,
    /// Batches with more rows than this are normalized in parallel.
    #[serde(default = "default_parallel_batch_threshold")]
    pub parallel_batch_threshold: usize,
    /// Attempts at finding a free reference number before giving up.
    #[serde(default = "default_max_reference_attempts")]
    pub max_reference_attempts: u32,
    /// Page size used when the caller does not specify one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
}

fn default_reference_prefix() -> String {
    "JE".to_string()
}

fn default_reversal_prefix() -> String {
    "REV".to_string()
}

fn default_parallel_batch_threshold() -> usize {
    256
}

fn default_max_reference_attempts() -> u32 {
    5
}

fn default_page_size() -> u32 {
    50
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            reference_prefix: default_reference_prefix(),
            reversal_prefix: default_reversal_prefix(),
            ambiguous_line_policy: AmbiguousLinePolicy::default(),
            parallel_batch_threshold: default_parallel_batch_threshold(),
            max_reference_attempts: default_max_reference_attempts(),
            default_page_size: default_page_size(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_filter() -> String {
    "tally=info,sea_orm=warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones overriding earlier: `config/default`,
    /// `config/{RUN_MODE}`, then `TALLY__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
