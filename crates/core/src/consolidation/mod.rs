//! Multi-entity consolidation.
//!
//! Groups of entities under one client, and the aggregator that combines
//! their posted balances into one trial balance, balance sheet, or income
//! statement.

pub mod aggregator;
pub mod error;
pub mod types;

pub use aggregator::ConsolidationAggregator;
pub use error::ConsolidationError;
pub use types::{
    ConsolidatedLine, ConsolidatedReport, ConsolidatedReportKind, ConsolidatedTotals,
    ConsolidationGroup, EntityBalance,
};
