//! Single-entity financial statements.
//!
//! Every report is a pure fold over the entity's chart and the activity
//! lines the engine loads for it:
//! - trial balance over a range, or cumulative when no start is given
//! - balance sheet as of a date, with current-period earnings in equity
//! - income statement over a range
//! - cash flow through one cash account, with running balances
//! - general ledger per account, with opening and closing balances

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::ReportError;
pub use service::ReportService;
pub use types::*;
