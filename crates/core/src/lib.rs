//! Core business logic for Tally.
//!
//! This crate holds the journal-entry ledger engine. It has ZERO web or
//! database dependencies: persistence is reached through the
//! [`store::LedgerStore`] trait and audit logging through
//! [`store::AuditSink`].
//!
//! # Modules
//!
//! - `ledger` - Double-entry bookkeeping logic and the chart of accounts
//! - `workflow` - Entry lifecycle, roles, and reversals
//! - `batch` - Bulk import in the dual debit/credit column format
//! - `reports` - Trial balance, balance sheet, income statement, cash flow, general ledger
//! - `consolidation` - Multi-entity consolidated statements
//! - `store` - Storage and audit seams, with an in-memory store
//! - `engine` - [`LedgerEngine`], the operations callers use
//! - `error` - The error taxonomy every component maps into

pub mod batch;
pub mod consolidation;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod reports;
pub mod store;
pub mod workflow;

pub use engine::{EngineError, LedgerEngine};
pub use error::ErrorKind;
