//! Journal entry workflow.
//!
//! This module implements the entry lifecycle state machine,
//! role checks, and reversal generation.
//!
//! # Modules
//!
//! - `types` - Workflow domain types (EntryStatus, WorkflowAction)
//! - `error` - Workflow-specific error types
//! - `service` - State transition logic
//! - `access` - Actor roles and per-operation requirements
//! - `reversal` - Reversing entry creation

pub mod access;
pub mod error;
pub mod reversal;
pub mod service;
pub mod types;

#[cfg(test)]
mod reversal_props;
#[cfg(test)]
mod service_props;

pub use access::{AccessPolicy, Actor, ActorRole, Operation};
pub use error::WorkflowError;
pub use reversal::{ReversalOptions, ReversalPlan, ReversalService};
pub use service::WorkflowService;
pub use types::{EntryStatus, WorkflowAction};
