//! Batch Importer.
//!
//! Turns bulk tabular input into draft entries. Rows are normalized and
//! validated independently; the engine then creates each surviving row as
//! its own atomic unit so one bad row never blocks the rest.

pub mod error;
pub mod normalize;
pub mod types;

pub use error::{BatchError, BatchRowError};
pub use normalize::BatchNormalizer;
pub use types::{
    BatchImportResult, BatchLineInput, BatchRow, BatchWarning, CreatedRow, NormalizedRow, RowFailure,
};
