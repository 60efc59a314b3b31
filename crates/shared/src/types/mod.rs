//! Common types used across the application.

pub mod amount;
pub mod id;
pub mod pagination;
pub mod period;

pub use amount::{AmountParseError, MAX_AMOUNT_SCALE, fits_amount_scale, parse_amount};
pub use id::*;
pub use pagination::{PageMeta, PageRequest, PageResponse};
pub use period::{DateRange, InvalidDateRange};
