//! Inclusive date ranges for ledger queries and reports.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a range's start falls after its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid date range: start {start} is after end {end}")]
pub struct InvalidDateRange {
    /// Requested start date.
    pub start: NaiveDate,
    /// Requested end date.
    pub end: NaiveDate,
}

/// An inclusive date range. A missing start means "from the beginning".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: Option<NaiveDate>,
    end: NaiveDate,
}

impl DateRange {
    /// Creates a bounded range `[start, end]`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidDateRange> {
        if start > end {
            return Err(InvalidDateRange { start, end });
        }
        Ok(Self {
            start: Some(start),
            end,
        })
    }

    /// Creates a range covering everything up to and including `end`.
    #[must_use]
    pub const fn up_to(end: NaiveDate) -> Self {
        Self { start: None, end }
    }

    /// Creates a range from optional bounds.
    pub fn from_bounds(start: Option<NaiveDate>, end: NaiveDate) -> Result<Self, InvalidDateRange> {
        match start {
            Some(start) => Self::new(start, end),
            None => Ok(Self::up_to(end)),
        }
    }

    /// Returns the start bound, if any.
    #[must_use]
    pub const fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    /// Returns the inclusive end bound.
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Returns true if `date` falls inside the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date <= self.end && self.start.is_none_or(|start| date >= start)
    }

    /// Returns true if `date` falls before the range start.
    #[must_use]
    pub fn is_before_start(&self, date: NaiveDate) -> bool {
        self.start.is_some_and(|start| date < start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_rejects_inverted_range() {
        let err = DateRange::new(date(2026, 2, 1), date(2026, 1, 1)).unwrap_err();
        assert_eq!(err.start, date(2026, 2, 1));
        assert_eq!(err.end, date(2026, 1, 1));
    }

    #[test]
    fn test_single_day_range() {
        let range = DateRange::new(date(2026, 1, 1), date(2026, 1, 1)).unwrap();
        assert!(range.contains(date(2026, 1, 1)));
        assert!(!range.contains(date(2026, 1, 2)));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let range = DateRange::new(date(2026, 1, 1), date(2026, 1, 31)).unwrap();
        assert!(range.contains(date(2026, 1, 1)));
        assert!(range.contains(date(2026, 1, 31)));
        assert!(!range.contains(date(2025, 12, 31)));
        assert!(!range.contains(date(2026, 2, 1)));
        assert!(range.is_before_start(date(2025, 12, 31)));
        assert!(!range.is_before_start(date(2026, 1, 15)));
    }

    #[test]
    fn test_up_to_has_no_start() {
        let range = DateRange::up_to(date(2026, 1, 31));
        assert!(range.start().is_none());
        assert!(range.contains(date(1999, 1, 1)));
        assert!(!range.is_before_start(date(1999, 1, 1)));
    }
}
