//! Reference number generation.

use chrono::NaiveDate;
use tally_shared::types::JournalEntryId;

/// Longest reference number, matching the `journal_entries.reference_number` column.
pub const MAX_REFERENCE_LEN: usize = 100;

/// Builders for generated and de-duplicated reference numbers.
///
/// Every builder that extends an existing reference shortens it first, so
/// the result never exceeds [`MAX_REFERENCE_LEN`] characters.
pub struct ReferenceNumbers;

impl ReferenceNumbers {
    /// `head` followed by as much of `base` as fits, then `tail`.
    #[must_use]
    pub fn fitted(head: &str, base: &str, tail: &str) -> String {
        let room = MAX_REFERENCE_LEN.saturating_sub(head.chars().count() + tail.chars().count());
        let mut out = String::with_capacity(MAX_REFERENCE_LEN);
        out.push_str(head);
        out.extend(base.chars().take(room));
        out.push_str(tail);
        out
    }

    /// Reference for an entry created without one: `{prefix}-{yyyymmdd}-{id suffix}`.
    ///
    /// The suffix is the last eight hex digits of the entry ID.
    #[must_use]
    pub fn auto(prefix: &str, entry_date: NaiveDate, id: JournalEntryId) -> String {
        let hex = id.into_inner().simple().to_string();
        let suffix = &hex[hex.len().saturating_sub(8)..];
        format!("{prefix}-{}-{suffix}", entry_date.format("%Y%m%d"))
    }

    /// The `attempt`-th replacement for a reference that is already taken.
    ///
    /// Attempt 0 is `{base}-{millis}`; later attempts append a counter so
    /// several collisions within the same millisecond stay distinct.
    #[must_use]
    pub fn collision_candidate(base: &str, unix_millis: i64, attempt: u32) -> String {
        let tail = if attempt == 0 {
            format!("-{unix_millis}")
        } else {
            format!("-{unix_millis}-{attempt}")
        };
        Self::fitted("", base, &tail)
    }

    /// Base reference for a resubmitted copy of `original`.
    #[must_use]
    pub fn resubmission(original: &str) -> String {
        Self::fitted("", original, "-R1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use uuid::Uuid;

    #[test]
    fn test_auto_reference_shape() {
        let id = JournalEntryId::from_uuid(Uuid::from_u128(0x0123_4567_89ab_cdef_0011_2233_4455_6677));
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(ReferenceNumbers::auto("JE", date, id), "JE-20260309-44556677");
    }

    #[rstest]
    #[case(0, "INV-9-1700000000000")]
    #[case(1, "INV-9-1700000000000-1")]
    #[case(4, "INV-9-1700000000000-4")]
    fn test_collision_candidates(#[case] attempt: u32, #[case] expected: &str) {
        assert_eq!(
            ReferenceNumbers::collision_candidate("INV-9", 1_700_000_000_000, attempt),
            expected
        );
    }

    #[rstest]
    #[case(0)]
    #[case(12)]
    fn test_long_base_is_shortened_to_fit(#[case] attempt: u32) {
        let base = "B".repeat(MAX_REFERENCE_LEN);
        let candidate = ReferenceNumbers::collision_candidate(&base, 1_700_000_000_000, attempt);
        let tail = if attempt == 0 {
            "-1700000000000".to_string()
        } else {
            format!("-1700000000000-{attempt}")
        };
        assert_eq!(candidate.chars().count(), MAX_REFERENCE_LEN);
        assert!(candidate.ends_with(&tail));
        assert!(candidate.starts_with("BBBB"));
    }

    #[test]
    fn test_resubmission_reference() {
        assert_eq!(ReferenceNumbers::resubmission("JE-7"), "JE-7-R1");
        let long = ReferenceNumbers::resubmission(&"é".repeat(MAX_REFERENCE_LEN));
        assert_eq!(long.chars().count(), MAX_REFERENCE_LEN);
        assert!(long.ends_with("-R1"));
    }

    #[test]
    fn test_fitted_keeps_short_values_whole() {
        assert_eq!(ReferenceNumbers::fitted("REV-", "JE-1", ""), "REV-JE-1");
    }
}
