//! Decimal amount parsing for wire-format inputs.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts arrive as strings (e.g. from bulk imports) and are parsed straight
//! into `rust_decimal::Decimal`.

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// Maximum number of fractional digits accepted for an amount.
///
/// Matches the `NUMERIC(20, 6)` storage column.
pub const MAX_AMOUNT_SCALE: u32 = 6;

/// Error returned when an amount string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountParseError {
    /// The value is not a decimal number.
    #[error("Malformed amount: '{0}'")]
    Malformed(String),

    /// The value has more fractional digits than storage supports.
    #[error("Amount '{0}' has more than {max} decimal places", max = MAX_AMOUNT_SCALE)]
    TooPrecise(String),

    /// The value is below zero. Sides are chosen by column, never by sign.
    #[error("Amount '{0}' must not be negative")]
    Negative(String),
}

/// Whether `value` fits the storage scale once trailing zeros are dropped.
#[must_use]
pub fn fits_amount_scale(value: Decimal) -> bool {
    value.normalize().scale() <= MAX_AMOUNT_SCALE
}

/// Parses a decimal amount string.
///
/// Blank input is treated as an absent amount and yields zero. Thousands
/// separators (`,`) and surrounding whitespace are ignored.
///
/// # Errors
///
/// Returns `Malformed`, `Negative`, or `TooPrecise`.
pub fn parse_amount(raw: &str) -> Result<Decimal, AmountParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }

    let cleaned: String = trimmed.chars().filter(|c| *c != ',').collect();
    let value = Decimal::from_str(&cleaned)
        .map_err(|_| AmountParseError::Malformed(trimmed.to_string()))?;

    if value.is_sign_negative() && !value.is_zero() {
        return Err(AmountParseError::Negative(trimmed.to_string()));
    }
    if !fits_amount_scale(value) {
        return Err(AmountParseError::TooPrecise(trimmed.to_string()));
    }

    Ok(value)
}
