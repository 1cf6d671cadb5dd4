//! Duration strings for analysis requests
//!
//! Accepts the same notation as Go's `time.ParseDuration`: one or more
//! decimal numbers, each with an optional fraction and a unit suffix, such as
//! `5s`, `250ms`, `1m30s` or `1.5h`. Negative durations and durations
//! longer than `i64::MAX` nanoseconds (about 2562047h) are rejected.

use std::time::Duration;

use thiserror::Error;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Longest accepted duration, in nanoseconds
const MAX_NANOS: u128 = i64::MAX as u128;

/// Fraction digits beyond this cannot change the nanosecond result
const MAX_FRACTION_DIGITS: usize = 18;

/// Error parsing a duration string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationParseError {
    #[error("empty duration")]
    Empty,

    #[error("negative duration: {0}")]
    Negative(String),

    #[error("invalid duration: {0}")]
    Invalid(String),

    #[error("missing unit in duration: {0}")]
    MissingUnit(String),

    #[error("unknown unit `{unit}` in duration: {input}")]
    UnknownUnit { unit: String, input: String },

    #[error("duration out of range: {0}")]
    Overflow(String),
}

fn unit_nanos(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        _ => return None,
    })
}

/// Parse a Go-style duration string
pub fn parse_duration(input: &str) -> Result<Duration, DurationParseError> {
    let mut rest = input.strip_prefix('+').unwrap_or(input);
    if rest.starts_with('-') {
        return Err(DurationParseError::Negative(input.to_string()));
    }
    if rest.is_empty() {
        return Err(DurationParseError::Empty);
    }
    if rest == "0" {
        return Ok(Duration::ZERO);
    }

    let overflow = || DurationParseError::Overflow(input.to_string());
    let mut total: u128 = 0;

    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_part, after) = rest.split_at(int_len);

        let (frac_part, after) = match after.strip_prefix('.') {
            Some(frac) => frac.split_at(frac.bytes().take_while(u8::is_ascii_digit).count()),
            None => ("", after),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(DurationParseError::Invalid(input.to_string()));
        }

        let unit_len = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let (unit, after) = after.split_at(unit_len);
        let scale = unit_nanos(unit).ok_or_else(|| {
            if unit.is_empty() {
                DurationParseError::MissingUnit(input.to_string())
            } else {
                DurationParseError::UnknownUnit {
                    unit: unit.to_string(),
                    input: input.to_string(),
                }
            }
        })?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| overflow())?
        };
        let mut nanos = whole.checked_mul(scale).ok_or_else(overflow)?;

        if !frac_part.is_empty() {
            let frac = &frac_part[..frac_part.len().min(MAX_FRACTION_DIGITS)];
            let value: u128 = frac.parse().map_err(|_| overflow())?;
            nanos = nanos
                .checked_add(value * scale / 10u128.pow(frac.len() as u32))
                .ok_or_else(overflow)?;
        }

        total = total.checked_add(nanos).ok_or_else(overflow)?;
        if total > MAX_NANOS {
            return Err(overflow());
        }
        rest = after;
    }

    Ok(Duration::new(
        (total / NANOS_PER_SEC) as u64,
        (total % NANOS_PER_SEC) as u32,
    ))
}
