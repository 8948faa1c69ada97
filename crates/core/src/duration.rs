// Copyright 2025 isobench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Go duration strings.
//!
//! The go tool reports elapsed time in its trailer line using Go's duration
//! notation (`2.250s`, `1m0.5s`, `450ms`). This module parses that notation
//! and renders a [`Duration`] back into it, so the summary trailer reads the
//! same as one written by `go test` itself.
//!
//! Grammar accepted by [`parse`]:
//!
//! ```text
//! duration = [ "+" ] ( "0" | { number unit } )
//! number   = digits [ "." [ digits ] ] | "." digits
//! unit     = "ns" | "us" | "µs" | "μs" | "ms" | "s" | "m" | "h"
//! ```
//!
//! Negative durations are rejected; elapsed time is never negative.

use std::time::Duration;
use thiserror::Error;

/// Errors produced while parsing a duration string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    /// The input does not follow the duration grammar.
    #[error("invalid duration {0:?}")]
    Invalid(String),

    /// A number is not followed by a unit.
    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),

    /// A unit suffix is not recognised.
    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit {
        /// The unrecognised suffix.
        unit: String,
        /// The whole input.
        input: String,
    },

    /// The value does not fit in 64 bits of nanoseconds.
    #[error("duration {0:?} out of range")]
    Overflow(String),

    /// The value is negative.
    #[error("negative duration {0:?}")]
    Negative(String),
}

const NANOSECOND: u64 = 1;
const MICROSECOND: u64 = 1_000 * NANOSECOND;
const MILLISECOND: u64 = 1_000 * MICROSECOND;
const SECOND: u64 = 1_000 * MILLISECOND;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;

fn unit_nanos(unit: &str) -> Option<u64> {
    match unit {
        "ns" => Some(NANOSECOND),
        "us" | "\u{00b5}s" | "\u{03bc}s" => Some(MICROSECOND),
        "ms" => Some(MILLISECOND),
        "s" => Some(SECOND),
        "m" => Some(MINUTE),
        "h" => Some(HOUR),
        _ => None,
    }
}

/// Parse a Go duration string such as `3.267s` or `1h2m`.
pub fn parse(input: &str) -> Result<Duration, DurationError> {
    let invalid = || DurationError::Invalid(input.to_string());

    let mut s = input;
    if let Some(rest) = s.strip_prefix('-') {
        if rest == "0" {
            return Ok(Duration::ZERO);
        }
        return Err(DurationError::Negative(input.to_string()));
    }
    if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err(invalid());
    }

    let mut total: u64 = 0;
    while !s.is_empty() {
        if !s.starts_with(|c: char| c == '.' || c.is_ascii_digit()) {
            return Err(invalid());
        }

        let int_len = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (int_digits, rest) = s.split_at(int_len);
        s = rest;

        let mut frac_digits = "";
        if let Some(rest) = s.strip_prefix('.') {
            let frac_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
            let (digits, rest) = rest.split_at(frac_len);
            frac_digits = digits;
            s = rest;
        }
        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(invalid());
        }

        let unit_len = s
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(s.len());
        if unit_len == 0 {
            return Err(DurationError::MissingUnit(input.to_string()));
        }
        let (unit, rest) = s.split_at(unit_len);
        s = rest;
        let unit = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        let overflow = || DurationError::Overflow(input.to_string());
        let whole: u64 = if int_digits.is_empty() {
            0
        } else {
            int_digits.parse().map_err(|_| overflow())?
        };
        let mut value = whole.checked_mul(unit).ok_or_else(overflow)?;
        value = value
            .checked_add(fraction_nanos(frac_digits, unit))
            .ok_or_else(overflow)?;
        total = total.checked_add(value).ok_or_else(overflow)?;
    }

    Ok(Duration::from_nanos(total))
}

/// Nanoseconds contributed by the fractional digits of one component.
///
/// Digits beyond what a 64-bit nanosecond count can resolve are dropped.
fn fraction_nanos(digits: &str, unit: u64) -> u64 {
    let mut numerator: u128 = 0;
    let mut scale: u128 = 1;
    for d in digits.bytes() {
        if scale > u64::MAX as u128 {
            break;
        }
        numerator = numerator * 10 + u128::from(d - b'0');
        scale *= 10;
    }
    (numerator * u128::from(unit) / scale) as u64
}

/// Render a duration the way Go's `time.Duration.String` does.
///
/// Sub-second values use the largest fitting unit (`ns`, `µs`, `ms`);
/// anything longer is written as `[<h>h][<m>m]<s>[.<frac>]s`.
pub fn format(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }

    let second = u128::from(SECOND);
    if nanos < second {
        let (prec, unit) = if nanos < u128::from(MICROSECOND) {
            (0, "ns")
        } else if nanos < u128::from(MILLISECOND) {
            (3, "\u{00b5}s")
        } else {
            (6, "ms")
        };
        let (frac, int) = split_fraction(nanos, prec);
        return format!("{int}{frac}{unit}");
    }

    let (frac, secs) = split_fraction(nanos, 9);
    let hours = secs / 3600;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}{frac}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}{frac}s")
    } else {
        format!("{seconds}{frac}s")
    }
}

/// Split `value` into a `.digits` suffix with trailing zeros trimmed and the
/// integer part above `prec` decimal places.
fn split_fraction(value: u128, prec: u32) -> (String, u128) {
    let pow = 10u128.pow(prec);
    let digits = value % pow;
    let int = value / pow;
    if digits == 0 {
        return (String::new(), int);
    }
    let padded = format!("{:0width$}", digits, width = prec as usize);
    (format!(".{}", padded.trim_end_matches('0')), int)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trailer_values() {
        assert_eq!(parse("2.250s").unwrap(), Duration::from_millis(2250));
        assert_eq!(parse("1.021s").unwrap(), Duration::from_millis(1021));
        assert_eq!(parse("0.005s").unwrap(), Duration::from_millis(5));
        assert_eq!(parse("450ms").unwrap(), Duration::from_millis(450));
        assert_eq!(parse("1m0.5s").unwrap(), Duration::from_millis(60_500));
        assert_eq!(parse("1h2m3s").unwrap(), Duration::from_secs(3723));
    }

    #[test]
    fn test_parse_micro_units() {
        assert_eq!(parse("1.5us").unwrap(), Duration::from_nanos(1500));
        assert_eq!(parse("1.5µs").unwrap(), Duration::from_nanos(1500));
        assert_eq!(parse("1.5μs").unwrap(), Duration::from_nanos(1500));
        assert_eq!(parse("7ns").unwrap(), Duration::from_nanos(7));
    }

    #[test]
    fn test_parse_zero_and_sign() {
        assert_eq!(parse("0").unwrap(), Duration::ZERO);
        assert_eq!(parse("-0").unwrap(), Duration::ZERO);
        assert_eq!(parse("+5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse(".5s").unwrap(), Duration::from_millis(500));
        assert_eq!(parse("5.s").unwrap(), Duration::from_secs(5));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(parse(""), Err(DurationError::Invalid(_))));
        assert!(matches!(parse("."), Err(DurationError::Invalid(_))));
        assert!(matches!(parse("s"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse("12"), Err(DurationError::MissingUnit(_))));
        assert!(matches!(
            parse("3days"),
            Err(DurationError::UnknownUnit { .. })
        ));
        assert!(matches!(parse("-1s"), Err(DurationError::Negative(_))));
        assert!(matches!(parse("(cached)"), Err(DurationError::Invalid(_))));
        assert!(matches!(
            parse("99999999999999999999h"),
            Err(DurationError::Overflow(_))
        ));
    }

    #[test]
    fn test_format_matches_go() {
        assert_eq!(format(Duration::ZERO), "0s");
        assert_eq!(format(Duration::from_nanos(7)), "7ns");
        assert_eq!(format(Duration::from_nanos(1500)), "1.5µs");
        assert_eq!(format(Duration::from_millis(450)), "450ms");
        assert_eq!(format(Duration::from_micros(1250)), "1.25ms");
        assert_eq!(format(Duration::from_millis(3267)), "3.267s");
        assert_eq!(format(Duration::from_secs(2)), "2s");
        assert_eq!(format(Duration::from_millis(60_500)), "1m0.5s");
        assert_eq!(format(Duration::from_secs(7200)), "2h0m0s");
        assert_eq!(format(Duration::from_secs(3723)), "1h2m3s");
    }

    #[test]
    fn test_round_trip() {
        for nanos in [
            1u64,
            999,
            1_000,
            1_234_567,
            999_999_999,
            1_000_000_000,
            3_267_000_000,
            60_500_000_000,
            3_723_000_000_001,
        ] {
            let d = Duration::from_nanos(nanos);
            let text = format(d);
            assert_eq!(parse(&text).unwrap(), d, "round trip of {text}");
        }
    }
}
