//! Parses policy durations written in Go's `time.ParseDuration` format.

use std::time::Duration;

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum ParseError {
    #[error("invalid unit: {}", EXPECTED_UNITS)]
    InvalidUnit,

    #[error("missing a unit: {}", EXPECTED_UNITS)]
    NoUnit,

    #[error("negative durations are not permitted")]
    Negative,

    #[error("empty duration")]
    Empty,

    #[error("duration is too large")]
    Overflow,

    #[error("invalid floating-point number: {}", .0)]
    NotANumber(#[from] std::num::ParseFloatError),
}

const EXPECTED_UNITS: &str = "expected one of 'ns', 'us', '\u{00b5}s', 'ms', 's', 'm', or 'h'";

/// Parses a sequence of decimal numbers with unit suffixes, such as `300ms` or `1h2m3.5s`.
///
/// A bare `0` is accepted without a unit. A leading `-` is rejected since timeouts and
/// intervals cannot be negative.
pub fn parse(s: &str) -> Result<Duration, ParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ParseError::Empty);
    }
    if s.starts_with('-') {
        return Err(ParseError::Negative);
    }
    let mut rest = s.trim_start_matches('+');
    if rest == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total = Duration::ZERO;
    while !rest.is_empty() {
        let unit_start = rest
            .find(|c: char| c.is_alphabetic())
            .ok_or(ParseError::NoUnit)?;
        let (val, tail) = rest.split_at(unit_start);
        let val = val.parse::<f64>()?;
        let unit_end = tail
            .find(|c: char| !c.is_alphabetic())
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);
        let term = Duration::try_from_secs_f64(unit_duration(unit)?.as_secs_f64() * val)
            .map_err(|_| ParseError::Overflow)?;
        total = total.checked_add(term).ok_or(ParseError::Overflow)?;
        rest = tail;
    }
    Ok(total)
}

fn unit_duration(unit: &str) -> Result<Duration, ParseError> {
    const MINUTE: Duration = Duration::from_secs(60);
    match unit {
        "ns" => Ok(Duration::from_nanos(1)),
        // U+00B5 is the micro sign; U+03BC is the Greek letter mu.
        "us" | "\u{00b5}s" | "\u{03bc}s" => Ok(Duration::from_micros(1)),
        "ms" => Ok(Duration::from_millis(1)),
        "s" => Ok(Duration::from_secs(1)),
        "m" => Ok(MINUTE),
        "h" => Ok(MINUTE * 60),
        _ => Err(ParseError::InvalidUnit),
    }
}
