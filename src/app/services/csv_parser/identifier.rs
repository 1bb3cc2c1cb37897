//! Identifier decoding for sweep test rows
//!
//! Every row starts with a structured key of the form
//! `SERIAL_YYYYMMDD_HHMMSS_VARIANT`, optionally followed by a file extension.
//! Decoding never fails: problems are reported on the returned [`Identifier`].

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use std::sync::LazyLock;

use crate::app::models::{Identifier, IdentifierError, Variant};
use crate::constants::IDENTIFIER_PATTERN;

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(IDENTIFIER_PATTERN).expect("identifier pattern is a valid regex")
});

/// Decoder for `SERIAL_DATE_TIME_VARIANT` identifiers
pub struct IdentifierParser;

impl IdentifierParser {
    /// Decode a raw identifier, with or without extension
    ///
    /// Surrounding whitespace is part of the text and fails the match; only a
    /// trailing carriage return is dropped.
    pub fn parse(raw: &str) -> Identifier {
        let base = strip_extension(raw.strip_suffix('\r').unwrap_or(raw));

        let Some(captures) = IDENTIFIER_RE.captures(base) else {
            return Identifier::invalid(raw, IdentifierError::FormatMismatch);
        };

        let serial = captures[1].to_string();
        let date = captures[2].to_string();
        let time = captures[3].to_string();
        let variant = match captures[4].parse::<Variant>() {
            Ok(variant) => variant,
            Err(e) => {
                return Identifier::invalid(
                    raw,
                    IdentifierError::Malformed {
                        message: e.to_string(),
                    },
                );
            }
        };

        let error = match (validate_date(&date), validate_time(&time)) {
            (Err(e), _) | (Ok(()), Err(e)) => Some(e),
            (Ok(()), Ok(())) => None,
        };

        Identifier {
            serial,
            date,
            time,
            variant: Some(variant),
            source: raw.to_string(),
            error,
        }
    }
}

/// Keep only the text before the first `.`
fn strip_extension(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// Check that an 8-digit string is a real calendar date
fn validate_date(date: &str) -> Result<(), IdentifierError> {
    let bad_date = || IdentifierError::BadDate {
        date: date.to_string(),
    };

    let year: i32 = digits(date, 0..4).ok_or_else(bad_date)?;
    let month: u32 = digits(date, 4..6).ok_or_else(bad_date)?;
    let day: u32 = digits(date, 6..8).ok_or_else(bad_date)?;

    NaiveDate::from_ymd_opt(year, month, day)
        .map(|_| ())
        .ok_or_else(bad_date)
}

/// Check that a 6-digit string is a real clock time
fn validate_time(time: &str) -> Result<(), IdentifierError> {
    let bad_time = || IdentifierError::BadTime {
        time: time.to_string(),
    };

    let hour: u32 = digits(time, 0..2).ok_or_else(bad_time)?;
    let minute: u32 = digits(time, 2..4).ok_or_else(bad_time)?;
    let second: u32 = digits(time, 4..6).ok_or_else(bad_time)?;

    NaiveTime::from_hms_opt(hour, minute, second)
        .map(|_| ())
        .ok_or_else(bad_time)
}

fn digits<T: std::str::FromStr>(text: &str, range: std::ops::Range<usize>) -> Option<T> {
    text.get(range)?.parse().ok()
}
