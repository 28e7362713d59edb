//! Timestamp and timezone parsing

use std::borrow::Cow;

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;

use crate::error::{Error, Result};

/// Offset-carrying formats tried after RFC 3339
const AWARE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
];

/// Local (offset-less) formats, interpreted in the default timezone
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Resolve an IANA timezone name such as `Europe/Stockholm`
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| Error::configuration(format!("Unknown timezone '{}': {}", name, e)))
}

/// Parse an ISO 8601 timestamp into the given timezone.
///
/// Timestamps with `Z` or a numeric offset are converted to `tz`; naive
/// timestamps (and bare dates, taken at midnight) are read as local time in `tz`.
pub fn parse_datetime(input: &str, tz: &Tz) -> Result<DateTime<Tz>> {
    let original = input.trim();
    if original.is_empty() {
        return Err(Error::validation("Invalid datetime format: empty value"));
    }
    let expanded = expand_bare_hour(original);
    let trimmed = expanded.as_ref();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(tz));
    }

    let normalized = match trimmed.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{}+00:00", rest),
        None => trimmed.to_string(),
    };
    for format in AWARE_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, format) {
            return Ok(dt.with_timezone(tz));
        }
    }

    let naive = parse_naive(trimmed).ok_or_else(|| {
        Error::validation(format!("Invalid datetime format: '{}'", original))
    })?;
    localize(&naive, tz)
}

/// `2025-08-20T09` names only the hour; spell out the minutes so the formats above apply
fn expand_bare_hour(input: &str) -> Cow<'_, str> {
    let bytes = input.as_bytes();
    let bare_hour = bytes.len() >= 13
        && matches!(bytes[10], b'T' | b' ')
        && bytes[11].is_ascii_digit()
        && bytes[12].is_ascii_digit()
        && matches!(bytes.get(13), None | Some(b'+' | b'-' | b'Z' | b'z'));

    if bare_hour {
        Cow::Owned(format!("{}:00{}", &input[..13], &input[13..]))
    } else {
        Cow::Borrowed(input)
    }
}

fn parse_naive(input: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Attach `tz` to a wall-clock time
///
/// A time repeated by a DST fall-back resolves to the standard-time (later) instant.
fn localize(naive: &NaiveDateTime, tz: &Tz) -> Result<DateTime<Tz>> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(_, latest) => Ok(latest),
        LocalResult::None => Err(Error::validation(format!(
            "Invalid datetime format: {} does not exist in {}",
            naive,
            tz.name()
        ))),
    }
}
