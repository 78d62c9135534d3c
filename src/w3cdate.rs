//! W3C Date Codec
//!
//! Descriptor dates are written as `YYYY-MM-DDTHH:MM±HH:MM`. Only that form
//! passes through unchanged; text with seconds or a `Z` suffix is parsed and
//! re-encoded.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PassError, Result};

/// A date as callers hand it over: already a timestamp, or text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    Timestamp(DateTime<FixedOffset>),
    Text(String),
}

impl From<DateTime<FixedOffset>> for DateInput {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for DateInput {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v.fixed_offset())
    }
}

impl From<&str> for DateInput {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for DateInput {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Format a timestamp, keeping its own UTC offset.
pub fn encode(value: &DateTime<FixedOffset>) -> String {
    value.format("%Y-%m-%dT%H:%M%:z").to_string()
}

/// Encode caller input. Text already in W3C form is returned unchanged.
pub fn encode_input(value: &DateInput) -> Result<String> {
    match value {
        DateInput::Timestamp(ts) => Ok(encode(ts)),
        DateInput::Text(s) if is_valid(s) => Ok(s.clone()),
        DateInput::Text(s) => parse_loose(s)
            .map(|ts| encode(&ts))
            .ok_or_else(|| PassError::type_error(format!("Value {s:?} is not a valid date"))),
    }
}

/// Resolve caller input into an absolute instant.
pub fn to_timestamp(value: &DateInput) -> Result<DateTime<FixedOffset>> {
    match value {
        DateInput::Timestamp(ts) => Ok(*ts),
        DateInput::Text(s) if is_valid(s) => decode(s),
        DateInput::Text(s) => parse_loose(s)
            .ok_or_else(|| PassError::type_error(format!("Value {s:?} is not a valid date"))),
    }
}

pub fn is_valid(value: &str) -> bool {
    scan(value.as_bytes()).is_some()
}

/// Parse a W3C date string. The offset is applied arithmetically, so the
/// result never depends on the host time zone.
pub fn decode(value: &str) -> Result<DateTime<FixedOffset>> {
    let invalid = || PassError::type_error(format!("Date string {value} is not a valid W3C date string"));
    let parts = scan(value.as_bytes()).ok_or_else(invalid)?;

    let naive = NaiveDate::from_ymd_opt(parts.year, parts.month, parts.day)
        .and_then(|d| d.and_hms_opt(parts.hour, parts.minute, 0))
        .ok_or_else(invalid)?;
    let offset = FixedOffset::east_opt(parts.offset_minutes * 60).ok_or_else(invalid)?;

    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(invalid)
}

/// Best-effort parsing for text that is not W3C formatted.
fn parse_loose(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts);
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(value) {
        return Some(ts);
    }
    let value = value.strip_suffix('Z').unwrap_or(value);
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

struct DateParts {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    offset_minutes: i32,
}

fn digit(b: &[u8], at: usize, lo: u8, hi: u8) -> Option<u32> {
    match b.get(at) {
        Some(c) if (lo..=hi).contains(c) => Some(u32::from(c - b'0')),
        _ => None,
    }
}

fn pair(b: &[u8], at: usize, first_max: u8) -> Option<u32> {
    Some(digit(b, at, b'0', first_max)? * 10 + digit(b, at + 1, b'0', b'9')?)
}

fn literal(b: &[u8], at: usize, c: u8) -> Option<()> {
    (b.get(at) == Some(&c)).then_some(())
}

// 20YY-MM-DDTHH:MM±HH:MM
fn scan(b: &[u8]) -> Option<DateParts> {
    literal(b, 0, b'2')?;
    literal(b, 1, b'0')?;
    let year = 2000 + pair(b, 2, b'9')? as i32;
    literal(b, 4, b'-')?;
    let month = pair(b, 5, b'1')?;
    literal(b, 7, b'-')?;
    let day = pair(b, 8, b'3')?;
    literal(b, 10, b'T')?;
    let hour = pair(b, 11, b'2')?;
    literal(b, 13, b':')?;
    let minute = pair(b, 14, b'5')?;

    let offset_minutes = match b.get(16..)? {
        rest if rest.len() == 6 => {
            let sign = match rest[0] {
                b'+' => 1,
                b'-' => -1,
                _ => return None,
            };
            let hours = pair(rest, 1, b'1')? as i32;
            literal(rest, 3, b':')?;
            let mins = pair(rest, 4, b'5')? as i32;
            sign * (hours * 60 + mins)
        }
        _ => return None,
    };

    Some(DateParts {
        year,
        month,
        day,
        hour,
        minute,
        offset_minutes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(offset_secs: i32, y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(offset_secs)
            .unwrap()
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
    }

    #[test]
    fn test_encode_keeps_offset_and_drops_seconds() {
        let ts = at(-5 * 3600, 2024, 3, 7, 9, 5);
        assert_eq!(encode(&ts), "2024-03-07T09:05-05:00");
        let utc = Utc.with_ymd_and_hms(2030, 12, 31, 23, 59, 42).unwrap();
        assert_eq!(encode_input(&utc.into()).unwrap(), "2030-12-31T23:59+00:00");
    }

    #[test]
    fn test_valid_grammar() {
        assert!(is_valid("2024-01-02T03:04+01:00"));
        assert!(is_valid("2024-01-02T03:04-09:30"));
        assert!(!is_valid("2024-01-02T03:04:05-09:30"));
        assert!(!is_valid("2024-01-02T03:04Z"));
        assert!(!is_valid("1999-01-02T03:04+01:00"));
        assert!(!is_valid("2024-01-02 03:04+01:00"));
        assert!(!is_valid("2024-01-02T03:04"));
        assert!(!is_valid("2024-01-02T03:04+01:00 trailing"));
        assert!(!is_valid(""));
    }

    #[test]
    fn test_decode_applies_offset() {
        let ts = decode("2024-06-01T12:00+02:00").unwrap();
        assert_eq!(ts.with_timezone(&Utc), Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap());
        assert!(decode("2024-06-01T12:00Z").is_err());
        let z = to_timestamp(&"2024-06-01T12:00Z".into()).unwrap();
        assert_eq!(z.with_timezone(&Utc), Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_decode_rejects_impossible_calendar_date() {
        assert!(matches!(decode("2023-02-30T10:00+00:00"), Err(PassError::Type(_))));
    }

    #[test]
    fn test_text_input_is_idempotent_or_parsed() {
        let w3c = "2025-11-20T18:30-08:00";
        assert_eq!(encode_input(&w3c.into()).unwrap(), w3c);
        assert_eq!(
            encode_input(&"2025-11-20T18:30:00Z".into()).unwrap(),
            "2025-11-20T18:30+00:00"
        );
        assert_eq!(
            encode_input(&"2025-11-20T18:30:45+05:30".into()).unwrap(),
            "2025-11-20T18:30+05:30"
        );
        assert_eq!(encode_input(&"2025-11-20".into()).unwrap(), "2025-11-20T00:00+00:00");
        assert!(encode_input(&"next tuesday".into()).is_err());
    }
}
