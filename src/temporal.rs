//! Permissive calendar date/time recognition.
//!
//! Mirrors the format-list approach used for typed parsing: each layout is an
//! independent attempt and the first success wins. Only acceptance matters
//! here, the parsed value is discarded.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%m.%d.%Y",
    "%d.%m.%Y",
    "%m/%d/%y",
    "%d/%m/%y",
    "%m-%d-%y",
    "%d-%m-%y",
    "%y-%m-%d",
    "%m.%d.%y",
    "%d.%m.%y",
    "%B %d %Y",
    "%B %d, %Y",
    "%d %B %Y",
    "%d-%B-%Y",
    "%d-%B-%y",
    "%B-%d-%Y",
    "%A %B %d %Y",
    "%Y %B %d",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%Y-%m-%d %I:%M:%S %p",
    "%d-%B-%Y %H:%M:%S",
    "%B %d %Y %H:%M:%S",
    "%B %d %Y %I:%M %p",
    "%B %d, %Y %H:%M",
    "%B %d, %Y %H:%M:%S",
    "%B %d, %Y %I:%M %p",
    "%B %d, %Y %I:%M:%S %p",
    "%d %B %Y %H:%M",
    "%d %B %Y %H:%M:%S",
];

/// Layouts naming a month without a day; the first of the month is assumed.
const MONTH_FORMATS: &[&str] = &["%B %Y", "%B-%Y", "%B, %Y", "%Y-%m", "%Y/%m", "%m/%Y", "%m-%Y"];

const TIME_FORMATS: &[&str] = &[
    "%H:%M:%S",
    "%H:%M:%S%.f",
    "%H:%M",
    "%I:%M %p",
    "%I:%M:%S %p",
];

/// Returns `true` when `value` reads as a calendar date, a date-time, or a time of day.
///
/// Values made only of digits are rejected; they are numbers or codes, never
/// dates.
pub fn is_temporal(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    parse_naive_date(trimmed).is_some()
        || parse_month(trimmed).is_some()
        || parse_naive_datetime(trimmed).is_some()
        || parse_zoned(trimmed)
        || parse_naive_time(trimmed).is_some()
}

pub fn parse_naive_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Parses a month-and-year value as the first day of that month.
pub fn parse_month(value: &str) -> Option<NaiveDate> {
    let with_day = format!("{value} 01");
    MONTH_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&with_day, &format!("{fmt} %d")).ok())
}

pub fn parse_naive_datetime(value: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

pub fn parse_naive_time(value: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
}

fn parse_zoned(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok() || DateTime::parse_from_rfc2822(value).is_ok()
}
