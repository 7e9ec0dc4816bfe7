//! Date and timestamp normalization.
//!
//! `visit_date` is parsed leniently into a calendar date and `last_updated`
//! into a UTC instant. Source values without a zone marker are taken as UTC.
//! Anything that does not parse becomes `None`; the row itself is kept.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use visits_model::{NormalizedVisit, RawVisit, Visit};

/// Naive date-time formats, tried in order.
const DATETIME_FORMATS: [&str; 14] = [
    "%Y-%m-%dT%H:%M:%S%.f", // With fractional seconds
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d-%b-%Y %H:%M:%S", // 15-Jan-2024 10:30:00
    "%d-%b-%Y %H:%M",
    "%m/%d/%Y %H:%M:%S", // US
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S", // European
    "%d/%m/%Y %H:%M",
];

/// Date-only formats, tried in order. Month-first wins for ambiguous
/// slash-separated values.
const DATE_FORMATS: [&str; 14] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",  // US: 01/15/2024
    "%d/%m/%Y",  // European: 15/01/2024
    "%d-%b-%Y",  // 15-Jan-2024
    "%d-%B-%Y",  // 15-January-2024
    "%d.%m.%Y",  // German: 15.01.2024
    "%Y%m%d",    // Compact: 20240115
    "%b %d, %Y", // Jan 15, 2024
    "%B %d, %Y", // January 15, 2024
    "%d %b %Y",  // 15 Jan 2024
    "%d %B %Y",  // 15 January 2024
    "%Y-%b-%d",  // 2024-Jan-15
    "%d-%m-%Y",  // 15-01-2024
];

/// Offset-bearing formats beyond RFC 3339.
const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S %z",
];

fn try_parse_naive_datetime(value: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

fn try_parse_naive_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

fn try_parse_with_offset(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok().or_else(|| {
        OFFSET_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(value, fmt).ok())
    })
}

/// Strip a trailing UTC designator (`Z`, ` UTC`) that the naive formats do not accept.
fn strip_utc_suffix(value: &str) -> Option<&str> {
    value
        .strip_suffix('Z')
        .or_else(|| value.strip_suffix('z'))
        .or_else(|| value.strip_suffix(" UTC"))
        .map(str::trim_end)
}

/// Parse a timestamp into a UTC instant.
///
/// Offsets are honored; values without one are UTC. A date alone is
/// midnight UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(dt) = try_parse_with_offset(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = strip_utc_suffix(trimmed).unwrap_or(trimmed);
    if let Some(dt) = try_parse_naive_datetime(naive) {
        return Some(dt.and_utc());
    }
    try_parse_naive_date(naive).map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// Parse a calendar date, accepting timestamp forms and keeping their date part.
pub fn parse_visit_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(date) = try_parse_naive_date(trimmed) {
        return Some(date);
    }
    if let Some(dt) = try_parse_with_offset(trimmed) {
        return Some(dt.date_naive());
    }
    let naive = strip_utc_suffix(trimmed).unwrap_or(trimmed);
    try_parse_naive_datetime(naive).map(|dt| dt.date())
}

/// Parse the date fields of one row.
pub fn normalize_visit(raw: RawVisit) -> NormalizedVisit {
    Visit {
        visit_date: raw.visit_date.as_deref().and_then(parse_visit_date),
        last_updated: raw.last_updated.as_deref().and_then(parse_timestamp),
        visit_id: raw.visit_id,
        patient_id: raw.patient_id,
        provider_id: raw.provider_id,
        diagnosis_code: raw.diagnosis_code,
        visit_cost: raw.visit_cost,
        extra: raw.extra,
    }
}

/// Normalize every row, preserving order.
pub fn normalize(rows: Vec<RawVisit>) -> Vec<NormalizedVisit> {
    rows.into_iter().map(normalize_visit).collect()
}
