use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Timelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;

/// A timestamp attached to a log entry.
///
/// `Unparsed` keeps a substring that looked like a date to the pattern
/// families but does not resolve to a real instant (e.g. month 13). Callers
/// must not assume every timestamp is an instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timestamp {
    Parsed(DateTime<Utc>),
    Unparsed(String),
}

impl Timestamp {
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Parsed(t) => Some(*t),
            Timestamp::Unparsed(_) => None,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Parsed(t) => f.write_str(&format_instant(*t)),
            Timestamp::Unparsed(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Formats an instant as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn format_instant(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn serialize_instant<S: Serializer>(t: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_instant(*t))
}

pub fn minute_floor(t: DateTime<Utc>) -> DateTime<Utc> {
    t.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(t)
}

// Pattern families in priority order: ISO-8601 with optional fraction/offset,
// then date+time without zone, then US-style month/day/year.
static FAMILIES: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"\b\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})?\b").unwrap(),
        Regex::new(r"\b\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}:\d{2}\b").unwrap(),
        Regex::new(r"\b\d{2}/\d{2}/\d{4}[ T]\d{2}:\d{2}:\d{2}\b").unwrap(),
    ]
});

static RE_COMPACT_OFFSET: Lazy<Regex> = Lazy::new(|| Regex::new(r"([+-])(\d{2})(\d{2})$").unwrap());

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%YT%H:%M:%S",
];

/// Finds the first timestamp-looking substring in `text`, trying each pattern
/// family in order. The match is normalized to UTC when it parses; otherwise
/// the raw substring is returned as [`Timestamp::Unparsed`].
pub fn extract_timestamp(text: &str) -> Option<Timestamp> {
    let m = FAMILIES.iter().find_map(|re| re.find(text))?;
    Some(resolve(m.as_str()))
}

/// Normalizes a timestamp given directly as a field value.
pub fn normalize_field(value: &str) -> Timestamp {
    resolve(value.trim())
}

fn resolve(candidate: &str) -> Timestamp {
    match parse_instant(candidate) {
        Some(t) => Timestamp::Parsed(t),
        None => Timestamp::Unparsed(candidate.to_string()),
    }
}

/// Parses a zoned or naive date-time string; naive values are taken as UTC.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // +0100 -> +01:00
    if let Some(caps) = RE_COMPACT_OFFSET.captures(s) {
        let whole = caps.get(0)?;
        let normalized = format!("{}{}{}:{}", &s[..whole.start()], &caps[1], &caps[2], &caps[3]);
        if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}
