use crate::level::{self, Level};
use crate::payload::{self, Payload, Payloads, REQUEST_BODY_KEY, RESPONSE_BODY_KEY};
use crate::sections::SectionKind;
use crate::timestamp::{self, Timestamp};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

const MESSAGE_KEYS: [&str; 3] = ["@message", "message", "msg"];
const LEVEL_KEYS: [&str; 2] = ["@level", "level"];
const TIMESTAMP_KEY: &str = "@timestamp";
const BODY_KEYS: [&str; 2] = [REQUEST_BODY_KEY, RESPONSE_BODY_KEY];
pub const CORRELATION_KEY: &str = "tf_req_id";
pub const RESOURCE_TYPE_KEY: &str = "tf_resource_type";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Plaintext,
}

/// One non-blank input line after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub raw_text: String,
    pub display_text: String,
    pub format: LogFormat,
    pub timestamp: Option<Timestamp>,
    pub level: Level,
    pub payloads: Option<Payloads>,
    pub correlation_id: Option<String>,
    pub resource_type: Option<String>,
    /// Filled in after the whole stream has been seen.
    pub section: Option<SectionKind>,
}

static RE_REQ_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\btf_req_id"?\s*[:=]\s*"?([^\s",}]+)"#).unwrap());
static RE_RESOURCE_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\btf_resource_type"?\s*[:=]\s*"?([^\s",}]+)"#).unwrap());

/// Splits text into physical lines (`\n` or `\r\n`) and drops blank ones.
pub fn non_blank_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .filter(|l| !l.trim().is_empty())
}

pub fn parse_line(line: &str) -> LogEntry {
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(obj)) => parse_structured(line, &obj),
        _ => parse_plaintext(line),
    }
}

fn parse_structured(line: &str, obj: &Map<String, Value>) -> LogEntry {
    let serialized = serde_json::to_string(obj).unwrap_or_else(|_| line.to_string());

    let display_text = MESSAGE_KEYS
        .iter()
        .find_map(|k| field_text(obj, k))
        .unwrap_or_else(|| serialized.clone());

    let timestamp = match obj.get(TIMESTAMP_KEY) {
        Some(Value::String(s)) if !s.is_empty() => Some(timestamp::normalize_field(s)),
        _ => None,
    }
    .or_else(|| timestamp::extract_timestamp(&serialized));

    let level = LEVEL_KEYS
        .iter()
        .find_map(|k| field_text(obj, k))
        .map(|v| Level::from_field(&v))
        .unwrap_or_else(|| level::classify(&display_text));

    let mut payloads = Payloads::new();
    for key in BODY_KEYS {
        match obj.get(key) {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) if s.is_empty() => {}
            Some(Value::String(s)) => {
                payloads.insert(key.to_string(), Payload::from_text(s));
            }
            Some(other) => {
                payloads.insert(key.to_string(), Payload::from_value(other));
            }
        }
    }

    LogEntry {
        raw_text: line.to_string(),
        display_text,
        format: LogFormat::Json,
        timestamp,
        level,
        payloads: (!payloads.is_empty()).then_some(payloads),
        correlation_id: field_text(obj, CORRELATION_KEY),
        resource_type: field_text(obj, RESOURCE_TYPE_KEY),
        section: None,
    }
}

fn parse_plaintext(line: &str) -> LogEntry {
    let payloads = payload::extract_payloads(line);
    LogEntry {
        raw_text: line.to_string(),
        display_text: line.to_string(),
        format: LogFormat::Plaintext,
        timestamp: timestamp::extract_timestamp(line),
        level: level::classify(line),
        payloads: (!payloads.is_empty()).then_some(payloads),
        correlation_id: text_field(&RE_REQ_ID, line),
        resource_type: text_field(&RE_RESOURCE_TYPE, line),
        section: None,
    }
}

/// String form of a field; `null` and `""` count as absent, other scalars and
/// containers are serialized compactly.
fn field_text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn text_field(re: &Regex, line: &str) -> Option<String> {
    re.captures(line).map(|c| c[1].to_string())
}
