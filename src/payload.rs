//! Embedded JSON bodies inside a single log line.
//!
//! Terraform's HTTP debug logging writes request and response bodies under
//! `tf_http_req_body` / `tf_http_res_body`. Lines without those keys may still
//! carry a bare `{...}` object, which is kept under [`BARE_JSON_KEY`] when it
//! parses.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::trace;

pub const PREVIEW_LIMIT: usize = 200;
pub const REQUEST_BODY_KEY: &str = "tf_http_req_body";
pub const RESPONSE_BODY_KEY: &str = "tf_http_res_body";
pub const BARE_JSON_KEY: &str = "_json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    pub preview_text: String,
    pub full_text: String,
}

pub type Payloads = BTreeMap<String, Payload>;

impl Payload {
    pub fn from_value(v: &Value) -> Payload {
        let full_text = serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string());
        Payload { preview_text: truncate_preview(&v.to_string()), full_text }
    }

    pub fn raw(text: &str) -> Payload {
        Payload { preview_text: truncate_preview(text), full_text: text.to_string() }
    }

    /// Decodes `text` as JSON, keeping it verbatim when it does not decode.
    pub fn from_text(text: &str) -> Payload {
        match serde_json::from_str::<Value>(text) {
            Ok(v) => Payload::from_value(&v),
            Err(e) => {
                trace!(error = %e, "embedded payload is not valid JSON; keeping raw text");
                Payload::raw(text)
            }
        }
    }
}

/// Cuts to [`PREVIEW_LIMIT`] chars, appending `...` only when something was cut.
pub fn truncate_preview(s: &str) -> String {
    match s.char_indices().nth(PREVIEW_LIMIT) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

static RE_KEYED_BODY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\b(tf_http_(?:req|res)_body)"?\s*[:=]\s*"#).unwrap());

/// Returns the balanced `{...}` prefix of `s`. Braces inside JSON strings are
/// ignored. `None` when `s` does not start with `{` or never closes.
pub fn balanced_span(s: &str) -> Option<&str> {
    if !s.starts_with('{') {
        return None;
    }
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, b) in s.bytes().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

pub fn extract_payloads(line: &str) -> Payloads {
    let mut out = Payloads::new();
    let mut pos = 0;
    // Key-like text inside a captured body is skipped.
    while let Some(caps) = RE_KEYED_BODY.captures_at(line, pos) {
        let Some(whole) = caps.get(0) else { break };
        let rest = &line[whole.end()..];
        if !rest.starts_with('{') {
            pos = whole.end();
            continue;
        }
        // An unterminated body keeps the rest of the line as raw text.
        let span = balanced_span(rest).unwrap_or(rest);
        pos = whole.end() + span.len();
        out.entry(caps[1].to_ascii_lowercase()).or_insert_with(|| Payload::from_text(span));
    }
    if out.is_empty() {
        let bare = line
            .match_indices('{')
            .find_map(|(start, _)| balanced_span(&line[start..]))
            .and_then(|span| serde_json::from_str::<Value>(span).ok());
        if let Some(v) = bare {
            out.insert(BARE_JSON_KEY.to_string(), Payload::from_value(&v));
        }
    }
    out
}
