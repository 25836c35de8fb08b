use crate::level::Level;
use crate::observer::EntryObserver;
use crate::parser::LogEntry;
use crate::timestamp::{self, Timestamp};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

pub type CountTable = BTreeMap<String, usize>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRef {
    pub index: usize,
    pub display_text: String,
    pub timestamp: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountItem {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregates {
    pub levels: BTreeMap<Level, usize>,
    pub errors: Vec<ErrorRef>,
    pub resources: CountTable,
    pub providers: CountTable,
    /// Minute bucket (normalized timestamp string) -> entry count.
    pub timeline: CountTable,
    pub error_timeline: CountTable,
}

// `# module.<name>.<type>` / `# <name>.<type>` plan comments
static RE_RESOURCE_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#\s*(?:module\.)?([^\s.]+)\.([^\s\[]+)").unwrap());
static RE_RESOURCE_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)resource\s+"([^"]+)""#).unwrap());
static RE_PROVIDER: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)provider\["?([^"\]]+)"?\]"#).unwrap());

/// Resource names referenced by `text`; each pattern contributes at most one.
pub fn resource_references(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    if let Some(m) = RE_RESOURCE_COMMENT.captures(text).and_then(|c| c.get(2)) {
        out.push(m.as_str());
    }
    if let Some(m) = RE_RESOURCE_BLOCK.captures(text).and_then(|c| c.get(1)) {
        out.push(m.as_str());
    }
    out
}

pub fn provider_reference(text: &str) -> Option<&str> {
    RE_PROVIDER.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

pub fn minute_key(ts: &Timestamp) -> Option<String> {
    ts.instant().map(|t| timestamp::format_instant(timestamp::minute_floor(t)))
}

/// Highest counts first, ties by name.
pub fn top_counts(table: &CountTable, n: usize) -> Vec<CountItem> {
    table
        .iter()
        .sorted_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)))
        .take(n)
        .map(|(name, count)| CountItem { name: name.clone(), count: *count })
        .collect()
}

fn bump(table: &mut CountTable, key: &str) {
    match table.get_mut(key) {
        Some(c) => *c += 1,
        None => {
            table.insert(key.to_string(), 1);
        }
    }
}

#[derive(Debug, Default)]
pub struct Aggregator {
    acc: Aggregates,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, index: usize, entry: &LogEntry) {
        let acc = &mut self.acc;
        *acc.levels.entry(entry.level).or_insert(0) += 1;

        let is_error = entry.level.is_error();
        if is_error {
            acc.errors.push(ErrorRef {
                index,
                display_text: entry.display_text.clone(),
                timestamp: entry.timestamp.clone(),
            });
        }

        if let Some(minute) = entry.timestamp.as_ref().and_then(minute_key) {
            bump(&mut acc.timeline, &minute);
            if is_error {
                bump(&mut acc.error_timeline, &minute);
            }
        }

        for name in resource_references(&entry.display_text) {
            bump(&mut acc.resources, name);
        }
        if let Some(resource_type) = entry.resource_type.as_deref() {
            bump(&mut acc.resources, resource_type);
        }
        if let Some(provider) = provider_reference(&entry.display_text) {
            bump(&mut acc.providers, provider);
        }
    }

    pub fn finish(self) -> Aggregates {
        self.acc
    }
}

impl EntryObserver for Aggregator {
    fn observe(&mut self, index: usize, entry: &LogEntry) {
        self.feed(index, entry);
    }
}
