use crate::analysis::AnalysisResult;
use crate::level::Level;
use crate::parser::LogEntry;
use crate::timestamp::Timestamp;
use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};

/// Read-only filter over the entries of a finished analysis.
#[derive(Debug, Clone, Default)]
pub struct EntryQuery {
    /// Empty means every level.
    pub levels: Vec<Level>,
    /// Case-insensitive regex; falls back to a substring match when it does
    /// not compile.
    pub search: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

enum Matcher {
    Pattern(Regex),
    Substring(String),
}

impl Matcher {
    fn new(query: &str) -> Self {
        match RegexBuilder::new(query).case_insensitive(true).build() {
            Ok(re) => Matcher::Pattern(re),
            Err(_) => Matcher::Substring(query.to_lowercase()),
        }
    }

    fn is_match(&self, text: &str) -> bool {
        match self {
            Matcher::Pattern(re) => re.is_match(text),
            Matcher::Substring(needle) => text.to_lowercase().contains(needle.as_str()),
        }
    }
}

impl EntryQuery {
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty() && self.search_text().is_none() && self.start.is_none() && self.end.is_none()
    }

    fn search_text(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Matching entries with their stream index, in stream order.
    pub fn run<'a>(&self, result: &'a AnalysisResult) -> Vec<(usize, &'a LogEntry)> {
        let matcher = self.search_text().map(Matcher::new);
        result
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| self.levels.is_empty() || self.levels.contains(&e.level))
            .filter(|(_, e)| self.in_window(e))
            .filter(|(_, e)| match &matcher {
                Some(m) => m.is_match(&e.display_text) || m.is_match(&e.raw_text),
                None => true,
            })
            .collect()
    }

    // [start, end); entries without a parseable timestamp only pass when no
    // bound is set.
    fn in_window(&self, entry: &LogEntry) -> bool {
        if self.start.is_none() && self.end.is_none() {
            return true;
        }
        match entry.timestamp.as_ref().and_then(Timestamp::instant) {
            Some(t) => self.start.map_or(true, |s| t >= s) && self.end.map_or(true, |e| t < e),
            None => false,
        }
    }
}

/// Entries around `index`, clamped to the stream. Empty when `index` is out
/// of range.
pub fn context(result: &AnalysisResult, index: usize, before: usize, after: usize) -> Vec<(usize, &LogEntry)> {
    if index >= result.entries.len() {
        return Vec::new();
    }
    let start = index.saturating_sub(before);
    let end = index.saturating_add(after).min(result.entries.len() - 1);
    (start..=end).filter_map(|i| result.entries.get(i).map(|e| (i, e))).collect()
}
