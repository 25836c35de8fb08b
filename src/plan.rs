use crate::observer::EntryObserver;
use crate::parser::LogEntry;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Counts from the `Plan: N to add, N to change, N to destroy` sentence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub adds: u64,
    pub changes: u64,
    pub destroys: u64,
    pub found: bool,
}

static RE_PLAN_RESULT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Plan:\s*(\d+)\s*to add,\s*(\d+)\s*to change,\s*(\d+)\s*to destroy").unwrap()
});

pub fn parse_plan_summary(text: &str) -> Option<PlanSummary> {
    let caps = RE_PLAN_RESULT.captures(text)?;
    Some(PlanSummary {
        adds: count(&caps[1]),
        changes: count(&caps[2]),
        destroys: count(&caps[3]),
        found: true,
    })
}

// Digits only, so the one failure is overflow; it saturates.
fn count(digits: &str) -> u64 {
    digits.parse().unwrap_or(u64::MAX)
}

/// Keeps the first plan-result sentence seen; later ones are ignored.
#[derive(Debug, Default)]
pub struct PlanSummaryScanner {
    summary: PlanSummary,
}

impl PlanSummaryScanner {
    pub fn feed(&mut self, text: &str) {
        if self.summary.found {
            return;
        }
        if let Some(summary) = parse_plan_summary(text) {
            self.summary = summary;
        }
    }

    pub fn finish(self) -> PlanSummary {
        self.summary
    }
}

impl EntryObserver for PlanSummaryScanner {
    fn observe(&mut self, _index: usize, entry: &LogEntry) {
        self.feed(&entry.display_text);
    }
}
