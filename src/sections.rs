//! Plan/apply phase tracking over the entry stream.
//!
//! The tracker is a three-state machine (idle, in plan, in apply). A phase
//! start while a section is open abandons the open one: it is recorded
//! without an end index and therefore runs to the end of the stream.

use crate::observer::EntryObserver;
use crate::parser::LogEntry;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Plan,
    Apply,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub kind: SectionKind,
    pub start_index: usize,
    /// `None` when the section was never closed by a phase-end line.
    pub end_index: Option<usize>,
}

static PLAN_START: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)an execution plan has been generated").unwrap(),
        Regex::new(r"(?i)terraform will perform the following actions").unwrap(),
        Regex::new(r"(?i)^#\s+resource").unwrap(),
        Regex::new(r"(?i)planning to").unwrap(),
        Regex::new(r"(?i)^plan: .* to add").unwrap(),
    ]
});

static APPLY_START: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)applying the following plan").unwrap(),
        Regex::new(r"(?i)^running apply").unwrap(),
        Regex::new(r"(?i)\bterraform apply\b").unwrap(),
    ]
});

static PHASE_END: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)apply complete").unwrap(),
        Regex::new(r"(?i)no changes. infrastructure is up-to-date").unwrap(),
        Regex::new(r"(?i)no changes. your infrastructure matches the configuration").unwrap(),
        Regex::new(r"(?i)^plan: .* to add, .* to change, .* to destroy").unwrap(),
    ]
});

/// What a single line means to the tracker. A line may both start and end a
/// phase (the plan-result sentence does).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhaseMarkers {
    pub start: Option<SectionKind>,
    pub end: bool,
}

pub fn phase_markers(text: &str) -> PhaseMarkers {
    let start = if PLAN_START.iter().any(|re| re.is_match(text)) {
        Some(SectionKind::Plan)
    } else if APPLY_START.iter().any(|re| re.is_match(text)) {
        Some(SectionKind::Apply)
    } else {
        None
    };
    PhaseMarkers { start, end: PHASE_END.iter().any(|re| re.is_match(text)) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum TrackerState {
    #[default]
    Idle,
    InPlan { start: usize },
    InApply { start: usize },
}

impl TrackerState {
    fn opened(kind: SectionKind, start: usize) -> Self {
        match kind {
            SectionKind::Plan => TrackerState::InPlan { start },
            SectionKind::Apply => TrackerState::InApply { start },
        }
    }

    fn current(self) -> Option<(SectionKind, usize)> {
        match self {
            TrackerState::Idle => None,
            TrackerState::InPlan { start } => Some((SectionKind::Plan, start)),
            TrackerState::InApply { start } => Some((SectionKind::Apply, start)),
        }
    }
}

#[derive(Debug, Default)]
pub struct SectionTracker {
    state: TrackerState,
    sections: Vec<Section>,
}

impl SectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, index: usize, text: &str) {
        let markers = phase_markers(text);
        if let Some(kind) = markers.start {
            self.release(None);
            self.state = TrackerState::opened(kind, index);
        }
        if markers.end {
            self.release(Some(index));
        }
    }

    /// Kind of the section currently open, if any.
    pub fn current(&self) -> Option<SectionKind> {
        self.state.current().map(|(kind, _)| kind)
    }

    fn release(&mut self, end_index: Option<usize>) {
        if let Some((kind, start_index)) = self.state.current() {
            self.sections.push(Section { kind, start_index, end_index });
        }
        self.state = TrackerState::Idle;
    }

    /// Closes a trailing open section at end of input and returns every
    /// section in opening order.
    pub fn finish(mut self) -> Vec<Section> {
        self.release(None);
        self.sections
    }
}

impl EntryObserver for SectionTracker {
    fn observe(&mut self, index: usize, entry: &LogEntry) {
        self.feed(index, &entry.display_text);
    }
}

/// Stamps each entry with the kind of the sections covering it. Open-ended
/// sections run to the last entry; later sections win on overlap.
pub fn assign_sections(entries: &mut [LogEntry], sections: &[Section]) {
    let Some(last) = entries.len().checked_sub(1) else { return };
    for section in sections {
        let end = section.end_index.unwrap_or(last).min(last);
        if section.start_index > end {
            continue;
        }
        for entry in &mut entries[section.start_index..=end] {
            entry.section = Some(section.kind);
        }
    }
}
