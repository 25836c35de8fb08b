//! Engine entry point: decoded log text in, [`AnalysisResult`] out.
//!
//! Normalization runs first; the section tracker, plan scanner, correlation
//! grouper and aggregator then observe the finished entry stream in a single
//! pass. The call is pure: identical input yields an identical result.

use crate::aggregate::{self, Aggregator, CountItem, CountTable, ErrorRef};
use crate::correlation::{CorrelationGrouper, CorrelationGroups};
use crate::gantt::{self, GanttBar};
use crate::input::{self, InputError, InputLimits};
use crate::level::Level;
use crate::observer::EntryObserver;
use crate::parser::{self, LogEntry};
use crate::plan::{PlanSummary, PlanSummaryScanner};
use crate::sections::{self, Section, SectionKind, SectionTracker};
use crate::timestamp::{self, Timestamp};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub entries: Vec<LogEntry>,
    pub levels: BTreeMap<Level, usize>,
    pub errors: Vec<ErrorRef>,
    pub plan_summary: PlanSummary,
    pub sections: Vec<Section>,
    pub resource_counts: CountTable,
    pub provider_counts: CountTable,
    pub timeline: CountTable,
    pub error_timeline: CountTable,
    pub correlation_groups: CorrelationGroups,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SectionCounts {
    pub plan: usize,
    pub apply: usize,
}

/// Statistics-only view of a result (no entries).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub total_entries: usize,
    pub levels: BTreeMap<Level, usize>,
    pub error_count: usize,
    pub plan_summary: PlanSummary,
    pub section_counts: SectionCounts,
    pub top_resources: Vec<CountItem>,
    pub top_providers: Vec<CountItem>,
    pub timeline: CountTable,
    pub error_timeline: CountTable,
    pub correlation_group_count: usize,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub fn analyze(text: &str) -> AnalysisResult {
    analyze_lines(parser::non_blank_lines(text))
}

/// Like [`analyze`] for text that is already split into lines. Blank lines
/// are still skipped.
pub fn analyze_lines<'a, I>(lines: I) -> AnalysisResult
where
    I: IntoIterator<Item = &'a str>,
{
    let mut entries: Vec<LogEntry> = lines
        .into_iter()
        .filter(|l| !l.trim().is_empty())
        .map(parser::parse_line)
        .collect();

    let mut tracker = SectionTracker::new();
    let mut plan = PlanSummaryScanner::default();
    let mut grouper = CorrelationGrouper::default();
    let mut aggregator = Aggregator::new();
    {
        let mut observers: [&mut dyn EntryObserver; 4] = [&mut tracker, &mut plan, &mut grouper, &mut aggregator];
        for (index, entry) in entries.iter().enumerate() {
            for observer in observers.iter_mut() {
                observer.observe(index, entry);
            }
        }
    }

    let sections = tracker.finish();
    sections::assign_sections(&mut entries, &sections);
    let aggregates = aggregator.finish();

    let result = AnalysisResult {
        entries,
        levels: aggregates.levels,
        errors: aggregates.errors,
        plan_summary: plan.finish(),
        sections,
        resource_counts: aggregates.resources,
        provider_counts: aggregates.providers,
        timeline: aggregates.timeline,
        error_timeline: aggregates.error_timeline,
        correlation_groups: grouper.finish(),
    };
    debug!(
        entries = result.entries.len(),
        errors = result.errors.len(),
        sections = result.sections.len(),
        groups = result.correlation_groups.len(),
        plan_found = result.plan_summary.found,
        "log analysis complete"
    );
    result
}

/// Applies the input boundary checks, then analyses the decoded text.
pub fn analyze_bytes(bytes: &[u8], limits: &InputLimits) -> Result<AnalysisResult, InputError> {
    let text = input::decode(bytes, limits)?;
    Ok(analyze(text))
}

impl AnalysisResult {
    pub fn total_entries(&self) -> usize {
        self.entries.len()
    }

    pub fn gantt(&self) -> Vec<GanttBar> {
        gantt::project(&self.entries, &self.correlation_groups)
    }

    pub fn section_counts(&self) -> SectionCounts {
        let mut counts = SectionCounts::default();
        for entry in &self.entries {
            match entry.section {
                Some(SectionKind::Plan) => counts.plan += 1,
                Some(SectionKind::Apply) => counts.apply += 1,
                None => {}
            }
        }
        counts
    }

    pub fn summary(&self, top_n: usize) -> AnalysisSummary {
        let instants = self
            .entries
            .iter()
            .filter_map(|e| e.timestamp.as_ref().and_then(Timestamp::instant));
        let start = instants.clone().min();
        let end = instants.max();
        AnalysisSummary {
            total_entries: self.total_entries(),
            levels: self.levels.clone(),
            error_count: self.errors.len(),
            plan_summary: self.plan_summary,
            section_counts: self.section_counts(),
            top_resources: aggregate::top_counts(&self.resource_counts, top_n),
            top_providers: aggregate::top_counts(&self.provider_counts, top_n),
            timeline: self.timeline.clone(),
            error_timeline: self.error_timeline.clone(),
            correlation_group_count: self.correlation_groups.len(),
            start_date: start.map(timestamp::format_instant),
            end_date: end.map(timestamp::format_instant),
        }
    }
}
