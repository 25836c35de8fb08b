//! Per-operation bars for timeline rendering, derived from correlation groups.
//!
//! Groups whose members carry no parseable timestamp have nowhere to sit on a
//! time axis and are left out of the projection.

use crate::correlation::CorrelationGroups;
use crate::parser::LogEntry;
use crate::timestamp::{serialize_instant, Timestamp};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GanttBar {
    pub correlation_id: String,
    #[serde(serialize_with = "serialize_instant")]
    pub start: DateTime<Utc>,
    #[serde(serialize_with = "serialize_instant")]
    pub end: DateTime<Utc>,
    pub duration_ms: i64,
    pub has_error: bool,
    /// All members of the group, timestamped or not.
    pub count: usize,
}

pub fn project(entries: &[LogEntry], groups: &CorrelationGroups) -> Vec<GanttBar> {
    let mut bars: Vec<GanttBar> = groups
        .iter()
        .filter_map(|(id, indices)| bar_for_group(id, indices, entries))
        .collect();
    bars.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| b.duration_ms.cmp(&a.duration_ms))
            .then_with(|| a.correlation_id.cmp(&b.correlation_id))
    });
    bars
}

fn bar_for_group(id: &str, indices: &[usize], entries: &[LogEntry]) -> Option<GanttBar> {
    let mut span: Option<(DateTime<Utc>, DateTime<Utc>)> = None;
    let mut has_error = false;
    for entry in indices.iter().filter_map(|&i| entries.get(i)) {
        has_error |= entry.level.is_error();
        if let Some(t) = entry.timestamp.as_ref().and_then(Timestamp::instant) {
            span = Some(match span {
                None => (t, t),
                Some((start, end)) => (start.min(t), end.max(t)),
            });
        }
    }
    let (start, end) = span?;
    Some(GanttBar {
        correlation_id: id.to_string(),
        start,
        end,
        duration_ms: (end - start).num_milliseconds(),
        has_error,
        count: indices.len(),
    })
}
