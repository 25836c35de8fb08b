use crate::observer::EntryObserver;
use crate::parser::LogEntry;
use std::collections::BTreeMap;

/// Correlation id -> entry indices, in stream order.
pub type CorrelationGroups = BTreeMap<String, Vec<usize>>;

#[derive(Debug, Default)]
pub struct CorrelationGrouper {
    groups: CorrelationGroups,
}

impl CorrelationGrouper {
    pub fn feed(&mut self, index: usize, correlation_id: &str) {
        match self.groups.get_mut(correlation_id) {
            Some(indices) => indices.push(index),
            None => {
                self.groups.insert(correlation_id.to_string(), vec![index]);
            }
        }
    }

    pub fn finish(self) -> CorrelationGroups {
        self.groups
    }
}

impl EntryObserver for CorrelationGrouper {
    fn observe(&mut self, index: usize, entry: &LogEntry) {
        if let Some(id) = entry.correlation_id.as_deref() {
            self.feed(index, id);
        }
    }
}
