use crate::parser::LogEntry;

/// A consumer of the normalized entry stream. The section tracker, plan
/// scanner, correlation grouper and aggregator each see every entry once, in
/// stream order, and own their own state.
pub trait EntryObserver {
    fn observe(&mut self, index: usize, entry: &LogEntry);
}

/// Feeds a canned entry list to one observer.
pub fn feed_all<O: EntryObserver + ?Sized>(observer: &mut O, entries: &[LogEntry]) {
    for (index, entry) in entries.iter().enumerate() {
        observer.observe(index, entry);
    }
}
