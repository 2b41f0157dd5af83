use std::collections::HashSet;

/// Exact, case-sensitive identity of a record within one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub source: String,
    pub name: String,
    pub price: String,
    pub store: String,
}

/// Keys seen so far in the current run. Nothing is ever removed.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<DedupKey>,
}

impl Deduplicator {
    /// Returns `true` the first time a key is offered.
    pub fn admit(&mut self, key: DedupKey) -> bool {
        self.seen.insert(key)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }
}
