pub mod dedup;
pub mod filter;
pub mod lines;
pub mod query;
pub mod store;

use std::ops::AddAssign;

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::settings::Source;
use crate::source::TextBlockSource;
use dedup::{DedupKey, Deduplicator};
use query::SearchQuery;

/// One extracted listing. Only built once both name and price were found.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub source: String,
    pub name: String,
    pub price: String,
    pub store: String,
    pub observed_at: DateTime<Local>,
}

impl ProductRecord {
    pub fn key(&self) -> DedupKey {
        DedupKey {
            source: self.source.clone(),
            name: self.name.clone(),
            price: self.price.clone(),
            store: self.store.clone(),
        }
    }
}

/// Where accepted records go. Each `save` must be durable when it returns.
pub trait RecordSink {
    /// Returns the stored row id.
    fn save(&mut self, record: &ProductRecord) -> anyhow::Result<i64>;
}

/// Why a block produced no new record. None of these stop the run.
#[derive(Debug, Error)]
pub enum Skip {
    #[error("block lacks a query term or a price")]
    FilteredOut,
    #[error("no qualifying name or price line")]
    Incomplete,
    #[error("already recorded in this run")]
    Duplicate,
    #[error("failed to save record: {0:#}")]
    SaveFailed(anyhow::Error),
}

/// Per-source (or whole-run) block counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub saved: usize,
    pub filtered: usize,
    pub incomplete: usize,
    pub duplicates: usize,
    pub failed: usize,
}

impl Tally {
    fn count(&mut self, outcome: &Result<ProductRecord, Skip>) {
        match outcome {
            Ok(_) => self.saved += 1,
            Err(Skip::FilteredOut) => self.filtered += 1,
            Err(Skip::Incomplete) => self.incomplete += 1,
            Err(Skip::Duplicate) => self.duplicates += 1,
            Err(Skip::SaveFailed(_)) => self.failed += 1,
        }
    }

    pub fn blocks(&self) -> usize {
        self.saved + self.filtered + self.incomplete + self.duplicates + self.failed
    }

    pub fn summary(&self) -> String {
        format!(
            "{} saved, {} filtered, {} incomplete, {} duplicate, {} failed ({} blocks)",
            self.saved,
            self.filtered,
            self.incomplete,
            self.duplicates,
            self.failed,
            self.blocks(),
        )
    }
}

impl AddAssign for Tally {
    fn add_assign(&mut self, other: Self) {
        self.saved += other.saved;
        self.filtered += other.filtered;
        self.incomplete += other.incomplete;
        self.duplicates += other.duplicates;
        self.failed += other.failed;
    }
}

/// State owned by one extraction run: the query and the keys already emitted.
pub struct Run<'q> {
    query: &'q SearchQuery,
    seen: Deduplicator,
}

impl<'q> Run<'q> {
    pub fn new(query: &'q SearchQuery) -> Self {
        Self {
            query,
            seen: Deduplicator::default(),
        }
    }

    /// Records emitted so far.
    pub fn unique(&self) -> usize {
        self.seen.len()
    }

    /// filter → classify → resolve store → dedup → save, for a single block.
    pub fn process_block<S: RecordSink + ?Sized>(
        &mut self,
        source: &Source,
        block: &str,
        sink: &mut S,
    ) -> Result<ProductRecord, Skip> {
        if !filter::is_candidate(block, self.query) {
            return Err(Skip::FilteredOut);
        }
        let (name, price) = lines::classify_lines(block, self.query)
            .complete()
            .ok_or(Skip::Incomplete)?;
        let store = source.store.resolve(&source.label, block, &price, self.query);

        let record = ProductRecord {
            source: source.label.clone(),
            name,
            price,
            store,
            observed_at: Local::now(),
        };
        if !self.seen.admit(record.key()) {
            return Err(Skip::Duplicate);
        }
        sink.save(&record).map_err(Skip::SaveFailed)?;
        Ok(record)
    }

    /// Process every block of one page in document order.
    pub fn process_source<B, S>(&mut self, source: &Source, page: &B, sink: &mut S) -> Tally
    where
        B: TextBlockSource + ?Sized,
        S: RecordSink + ?Sized,
    {
        let mut tally = Tally::default();
        for block in page.text_blocks() {
            let outcome = self.process_block(source, &block, sink);
            match &outcome {
                Ok(r) => debug!(
                    source = %r.source,
                    name = %r.name,
                    price = %r.price,
                    store = %r.store,
                    "saved"
                ),
                Err(e @ Skip::SaveFailed(_)) => warn!(source = %source.label, "{}", e),
                Err(Skip::FilteredOut) => {}
                Err(e) => debug!(source = %source.label, "skipped block: {}", e),
            }
            tally.count(&outcome);
        }
        info!(source = %source.label, "{}", tally.summary());
        tally
    }
}

#[cfg(test)]
impl RecordSink for Vec<ProductRecord> {
    fn save(&mut self, record: &ProductRecord) -> anyhow::Result<i64> {
        self.push(record.clone());
        Ok(self.len() as i64)
    }
}
