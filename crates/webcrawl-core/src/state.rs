use std::collections::HashMap;

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};

use crate::error::CrawlError;

/// Dedup and outcome bookkeeping shared by every crawl on one engine.
///
/// All collections only grow: nothing is ever removed, and every insert is
/// atomic with respect to concurrent readers and writers.
#[derive(Debug, Default)]
pub struct CrawlState {
    visited: DashSet<String>,
    fetched: DashSet<String>,
    errors: DashMap<String, CrawlError>,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an address as enqueued. Returns true if it was not seen before.
    pub fn mark_visited(&self, address: &str) -> bool {
        self.visited.insert(address.to_string())
    }

    pub fn is_visited(&self, address: &str) -> bool {
        self.visited.contains(address)
    }

    pub fn record_fetched(&self, address: &str) {
        self.fetched.insert(address.to_string());
    }

    pub fn was_fetched(&self, address: &str) -> bool {
        self.fetched.contains(address)
    }

    /// Record a failure unless one is already recorded for `address`.
    ///
    /// Returns true if this call's error is the one that was kept.
    pub fn record_failure(&self, address: &str, error: CrawlError) -> bool {
        match self.errors.entry(address.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(error);
                true
            }
        }
    }

    pub fn failure(&self, address: &str) -> Option<CrawlError> {
        self.errors.get(address).map(|e| e.value().clone())
    }

    /// Copy of every recorded failure.
    pub fn errors_snapshot(&self) -> HashMap<String, CrawlError> {
        self.errors
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn fetched_count(&self) -> usize {
        self.fetched.len()
    }
}
