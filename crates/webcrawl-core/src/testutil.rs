//! Test utilities: an in-memory link graph and a recording reporter.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` or atomics for interior mutability,
//! allowing test assertions on recorded calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::CrawlError;
use crate::reporter::{CrawlEvent, CrawlReporter};
use crate::throttle::HostThrottle;
use crate::traits::{Downloader, Page};

// ---------------------------------------------------------------------------
// MockDownloader
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum MockNode {
    Links(Vec<String>),
    FetchError(String),
    BrokenPage,
}

#[derive(Debug, Default)]
struct InFlight {
    current: usize,
    peak: usize,
    per_host: HashMap<String, (usize, usize)>,
}

#[derive(Debug, Default)]
struct Extractions {
    total: usize,
    current: usize,
    peak: usize,
}

/// Downloader over a fixed link graph.
///
/// Addresses missing from the graph fail with a fetch error. Every clone
/// shares the graph and the recorded statistics.
#[derive(Clone, Default)]
pub struct MockDownloader {
    graph: Arc<Mutex<HashMap<String, MockNode>>>,
    latency: Duration,
    extract_latency: Duration,
    fetches: Arc<Mutex<HashMap<String, usize>>>,
    extractions: Arc<Mutex<Extractions>>,
    in_flight: Arc<Mutex<InFlight>>,
}

impl MockDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulated time spent in every fetch.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Simulated time spent extracting links from every page.
    pub fn with_extract_latency(mut self, latency: Duration) -> Self {
        self.extract_latency = latency;
        self
    }

    /// A page at `address` linking to `links`.
    pub fn page(self, address: &str, links: &[&str]) -> Self {
        let links = links.iter().map(|l| l.to_string()).collect();
        self.insert(address, MockNode::Links(links))
    }

    /// An address whose fetch fails with `reason`.
    pub fn failing(self, address: &str, reason: &str) -> Self {
        self.insert(address, MockNode::FetchError(reason.to_string()))
    }

    /// A page that fetches fine but cannot be link-extracted.
    pub fn broken_page(self, address: &str) -> Self {
        self.insert(address, MockNode::BrokenPage)
    }

    fn insert(self, address: &str, node: MockNode) -> Self {
        self.graph
            .lock()
            .unwrap()
            .insert(address.to_string(), node);
        self
    }

    pub fn fetch_count(&self, address: &str) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .get(address)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.fetches.lock().unwrap().values().sum()
    }

    pub fn extraction_count(&self) -> usize {
        self.extractions.lock().unwrap().total
    }

    /// Highest number of pages observed being extracted at the same time.
    pub fn peak_extractions(&self) -> usize {
        self.extractions.lock().unwrap().peak
    }

    fn page_with(&self, links: Option<Vec<String>>) -> MockPage {
        MockPage {
            links,
            latency: self.extract_latency,
            extractions: Arc::clone(&self.extractions),
        }
    }

    /// Highest number of fetches observed running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.in_flight.lock().unwrap().peak
    }

    /// Highest number of fetches against `host` observed at the same time.
    pub fn peak_for_host(&self, host: &str) -> usize {
        self.in_flight
            .lock()
            .unwrap()
            .per_host
            .get(host)
            .map(|(_, peak)| *peak)
            .unwrap_or(0)
    }

    fn enter(&self, address: &str, host: &str) {
        *self
            .fetches
            .lock()
            .unwrap()
            .entry(address.to_string())
            .or_default() += 1;

        let mut in_flight = self.in_flight.lock().unwrap();
        in_flight.current += 1;
        in_flight.peak = in_flight.peak.max(in_flight.current);
        let (current, peak) = in_flight.per_host.entry(host.to_string()).or_default();
        *current += 1;
        *peak = (*peak).max(*current);
    }

    fn leave(&self, host: &str) {
        let mut in_flight = self.in_flight.lock().unwrap();
        in_flight.current -= 1;
        if let Some((current, _)) = in_flight.per_host.get_mut(host) {
            *current -= 1;
        }
    }
}

impl Downloader for MockDownloader {
    type Page = MockPage;

    async fn download(&self, address: &str) -> Result<MockPage, CrawlError> {
        let host = HostThrottle::host_key(address).unwrap_or_else(|| address.to_string());
        self.enter(address, &host);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.leave(&host);

        let node = self.graph.lock().unwrap().get(address).cloned();
        match node {
            Some(MockNode::Links(links)) => Ok(self.page_with(Some(links))),
            Some(MockNode::BrokenPage) => Ok(self.page_with(None)),
            Some(MockNode::FetchError(reason)) => Err(CrawlError::Fetch(reason)),
            None => Err(CrawlError::Fetch(format!("no such page: {address}"))),
        }
    }
}

/// Page produced by [`MockDownloader`].
#[derive(Debug, Clone)]
pub struct MockPage {
    links: Option<Vec<String>>,
    latency: Duration,
    extractions: Arc<Mutex<Extractions>>,
}

impl Page for MockPage {
    fn extract_links(&self) -> Result<Vec<String>, CrawlError> {
        {
            let mut stats = self.extractions.lock().unwrap();
            stats.total += 1;
            stats.current += 1;
            stats.peak = stats.peak.max(stats.current);
        }
        // Extraction runs on a blocking thread.
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        self.extractions.lock().unwrap().current -= 1;

        self.links
            .clone()
            .ok_or_else(|| CrawlError::Extract("unparseable page".into()))
    }
}

// ---------------------------------------------------------------------------
// RecordingReporter
// ---------------------------------------------------------------------------

/// Reporter that keeps the levels started and a debug line per event.
#[derive(Clone, Default)]
pub struct RecordingReporter {
    levels: Arc<Mutex<Vec<usize>>>,
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingReporter {
    pub fn levels(&self) -> Vec<usize> {
        self.levels.lock().unwrap().clone()
    }

    /// Debug rendering of every event received, in order.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl CrawlReporter for RecordingReporter {
    fn report(&self, event: CrawlEvent<'_>) {
        if let CrawlEvent::LevelStarted { level, .. } = event {
            self.levels.lock().unwrap().push(level);
        }
        self.events.lock().unwrap().push(format!("{event:?}"));
    }
}
