use crate::error::CrawlError;

/// Events emitted by the crawler for monitoring/logging.
#[derive(Debug, Clone)]
pub enum CrawlEvent<'a> {
    CrawlStarted {
        start: &'a str,
        depth: usize,
    },
    LevelStarted {
        level: usize,
        frontier: usize,
    },
    PageFetched {
        address: &'a str,
    },
    FetchFailed {
        address: &'a str,
        error: &'a CrawlError,
    },
    ExtractFailed {
        address: &'a str,
        error: &'a CrawlError,
    },
    LevelCompleted {
        level: usize,
        fetched: usize,
        discovered: usize,
    },
    /// The controller stopped waiting at a barrier.
    Cancelled {
        start: &'a str,
        level: usize,
    },
    CrawlFinished {
        start: &'a str,
        levels: usize,
        downloaded: usize,
        errors: usize,
    },
    ShutDown,
}

/// Trait for receiving crawl events (decoupled logging).
pub trait CrawlReporter: Send + Sync {
    fn report(&self, event: CrawlEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl CrawlReporter for NullReporter {}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCrawlReporter;

impl CrawlReporter for TracingCrawlReporter {
    fn report(&self, event: CrawlEvent<'_>) {
        match event {
            CrawlEvent::CrawlStarted { start, depth } => {
                tracing::info!(%start, %depth, "Crawl started");
            }
            CrawlEvent::LevelStarted { level, frontier } => {
                tracing::debug!(%level, %frontier, "Fetching level");
            }
            CrawlEvent::PageFetched { address } => {
                tracing::debug!(%address, "Page fetched");
            }
            CrawlEvent::FetchFailed { address, error } => {
                tracing::warn!(%address, %error, "Fetch failed");
            }
            CrawlEvent::ExtractFailed { address, error } => {
                tracing::debug!(%address, %error, "Link extraction failed");
            }
            CrawlEvent::LevelCompleted {
                level,
                fetched,
                discovered,
            } => {
                tracing::info!(%level, %fetched, %discovered, "Level completed");
            }
            CrawlEvent::Cancelled { start, level } => {
                tracing::warn!(%start, %level, "Crawl cancelled, not waiting for stragglers");
            }
            CrawlEvent::CrawlFinished {
                start,
                levels,
                downloaded,
                errors,
            } => {
                tracing::info!(%start, %levels, %downloaded, %errors, "Crawl finished");
            }
            CrawlEvent::ShutDown => {
                tracing::info!("Crawler shut down");
            }
        }
    }
}
