//! Level-by-level crawl engine.
//!
//! Each level fetches the whole frontier through the fetch pool, waits for
//! every fetch, extracts links from the fetched pages through the extraction
//! pool, waits again, and builds the next frontier from addresses never seen
//! before. The loop runs at most `depth` times.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::join_all;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::config::CrawlerConfig;
use crate::error::CrawlError;
use crate::models::CrawlResult;
use crate::pool::WorkerPool;
use crate::reporter::{CrawlEvent, CrawlReporter, TracingCrawlReporter};
use crate::state::CrawlState;
use crate::throttle::HostThrottle;
use crate::traits::{Downloader, Page};

/// Concurrent crawler over any [`Downloader`].
///
/// Cloning is cheap and yields a handle to the same engine: clones share the
/// pools, the host throttle and the visited/fetched/error bookkeeping, which
/// persists across `download` calls until the engine is dropped.
///
/// Must be used from within a tokio runtime.
pub struct WebCrawler<D: Downloader> {
    inner: Arc<Engine<D>>,
}

impl<D: Downloader> Clone for WebCrawler<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Engine<D: Downloader> {
    downloader: D,
    fetch_pool: WorkerPool,
    extract_pool: WorkerPool,
    throttle: HostThrottle,
    state: CrawlState,
    reporter: Arc<dyn CrawlReporter>,
    shut_down: AtomicBool,
}

impl<D: Downloader> WebCrawler<D> {
    /// Create a crawler that logs through `tracing`.
    pub fn new(downloader: D, config: CrawlerConfig) -> Result<Self, CrawlError> {
        Self::with_reporter(downloader, config, TracingCrawlReporter)
    }

    pub fn with_limits(
        downloader: D,
        downloaders: usize,
        extractors: usize,
        per_host: usize,
    ) -> Result<Self, CrawlError> {
        Self::new(downloader, CrawlerConfig::new(downloaders, extractors, per_host))
    }

    pub fn with_reporter<R>(
        downloader: D,
        config: CrawlerConfig,
        reporter: R,
    ) -> Result<Self, CrawlError>
    where
        R: CrawlReporter + 'static,
    {
        config.validate()?;
        let engine = Engine {
            downloader,
            fetch_pool: WorkerPool::new("fetch pool", config.downloaders),
            extract_pool: WorkerPool::new("extraction pool", config.extractors),
            throttle: HostThrottle::new(config.per_host),
            state: CrawlState::new(),
            reporter: Arc::new(reporter),
            shut_down: AtomicBool::new(false),
        };
        Ok(Self {
            inner: Arc::new(engine),
        })
    }

    /// Crawl from `start`, visiting at most `depth` levels.
    ///
    /// Never fails: individual fetch errors end up in the returned error map.
    pub async fn download(&self, start: &str, depth: usize) -> CrawlResult {
        self.download_with_cancel(start, depth, CancellationToken::new())
            .await
    }

    /// Like [`download`](Self::download), but stops waiting for the current
    /// level as soon as `cancel` fires.
    ///
    /// Tasks already dispatched keep running in the background and still
    /// update the shared state; the returned result only covers what the
    /// controller collected before cancellation.
    pub async fn download_with_cancel(
        &self,
        start: &str,
        depth: usize,
        cancel: CancellationToken,
    ) -> CrawlResult {
        let engine = &self.inner;

        if depth == 0 {
            tracing::warn!(%start, "Depth must be at least 1, nothing to crawl");
            return CrawlResult {
                downloaded: Vec::new(),
                errors: engine.state.errors_snapshot(),
            };
        }

        engine
            .reporter
            .report(CrawlEvent::CrawlStarted { start, depth });

        engine.state.mark_visited(start);
        let mut frontier = vec![start.to_string()];
        let mut downloaded = Vec::new();
        let mut remaining = depth;
        let mut level = 0;

        while !frontier.is_empty() && remaining >= 1 {
            level += 1;
            engine.reporter.report(CrawlEvent::LevelStarted {
                level,
                frontier: frontier.len(),
            });

            let fetches: Vec<_> = frontier
                .iter()
                .map(|address| engine.spawn_fetch(address.clone()))
                .collect();
            let Some(outcomes) = wait_all(fetches, &cancel).await else {
                engine
                    .reporter
                    .report(CrawlEvent::Cancelled { start, level });
                break;
            };

            let mut pages = Vec::new();
            for (address, outcome) in frontier.into_iter().zip(outcomes) {
                match outcome {
                    Ok(Some(page)) => {
                        downloaded.push(address.clone());
                        pages.push((address, page));
                    }
                    Ok(None) => {}
                    Err(e) => engine.record_fetch_failure(&address, task_failure(e)),
                }
            }
            let fetched = pages.len();

            // Links found on the last level could never be visited.
            if remaining == 1 {
                engine.reporter.report(CrawlEvent::LevelCompleted {
                    level,
                    fetched,
                    discovered: 0,
                });
                break;
            }

            let extractions: Vec<_> = pages
                .into_iter()
                .map(|(address, page)| engine.spawn_extract(address, page))
                .collect();
            let Some(link_lists) = wait_all(extractions, &cancel).await else {
                engine
                    .reporter
                    .report(CrawlEvent::Cancelled { start, level });
                break;
            };

            let mut next = Vec::new();
            for links in link_lists.into_iter().flatten() {
                for link in links {
                    if engine.state.mark_visited(&link) {
                        next.push(link);
                    }
                }
            }

            engine.reporter.report(CrawlEvent::LevelCompleted {
                level,
                fetched,
                discovered: next.len(),
            });
            frontier = next;
            remaining -= 1;
        }

        let errors = engine.state.errors_snapshot();
        engine.reporter.report(CrawlEvent::CrawlFinished {
            start,
            levels: level,
            downloaded: downloaded.len(),
            errors: errors.len(),
        });

        CrawlResult { downloaded, errors }
    }

    /// Stop admitting work on both pools and the host throttle. Idempotent.
    ///
    /// In-flight fetches and extractions run to completion. Downloads still
    /// running record `PoolClosed` for every fetch they can no longer submit.
    pub fn shutdown(&self) {
        let engine = &self.inner;
        if engine.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        engine.throttle.close();
        engine.fetch_pool.close();
        engine.extract_pool.close();
        engine.reporter.report(CrawlEvent::ShutDown);
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::Acquire)
    }

    pub fn was_fetched(&self, address: &str) -> bool {
        self.inner.state.was_fetched(address)
    }

    pub fn fetched_count(&self) -> usize {
        self.inner.state.fetched_count()
    }

    pub fn visited_count(&self) -> usize {
        self.inner.state.visited_count()
    }

    /// Snapshot of every failure recorded so far.
    pub fn errors(&self) -> std::collections::HashMap<String, CrawlError> {
        self.inner.state.errors_snapshot()
    }
}

impl<D: Downloader> Engine<D> {
    fn spawn_fetch(self: &Arc<Self>, address: String) -> JoinHandle<Option<D::Page>> {
        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.fetch(&address).await })
    }

    async fn fetch(&self, address: &str) -> Option<D::Page> {
        match self.try_fetch(address).await {
            Ok(page) => {
                self.state.record_fetched(address);
                self.reporter.report(CrawlEvent::PageFetched { address });
                Some(page)
            }
            Err(error) => {
                self.record_fetch_failure(address, error);
                None
            }
        }
    }

    async fn try_fetch(&self, address: &str) -> Result<D::Page, CrawlError> {
        // Host admission first, so waiting on a busy host never holds a pool slot.
        let _host = self.throttle.admit(address).await?;
        self.fetch_pool
            .run(self.downloader.download(address))
            .await?
    }

    fn record_fetch_failure(&self, address: &str, error: CrawlError) {
        self.reporter.report(CrawlEvent::FetchFailed {
            address,
            error: &error,
        });
        self.state.record_failure(address, error);
    }

    fn spawn_extract(self: &Arc<Self>, address: String, page: D::Page) -> JoinHandle<Vec<String>> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let links = engine
                .extract_pool
                .run_blocking(move || page.extract_links())
                .await
                .and_then(|links| links);
            match links {
                Ok(links) => links,
                Err(error) => {
                    engine.reporter.report(CrawlEvent::ExtractFailed {
                        address: &address,
                        error: &error,
                    });
                    Vec::new()
                }
            }
        })
    }
}

/// Wait for every task of a level, unless `cancel` fires first.
///
/// Dropping the handles on cancellation detaches the tasks; they keep running.
async fn wait_all<T>(
    handles: Vec<JoinHandle<T>>,
    cancel: &CancellationToken,
) -> Option<Vec<Result<T, JoinError>>> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => None,
        results = join_all(handles) => Some(results),
    }
}

fn task_failure(e: JoinError) -> CrawlError {
    CrawlError::Fetch(format!("fetch task failed: {e}"))
}
