//! Bounded worker pools.
//!
//! A pool is an admission gate with a fixed number of slots. Work only starts
//! once it holds a slot, and the slot is released when the work finishes.
//! Closing a pool fails every pending and future admission with
//! [`CrawlError::PoolClosed`]; work that already holds a slot runs to
//! completion.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Semaphore, SemaphorePermit};

use crate::error::CrawlError;

#[derive(Debug, Clone)]
pub struct WorkerPool {
    name: &'static str,
    slots: Arc<Semaphore>,
}

impl WorkerPool {
    /// `size` comes from a validated [`CrawlerConfig`](crate::CrawlerConfig)
    /// and must be non-zero.
    pub fn new(name: &'static str, size: usize) -> Self {
        debug_assert!(size > 0, "{name} needs at least one slot");
        Self {
            name,
            slots: Arc::new(Semaphore::new(size)),
        }
    }

    /// Number of free slots right now.
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    async fn admit(&self) -> Result<SemaphorePermit<'_>, CrawlError> {
        self.slots
            .acquire()
            .await
            .map_err(|_| CrawlError::PoolClosed(self.name.to_string()))
    }

    /// Wait for a slot, then drive `task` to completion while holding it.
    pub async fn run<F, T>(&self, task: F) -> Result<T, CrawlError>
    where
        F: Future<Output = T>,
    {
        let _slot = self.admit().await?;
        Ok(task.await)
    }

    /// Wait for a slot, then run `job` on the blocking thread pool.
    pub async fn run_blocking<F, T>(&self, job: F) -> Result<T, CrawlError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let _slot = self.admit().await?;
        tokio::task::spawn_blocking(job)
            .await
            .map_err(|e| CrawlError::Extract(format!("{} job failed: {e}", self.name)))
    }

    /// Stop admitting work. Idempotent.
    pub fn close(&self) {
        self.slots.close();
    }

    pub fn is_closed(&self) -> bool {
        self.slots.is_closed()
    }
}
