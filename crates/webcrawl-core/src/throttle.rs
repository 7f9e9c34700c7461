//! Per-host admission control for fetches.
//!
//! Caps the number of in-flight fetches against one remote host independently
//! of the fetch pool size, so a slow host cannot occupy every fetch slot.
//! Admission is taken *before* a fetch-pool slot is requested: a fetch waiting
//! for its host never holds a pool slot.
//!
//! # Example
//!
//! ```rust
//! use webcrawl_core::throttle::HostThrottle;
//!
//! # async fn run() -> Result<(), webcrawl_core::CrawlError> {
//! let throttle = HostThrottle::new(2);
//! let permit = throttle.admit("https://example.com/a").await?;
//! assert!(permit.is_some());
//! assert_eq!(throttle.in_flight("example.com"), 1);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use url::Url;

use crate::error::CrawlError;

/// Counting gate per remote host.
#[derive(Debug)]
pub struct HostThrottle {
    per_host: usize,
    gates: DashMap<String, Arc<Semaphore>>,
    closed: AtomicBool,
}

impl HostThrottle {
    /// `per_host` must be non-zero; [`CrawlerConfig::validate`] checks it.
    ///
    /// [`CrawlerConfig::validate`]: crate::CrawlerConfig::validate
    pub fn new(per_host: usize) -> Self {
        debug_assert!(per_host > 0, "host throttle needs at least one slot per host");
        Self {
            per_host,
            gates: DashMap::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Extract the host an address is throttled under.
    ///
    /// Addresses that do not parse as URLs with a host are not gated.
    pub fn host_key(address: &str) -> Option<String> {
        let url = Url::parse(address).ok()?;
        url.host_str().map(str::to_string)
    }

    fn gate(&self, host: &str) -> Arc<Semaphore> {
        let gate = Arc::clone(
            self.gates
                .entry(host.to_string())
                .or_insert_with(|| Arc::new(Semaphore::new(self.per_host)))
                .value(),
        );
        // A gate created after close() must not admit anything either.
        if self.closed.load(Ordering::Acquire) {
            gate.close();
        }
        gate
    }

    /// Wait until the address's host has spare capacity.
    ///
    /// Returns `None` for addresses without a host. The returned permit frees
    /// the host slot when dropped.
    pub async fn admit(&self, address: &str) -> Result<Option<OwnedSemaphorePermit>, CrawlError> {
        let Some(host) = Self::host_key(address) else {
            return Ok(None);
        };
        let gate = self.gate(&host);

        if gate.available_permits() == 0 {
            tracing::debug!(%host, "Waiting for host capacity");
        }

        gate.acquire_owned()
            .await
            .map(Some)
            .map_err(|_| CrawlError::PoolClosed("host throttle".into()))
    }

    /// Number of admitted, not yet released fetches for `host`.
    pub fn in_flight(&self, host: &str) -> usize {
        self.gates
            .get(host)
            .map(|gate| self.per_host.saturating_sub(gate.available_permits()))
            .unwrap_or(0)
    }

    /// Fail all pending and future admissions. Idempotent.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        for gate in self.gates.iter() {
            gate.value().close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
