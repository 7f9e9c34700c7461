use thiserror::Error;

/// Crawl-wide error types.
///
/// Fetch and extraction errors are captured as data (error map entries or an
/// empty link list) and never abort a crawl. Only [`CrawlError::Config`] is
/// surfaced as control flow, at engine construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CrawlError {
    /// Fetching a single address failed.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The page content could not be turned into a list of links.
    #[error("Extract error: {0}")]
    Extract(String),

    /// Invalid pool size or per-host limit.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Work was submitted after the engine was shut down.
    #[error("{0} is closed")]
    PoolClosed(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Network/connection error.
    #[error("Network error: {0}")]
    Network(String),
}

impl CrawlError {
    /// Returns true if the failure came from the transport rather than from
    /// the engine itself.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CrawlError::Fetch(_) | CrawlError::Timeout(_) | CrawlError::Network(_)
        )
    }

    /// Returns true if the error was caused by submitting work after shutdown.
    pub fn is_pool_closed(&self) -> bool {
        matches!(self, CrawlError::PoolClosed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors() {
        assert!(CrawlError::Fetch("404".into()).is_transport());
        assert!(CrawlError::Timeout(30).is_transport());
        assert!(CrawlError::Network("reset".into()).is_transport());
        assert!(!CrawlError::PoolClosed("fetch pool".into()).is_transport());
        assert!(!CrawlError::Extract("bad html".into()).is_transport());
    }

    #[test]
    fn test_pool_closed_display() {
        let err = CrawlError::PoolClosed("fetch pool".into());
        assert!(err.is_pool_closed());
        assert_eq!(err.to_string(), "fetch pool is closed");
    }
}
