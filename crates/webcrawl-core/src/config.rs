use crate::error::CrawlError;

/// Limits for a [`WebCrawler`](crate::crawler::WebCrawler) instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlerConfig {
    /// Maximum number of concurrent fetches.
    pub downloaders: usize,
    /// Maximum number of pages being link-extracted at the same time.
    pub extractors: usize,
    /// Maximum number of concurrent fetches against a single host.
    pub per_host: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            downloaders: 1,
            extractors: 1,
            per_host: 1,
        }
    }
}

impl CrawlerConfig {
    pub fn new(downloaders: usize, extractors: usize, per_host: usize) -> Self {
        Self {
            downloaders,
            extractors,
            per_host,
        }
    }

    /// Reject zero-sized pools and throttle limits.
    pub fn validate(&self) -> Result<(), CrawlError> {
        for (name, value) in [
            ("downloaders", self.downloaders),
            ("extractors", self.extractors),
            ("per_host", self.per_host),
        ] {
            if value == 0 {
                return Err(CrawlError::Config(format!("{name} must be at least 1")));
            }
        }
        Ok(())
    }

    /// Read configuration from environment variables.
    ///
    /// - `WEBCRAWL_DOWNLOADERS` (optional, defaults to 1)
    /// - `WEBCRAWL_EXTRACTORS` (optional, defaults to 1)
    /// - `WEBCRAWL_PER_HOST` (optional, defaults to 1)
    pub fn from_env() -> Result<Self, CrawlError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CrawlError> {
        let defaults = Self::default();
        let config = Self {
            downloaders: read_limit(&lookup, "WEBCRAWL_DOWNLOADERS", defaults.downloaders)?,
            extractors: read_limit(&lookup, "WEBCRAWL_EXTRACTORS", defaults.extractors)?,
            per_host: read_limit(&lookup, "WEBCRAWL_PER_HOST", defaults.per_host)?,
        };
        config.validate()?;
        Ok(config)
    }
}

fn read_limit(
    lookup: impl Fn(&str) -> Option<String>,
    var: &str,
    default: usize,
) -> Result<usize, CrawlError> {
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            CrawlError::Config(format!("Invalid {var} '{raw}': must be a positive integer"))
        }),
    }
}
