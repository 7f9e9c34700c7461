//! In-memory page cache in front of any [`Downloader`].
//!
//! Successful downloads are kept in a bounded `moka` cache keyed by address;
//! concurrent requests for the same address share one underlying fetch.
//! Failures are never cached.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::error::CrawlError;
use crate::traits::Downloader;

pub struct CachingDownloader<D>
where
    D: Downloader,
    D::Page: Clone + Sync,
{
    inner: Arc<D>,
    pages: Cache<String, D::Page>,
}

impl<D> CachingDownloader<D>
where
    D: Downloader,
    D::Page: Clone + Sync,
{
    /// Cache at most `max_capacity` pages, without expiry.
    pub fn new(inner: D, max_capacity: u64) -> Self {
        Self {
            inner: Arc::new(inner),
            pages: Cache::builder().max_capacity(max_capacity).build(),
        }
    }

    /// Cache at most `max_capacity` pages, each for at most `ttl`.
    pub fn with_ttl(inner: D, max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            pages: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn contains(&self, address: &str) -> bool {
        self.pages.contains_key(address)
    }
}

impl<D> Clone for CachingDownloader<D>
where
    D: Downloader,
    D::Page: Clone + Sync,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            pages: self.pages.clone(),
        }
    }
}

impl<D> Downloader for CachingDownloader<D>
where
    D: Downloader,
    D::Page: Clone + Sync,
{
    type Page = D::Page;

    async fn download(&self, address: &str) -> Result<D::Page, CrawlError> {
        self.pages
            .try_get_with(address.to_string(), self.inner.download(address))
            .await
            .map_err(|e| e.as_ref().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockDownloader;
    use crate::traits::Page;

    #[tokio::test]
    async fn second_download_is_served_from_cache() {
        let inner = MockDownloader::new().page("http://a.test/", &["http://b.test/"]);
        let cached = CachingDownloader::new(inner.clone(), 16);

        let first = cached.download("http://a.test/").await.unwrap();
        let second = cached.download("http://a.test/").await.unwrap();

        assert_eq!(inner.fetch_count("http://a.test/"), 1);
        assert_eq!(first.extract_links().unwrap(), second.extract_links().unwrap());
        assert!(cached.contains("http://a.test/"));
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let inner = MockDownloader::new().failing("http://a.test/", "HTTP 502");
        let cached = CachingDownloader::new(inner.clone(), 16);

        let err = cached.download("http://a.test/").await.unwrap_err();
        assert_eq!(err, CrawlError::Fetch("HTTP 502".into()));
        cached.download("http://a.test/").await.unwrap_err();

        assert_eq!(inner.fetch_count("http://a.test/"), 2);
        assert!(!cached.contains("http://a.test/"));
    }

    #[tokio::test]
    async fn expired_pages_are_fetched_again() {
        let inner = MockDownloader::new().page("http://a.test/", &[]);
        let cached = CachingDownloader::with_ttl(inner.clone(), 16, Duration::from_millis(50));

        cached.download("http://a.test/").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        cached.download("http://a.test/").await.unwrap();

        assert_eq!(inner.fetch_count("http://a.test/"), 2);
    }
}
