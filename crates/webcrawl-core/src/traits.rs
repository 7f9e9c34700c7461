use std::future::Future;

use crate::error::CrawlError;

/// A successfully fetched page.
pub trait Page: Send + 'static {
    /// Outbound addresses referenced by this page.
    ///
    /// Called on a blocking thread; implementations may do CPU-heavy parsing.
    fn extract_links(&self) -> Result<Vec<String>, CrawlError>;
}

/// Turns an address into a [`Page`].
///
/// The engine is agnostic to transport: HTTP, files or a cache are all fine.
pub trait Downloader: Send + Sync + 'static {
    type Page: Page;

    fn download(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<Self::Page, CrawlError>> + Send;
}
