pub mod cache;
pub mod config;
pub mod crawler;
pub mod error;
pub mod models;
pub mod pool;
pub mod reporter;
pub mod state;
pub mod throttle;
pub mod traits;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use cache::CachingDownloader;
pub use config::CrawlerConfig;
pub use crawler::WebCrawler;
pub use error::CrawlError;
pub use models::{CrawlReport, CrawlResult};
pub use reporter::{CrawlEvent, CrawlReporter, NullReporter, TracingCrawlReporter};
pub use traits::{Downloader, Page};
