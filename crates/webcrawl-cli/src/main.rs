use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use webcrawl_client::{DEFAULT_USER_AGENT, ReqwestDownloader};
use webcrawl_core::{
    CachingDownloader, CrawlReport, CrawlResult, CrawlerConfig, Downloader, WebCrawler,
};

#[derive(Parser)]
#[command(name = "webcrawl", version, about = "Concurrent depth-bounded web crawler")]
struct Cli {
    /// Address to start crawling from
    #[arg(default_value = "https://example.com")]
    url: String,

    /// Number of levels to visit (1 = only the start page)
    #[arg(default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    depth: u64,

    /// Maximum number of concurrent downloads [default: $WEBCRAWL_DOWNLOADERS or 1]
    downloaders: Option<usize>,

    /// Maximum number of pages link-extracted at once [default: $WEBCRAWL_EXTRACTORS or 1]
    extractors: Option<usize>,

    /// Maximum number of concurrent downloads per host [default: $WEBCRAWL_PER_HOST or 1]
    per_host: Option<usize>,

    /// Print the report as JSON instead of plain text
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Per-request timeout in seconds
    #[arg(long, env = "WEBCRAWL_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// User-Agent header sent with every request
    #[arg(long, env = "WEBCRAWL_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Keep up to this many pages in memory (0 disables the cache)
    #[arg(long, env = "WEBCRAWL_CACHE_CAPACITY", default_value_t = 0)]
    cache_capacity: u64,
}

impl Cli {
    /// Limits given on the command line take precedence over `base`.
    fn limits(&self, base: CrawlerConfig) -> CrawlerConfig {
        CrawlerConfig::new(
            self.downloaders.unwrap_or(base.downloaders),
            self.extractors.unwrap_or(base.extractors),
            self.per_host.unwrap_or(base.per_host),
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("webcrawl=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.limits(CrawlerConfig::from_env().context("Invalid crawler limits")?);
    let depth = usize::try_from(cli.depth).context("Depth does not fit in usize")?;

    let downloader =
        ReqwestDownloader::with_options(Duration::from_secs(cli.timeout_secs), &cli.user_agent)
            .context("Failed to create HTTP client")?;

    let result = if cli.cache_capacity > 0 {
        let cached = CachingDownloader::new(downloader, cli.cache_capacity);
        crawl(cached, config, &cli.url, depth).await?
    } else {
        crawl(downloader, config, &cli.url, depth).await?
    };

    print_report(&CrawlReport::new(&cli.url, depth, &result), cli.json)
}

async fn crawl<D: Downloader>(
    downloader: D,
    config: CrawlerConfig,
    url: &str,
    depth: usize,
) -> Result<CrawlResult> {
    let crawler = WebCrawler::new(downloader, config).context("Invalid crawler limits")?;

    tracing::info!(
        downloaders = config.downloaders,
        extractors = config.extractors,
        per_host = config.per_host,
        "Crawling {} to depth {}",
        url,
        depth
    );

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, reporting pages downloaded so far");
                cancel.cancel();
            }
        })
    };

    let result = crawler.download_with_cancel(url, depth, cancel).await;
    interrupt.abort();
    crawler.shutdown();

    Ok(result)
}

fn print_report(report: &CrawlReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("Downloaded {} page(s):", report.downloaded.len());
    for url in &report.downloaded {
        println!("  {url}");
    }

    if !report.errors.is_empty() {
        println!("\nFailed {} page(s):", report.errors.len());
        for (url, reason) in &report.errors {
            println!("  {url}: {reason}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["webcrawl"]).unwrap();
        assert_eq!(cli.url, "https://example.com");
        assert_eq!(cli.depth, 1);
        assert!(!cli.json);
        assert_eq!(cli.cache_capacity, 0);
    }

    #[test]
    fn test_positional_arguments() {
        let cli = Cli::try_parse_from(["webcrawl", "https://rust-lang.org", "3", "8", "4", "2"])
            .unwrap();
        assert_eq!(cli.url, "https://rust-lang.org");
        assert_eq!(cli.depth, 3);
        assert_eq!(
            cli.limits(CrawlerConfig::default()),
            CrawlerConfig::new(8, 4, 2)
        );
    }

    #[test]
    fn test_missing_limits_come_from_base_config() {
        let cli = Cli::try_parse_from(["webcrawl", "https://rust-lang.org", "2", "6"]).unwrap();
        assert_eq!(
            cli.limits(CrawlerConfig::new(3, 5, 7)),
            CrawlerConfig::new(6, 5, 7)
        );
    }

    #[test]
    fn test_default_user_agent_matches_client() {
        let cli = Cli::try_parse_from(["webcrawl"]).unwrap();
        assert_eq!(cli.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_zero_depth_is_rejected() {
        assert!(Cli::try_parse_from(["webcrawl", "https://rust-lang.org", "0"]).is_err());
    }
}
