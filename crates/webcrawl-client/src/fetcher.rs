use std::time::Duration;

use reqwest::Client;
use webcrawl_core::error::CrawlError;
use webcrawl_core::traits::Downloader;

use crate::html::HtmlPage;

/// User-Agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("webcrawl/", env!("CARGO_PKG_VERSION"));

/// HTTP downloader using reqwest.
///
/// Downloads raw HTML with a configurable User-Agent and timeout. Only
/// `http` and `https` addresses are fetched.
#[derive(Clone)]
pub struct ReqwestDownloader {
    client: Client,
    timeout_secs: u64,
}

impl ReqwestDownloader {
    pub fn new() -> Result<Self, CrawlError> {
        Self::with_options(Duration::from_secs(30), DEFAULT_USER_AGENT)
    }

    pub fn with_options(timeout: Duration, user_agent: &str) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| CrawlError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout_secs: timeout.as_secs(),
        })
    }
}

impl Downloader for ReqwestDownloader {
    type Page = HtmlPage;

    async fn download(&self, address: &str) -> Result<HtmlPage, CrawlError> {
        check_scheme(address)?;

        let response = self.client.get(address).send().await.map_err(|e| {
            if e.is_timeout() {
                CrawlError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                CrawlError::Network(format!("Connection failed: {e}"))
            } else {
                CrawlError::Fetch(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Fetch(format!(
                "HTTP {} for {}",
                status.as_u16(),
                address
            )));
        }

        // Relative links resolve against where we ended up after redirects.
        let final_url = response.url().to_string();
        let html = response
            .text()
            .await
            .map_err(|e| CrawlError::Fetch(format!("Failed to read response body: {e}")))?;

        Ok(HtmlPage::new(final_url, html))
    }
}

fn check_scheme(address: &str) -> Result<(), CrawlError> {
    let parsed =
        url::Url::parse(address).map_err(|e| CrawlError::Fetch(format!("Invalid URL: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(CrawlError::Fetch(format!(
            "URL scheme '{scheme}' is not supported (only http/https)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_scheme_accepts_http() {
        assert!(check_scheme("http://example.com/").is_ok());
        assert!(check_scheme("https://example.com/a?b=c").is_ok());
    }

    #[test]
    fn test_check_scheme_rejects_other_schemes() {
        let err = check_scheme("file:///etc/passwd").unwrap_err();
        assert!(err.to_string().contains("not supported"));
        let err = check_scheme("not a url").unwrap_err();
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[tokio::test]
    async fn test_download_rejects_bad_scheme_without_network() {
        let downloader = ReqwestDownloader::new().unwrap();
        let err = downloader.download("ftp://example.com/").await.unwrap_err();
        assert!(matches!(err, CrawlError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_transport_error() {
        let downloader =
            ReqwestDownloader::with_options(Duration::from_secs(2), "webcrawl-test").unwrap();
        // Port 9 on localhost (discard) is essentially never listening.
        let err = downloader
            .download("http://127.0.0.1:9/")
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }
}
