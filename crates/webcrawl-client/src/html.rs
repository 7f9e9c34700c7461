use std::collections::HashSet;
use std::sync::Arc;

use scraper::{Html, Selector};
use url::Url;
use webcrawl_core::error::CrawlError;
use webcrawl_core::traits::Page;

/// A downloaded HTML document.
///
/// Parsing is deferred to [`Page::extract_links`], which the crawler runs on
/// its extraction pool.
#[derive(Debug, Clone)]
pub struct HtmlPage {
    url: String,
    html: Arc<str>,
}

impl HtmlPage {
    pub fn new(url: impl Into<String>, html: impl Into<Arc<str>>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

impl Page for HtmlPage {
    /// Absolute http(s) targets of every `<a href>`, in document order,
    /// without fragments and duplicates.
    fn extract_links(&self) -> Result<Vec<String>, CrawlError> {
        let base = Url::parse(&self.url)
            .map_err(|e| CrawlError::Extract(format!("Invalid page URL '{}': {e}", self.url)))?;
        let selector = Selector::parse("a[href]")
            .map_err(|e| CrawlError::Extract(format!("Invalid selector: {e}")))?;

        let document = Html::parse_document(&self.html);
        let mut seen = HashSet::new();
        let mut links = Vec::new();
        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if let Some(link) = resolve_link(&base, href) {
                if seen.insert(link.clone()) {
                    links.push(link);
                }
            }
        }
        Ok(links)
    }
}

/// Resolve a (possibly relative) href against the page URL.
fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_absolute_link() {
        let base = Url::parse("https://example.com/page").unwrap();
        assert_eq!(
            resolve_link(&base, "https://other.com"),
            Some("https://other.com/".to_string())
        );
    }

    #[test]
    fn test_resolve_relative_link() {
        let base = Url::parse("https://example.com/docs/page").unwrap();
        assert_eq!(
            resolve_link(&base, "intro"),
            Some("https://example.com/docs/intro".to_string())
        );
        assert_eq!(
            resolve_link(&base, "/about"),
            Some("https://example.com/about".to_string())
        );
    }

    #[test]
    fn test_skips_non_navigational_links() {
        let base = Url::parse("https://example.com/").unwrap();
        assert_eq!(resolve_link(&base, "#section"), None);
        assert_eq!(resolve_link(&base, "mailto:test@example.com"), None);
        assert_eq!(resolve_link(&base, "javascript:void(0)"), None);
        assert_eq!(resolve_link(&base, "ftp://example.com/file"), None);
        assert_eq!(resolve_link(&base, "   "), None);
    }

    #[test]
    fn test_strips_fragment() {
        let base = Url::parse("https://example.com/").unwrap();
        assert_eq!(
            resolve_link(&base, "/guide#install"),
            Some("https://example.com/guide".to_string())
        );
    }

    #[test]
    fn test_extract_links_in_document_order() {
        let html = r##"
            <html><body>
              <a href="/b">B</a>
              <a href="https://other.test/c">C</a>
              <a href="/b#again">B again</a>
              <a href="#top">Top</a>
              <a>no href</a>
            </body></html>
        "##;
        let page = HtmlPage::new("https://site.test/a", html);
        assert_eq!(
            page.extract_links().unwrap(),
            vec![
                "https://site.test/b".to_string(),
                "https://other.test/c".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_links_dedups_large_pages() {
        let html: String = (0..2000)
            .map(|i| format!("<a href='/p{}'>x</a>", i % 500))
            .collect();
        let page = HtmlPage::new("https://site.test/", html);
        let links = page.extract_links().unwrap();
        assert_eq!(links.len(), 500);
        assert_eq!(links[0], "https://site.test/p0");
        assert_eq!(links[499], "https://site.test/p499");
    }

    #[test]
    fn test_extract_links_fails_on_invalid_page_url() {
        let page = HtmlPage::new("not a url", "<a href='/x'>x</a>");
        let err = page.extract_links().unwrap_err();
        assert!(matches!(err, CrawlError::Extract(_)));
    }
}
