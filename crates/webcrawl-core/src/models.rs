use std::collections::{BTreeMap, HashMap};

use crate::error::CrawlError;

/// Outcome of one [`download`](crate::crawler::WebCrawler::download) call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlResult {
    /// Addresses fetched by this call, level by level in frontier order.
    pub downloaded: Vec<String>,
    /// Every failure recorded on the engine so far.
    pub errors: HashMap<String, CrawlError>,
}

impl CrawlResult {
    /// Failure reasons as display strings, sorted by address.
    pub fn error_reasons(&self) -> BTreeMap<String, String> {
        self.errors
            .iter()
            .map(|(address, error)| (address.clone(), error.to_string()))
            .collect()
    }

    /// Returns true if an address was both downloaded and recorded as failed.
    pub fn has_overlap(&self) -> bool {
        self.downloaded
            .iter()
            .any(|address| self.errors.contains_key(address))
    }
}

/// Serializable summary of a crawl, for reports.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CrawlReport {
    pub start: String,
    pub depth: usize,
    pub downloaded: Vec<String>,
    pub errors: BTreeMap<String, String>,
}

impl CrawlReport {
    pub fn new(start: &str, depth: usize, result: &CrawlResult) -> Self {
        Self {
            start: start.to_string(),
            depth,
            downloaded: result.downloaded.clone(),
            errors: result.error_reasons(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_reasons_are_sorted_strings() {
        let result = CrawlResult {
            downloaded: vec!["a".into()],
            errors: HashMap::from([
                ("c".to_string(), CrawlError::Fetch("HTTP 500".into())),
                ("b".to_string(), CrawlError::Timeout(5)),
            ]),
        };
        let reasons: Vec<_> = result.error_reasons().into_iter().collect();
        assert_eq!(
            reasons,
            vec![
                ("b".to_string(), "Request timed out after 5 seconds".to_string()),
                ("c".to_string(), "Fetch error: HTTP 500".to_string()),
            ]
        );
        assert!(!result.has_overlap());
    }

    #[test]
    fn report_serializes_to_json() {
        let result = CrawlResult {
            downloaded: vec!["a".into()],
            errors: HashMap::from([("b".to_string(), CrawlError::Fetch("gone".into()))]),
        };
        let json = serde_json::to_value(CrawlReport::new("a", 2, &result)).unwrap();
        assert_eq!(json["start"], "a");
        assert_eq!(json["depth"], 2);
        assert_eq!(json["downloaded"][0], "a");
        assert_eq!(json["errors"]["b"], "Fetch error: gone");
    }
}
