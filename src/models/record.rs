//! Fetch result and failure record structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::BookmarkEntry;

/// Which strategy tier actually produced the page content.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FetchTier {
    /// Plain HTTP GET with HTML text extraction
    Direct,
    /// Headless-browser rendering
    Rendered,
}

impl std::fmt::Display for FetchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchTier::Direct => write!(f, "direct"),
            FetchTier::Rendered => write!(f, "rendered"),
        }
    }
}

/// A successfully fetched page, optionally carrying a generated summary.
///
/// Produced once per fetched URL; the summary fields are added in a second
/// pass keyed by url.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    /// Source bookmark fields, flattened into the record
    #[serde(flatten)]
    pub bookmark: BookmarkEntry,

    /// Resolved title (live page `<title>` preferred over the stored name)
    pub title: String,

    /// Extracted plain-text content
    pub content: String,

    /// Content length in characters
    pub content_length: usize,

    /// Fetch timestamp
    pub crawl_time: DateTime<Utc>,

    /// Strategy tier that produced the content
    pub crawl_method: FetchTier,

    /// Generated summary text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Model identifier that produced the summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_model: Option<String>,

    /// Summary generation timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_time: Option<DateTime<Utc>>,
}

impl PageRecord {
    /// URL key for merge operations.
    pub fn url(&self) -> &str {
        &self.bookmark.url
    }

    /// Whether this record already carries a summary.
    pub fn has_summary(&self) -> bool {
        self.summary.is_some()
    }
}

/// A URL for which no strategy yielded usable content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Bookmark URL that failed
    pub url: String,

    /// Best-known title at failure time
    pub title: String,

    /// Human-readable failure reason
    pub reason: String,

    /// Failure timestamp
    pub timestamp: DateTime<Utc>,
}

impl FailureRecord {
    /// Create a failure record stamped with the current time.
    pub fn new(url: impl Into<String>, title: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Aggregate outcome of a crawl run.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    /// Successfully fetched records
    pub records: Vec<PageRecord>,

    /// Per-URL failure records
    pub failures: Vec<FailureRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_tier_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&FetchTier::Direct).unwrap(),
            "\"direct\""
        );
        assert_eq!(
            serde_json::to_string(&FetchTier::Rendered).unwrap(),
            "\"rendered\""
        );
    }

    #[test]
    fn summary_fields_omitted_when_absent() {
        let record = PageRecord {
            bookmark: BookmarkEntry {
                date_added: "N/A".to_string(),
                date_last_used: "N/A".to_string(),
                guid: "N/A".to_string(),
                id: "1".to_string(),
                name: "Test".to_string(),
                node_type: "url".to_string(),
                url: "https://example.com".to_string(),
            },
            title: "Test".to_string(),
            content: "body".to_string(),
            content_length: 4,
            crawl_time: Utc::now(),
            crawl_method: FetchTier::Direct,
            summary: None,
            summary_model: None,
            summary_time: None,
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("summary"));
        assert!(json.contains("\"crawl_method\":\"direct\""));
    }
}
