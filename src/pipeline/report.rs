// src/pipeline/report.rs

//! End-of-run summary report.

use crate::models::{FailureRecord, FetchTier, PageRecord};

/// Content length statistics over a record set.
#[derive(Debug, PartialEq)]
pub(crate) struct ContentStats {
    pub total: usize,
    pub min: usize,
    pub max: usize,
    pub avg: usize,
}

pub(crate) fn content_stats(records: &[PageRecord]) -> Option<ContentStats> {
    if records.is_empty() {
        return None;
    }
    let lengths: Vec<usize> = records.iter().map(|r| r.content_length).collect();
    let total: usize = lengths.iter().sum();
    Some(ContentStats {
        total,
        min: *lengths.iter().min().unwrap_or(&0),
        max: *lengths.iter().max().unwrap_or(&0),
        avg: total / lengths.len(),
    })
}

pub(crate) fn tier_split(records: &[PageRecord]) -> (usize, usize) {
    let direct = records
        .iter()
        .filter(|r| r.crawl_method == FetchTier::Direct)
        .count();
    (direct, records.len() - direct)
}

/// Log a human-readable report of the finished run.
pub fn print_report(records: &[PageRecord], failures: &[FailureRecord]) {
    log::info!(
        "results: {} pages fetched, {} failed",
        records.len(),
        failures.len()
    );

    if let Some(stats) = content_stats(records) {
        let (direct, rendered) = tier_split(records);
        log::info!(
            "content: {} chars total, {}..{} per page ({} avg)",
            stats.total,
            stats.min,
            stats.max,
            stats.avg
        );
        log::info!("strategies: {direct} direct, {rendered} rendered");
    }

    let summarized = records.iter().filter(|r| r.has_summary()).count();
    if summarized > 0 {
        log::info!("summaries: {summarized} of {} pages", records.len());
    }

    for failure in failures {
        log::warn!("failed: {} ({})", failure.url, failure.reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookmarkEntry;
    use chrono::Utc;

    fn record(length: usize, tier: FetchTier) -> PageRecord {
        PageRecord {
            bookmark: BookmarkEntry {
                date_added: "N/A".to_string(),
                date_last_used: "N/A".to_string(),
                guid: "N/A".to_string(),
                id: "1".to_string(),
                name: "Test".to_string(),
                node_type: "url".to_string(),
                url: format!("https://example.com/{length}"),
            },
            title: "Test".to_string(),
            content: "x".repeat(length),
            content_length: length,
            crawl_time: Utc::now(),
            crawl_method: tier,
            summary: None,
            summary_model: None,
            summary_time: None,
        }
    }

    #[test]
    fn stats_over_empty_set_are_absent() {
        assert!(content_stats(&[]).is_none());
    }

    #[test]
    fn stats_cover_min_max_avg() {
        let records = vec![
            record(10, FetchTier::Direct),
            record(20, FetchTier::Rendered),
            record(60, FetchTier::Direct),
        ];
        let stats = content_stats(&records).unwrap();
        assert_eq!(stats.total, 90);
        assert_eq!(stats.min, 10);
        assert_eq!(stats.max, 60);
        assert_eq!(stats.avg, 30);
    }

    #[test]
    fn tier_split_counts_both_strategies() {
        let records = vec![
            record(10, FetchTier::Direct),
            record(20, FetchTier::Rendered),
            record(30, FetchTier::Direct),
        ];
        assert_eq!(tier_split(&records), (2, 1));
    }
}
