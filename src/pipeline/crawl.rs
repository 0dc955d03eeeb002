// src/pipeline/crawl.rs

//! Parallel crawl coordinator.
//!
//! Fans the bookmark list out over a bounded pool of concurrent fetches and
//! collects every outcome. One slow or broken page never stops the run.

use std::time::Instant;

use futures::{StreamExt, stream};

use crate::models::{BookmarkEntry, CrawlOutcome};
use crate::services::{FetchOutcome, PageFetcher};

/// Crawl the bookmark list with bounded concurrency.
///
/// `limit` truncates the list to its first N entries before any fetch
/// starts. Outcomes arrive in completion order.
pub async fn run_crawl(
    fetcher: &PageFetcher,
    bookmarks: &[BookmarkEntry],
    concurrency: usize,
    limit: Option<usize>,
) -> CrawlOutcome {
    let selected = match limit {
        Some(n) if n < bookmarks.len() => &bookmarks[..n],
        _ => bookmarks,
    };
    let total = selected.len();
    let concurrency = concurrency.max(1);

    log::info!(
        "crawling {total} of {} bookmarks with {concurrency} workers",
        bookmarks.len()
    );
    let start = Instant::now();

    let mut outcome = CrawlOutcome::default();
    let mut results = stream::iter(selected.iter().enumerate())
        .map(|(i, bookmark)| fetcher.fetch_one(bookmark, i + 1, total))
        .buffer_unordered(concurrency);

    while let Some(result) = results.next().await {
        match result {
            FetchOutcome::Fetched(record) => outcome.records.push(record),
            FetchOutcome::Failed(failure) => outcome.failures.push(failure),
        }
    }

    let elapsed = start.elapsed();
    let avg_ms = if total > 0 {
        elapsed.as_millis() / total as u128
    } else {
        0
    };
    log::info!(
        "crawl finished in {:.1}s ({} ok, {} failed, {avg_ms}ms/page avg)",
        elapsed.as_secs_f64(),
        outcome.records.len(),
        outcome.failures.len()
    );

    outcome
}
