// src/pipeline/summarize.rs

//! Sequential summarization pass.
//!
//! Runs after crawling, one record at a time, with a fixed pause between
//! backend calls. Records that already carry a summary in the store are
//! skipped, so interrupted runs resume where they left off.

use std::time::Duration;

use chrono::Utc;

use crate::models::PageRecord;
use crate::services::Summarizer;
use crate::storage::ResultStore;

/// Pause between consecutive backend calls.
const PACING_DELAY: Duration = Duration::from_millis(500);

/// Sentinel prefix for records whose summarization failed.
const FAILED_PREFIX: &str = "summary failed";

/// Generate summaries for every record that does not have one yet.
///
/// Each successful summary is merged into the store immediately; a
/// persistence error is logged and the pass continues in memory. Failed
/// generations get an inline failure marker and are not persisted, so the
/// next run retries them. Returns the final stored record set.
pub async fn run_summaries(
    summarizer: &Summarizer,
    store: &dyn ResultStore,
    records: Vec<PageRecord>,
) -> Vec<PageRecord> {
    let existing = store.load_records().await;
    let total = records.len();
    let mut succeeded = 0usize;

    for (i, mut record) in records.into_iter().enumerate() {
        let index = i + 1;
        let url = record.url().to_string();

        if existing
            .iter()
            .any(|e| e.url() == url && e.has_summary())
        {
            log::info!("[{index}/{total}] summary exists, skipping {url}");
            succeeded += 1;
            continue;
        }

        log::info!("[{index}/{total}] summarizing {url}");
        match summarizer
            .generate(&record.title, &record.content, &url)
            .await
        {
            Ok(summary) => {
                record.summary = Some(summary);
                record.summary_model = Some(summarizer.model_name().to_string());
                record.summary_time = Some(Utc::now());
                succeeded += 1;

                if let Err(e) = store.merge_and_save(std::slice::from_ref(&record)).await {
                    log::error!("[{index}/{total}] could not persist summary for {url}: {e}");
                }
            }
            Err(e) => {
                log::warn!("[{index}/{total}] summarization failed for {url}: {e}");
                record.summary = Some(format!("{FAILED_PREFIX}: {e}"));
                record.summary_model = Some(summarizer.model_name().to_string());
                record.summary_time = Some(Utc::now());
            }
        }

        tokio::time::sleep(PACING_DELAY).await;
    }

    log::info!("summarization done: {succeeded}/{total} summarized");
    store.load_records().await
}
