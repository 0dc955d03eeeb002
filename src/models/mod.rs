// src/models/mod.rs

//! Domain models for the bookmark crawler.

mod bookmark;
mod record;

pub use bookmark::{BookmarkEntry, extract_entries, filter_entries, load_bookmark_file};
pub use record::{CrawlOutcome, FailureRecord, FetchTier, PageRecord};
