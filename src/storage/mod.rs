// src/storage/mod.rs

//! Result persistence.
//!
//! A single trait fronts the output store so the pipeline does not care
//! where results land; the JSON file store is the only implementation.

mod json;

use async_trait::async_trait;

pub use json::JsonStore;

use crate::error::Result;
use crate::models::{BookmarkEntry, FailureRecord, PageRecord};

/// Persistent store for crawl results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Load previously saved page records.
    ///
    /// A missing or unparseable file is an empty starting set, never an
    /// error; crawling must proceed on a fresh output directory.
    async fn load_records(&self) -> Vec<PageRecord>;

    /// Merge new records into the saved set, keyed by URL, and persist.
    ///
    /// An existing record that already carries a summary is not replaced by
    /// an incoming record without one. Returns the merged set.
    async fn merge_and_save(&self, new_records: &[PageRecord]) -> Result<Vec<PageRecord>>;

    /// Persist the filtered bookmark list.
    async fn save_bookmarks(&self, bookmarks: &[BookmarkEntry]) -> Result<()>;

    /// Persist the failure records.
    async fn save_failures(&self, failures: &[FailureRecord]) -> Result<()>;
}
