// src/storage/json.rs

//! JSON file store with atomic replacement.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::config::PathsConfig;
use crate::error::Result;
use crate::models::{BookmarkEntry, FailureRecord, PageRecord};
use crate::storage::ResultStore;

/// Stores results as pretty-printed JSON files in one output directory.
///
/// Every write goes to a temporary sibling first and is renamed into place,
/// so readers never observe a half-written file.
pub struct JsonStore {
    output_dir: PathBuf,
}

impl JsonStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Path of the merged content file.
    pub fn content_path(&self) -> PathBuf {
        self.output_dir.join(PathsConfig::CONTENT_FILE)
    }

    async fn write_json<T: Serialize>(&self, file_name: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(&self.output_dir.join(file_name), &bytes)
            .await
    }

    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.output_dir).await?;

        let tmp_path = path.with_extension("tmp");
        let mut file = File::create(&tmp_path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        fs::rename(&tmp_path, path).await?;
        Ok(())
    }

    /// Read and parse a JSON file; absent or broken files yield `None`.
    async fn read_json<T: DeserializeOwned>(&self, file_name: &str) -> Option<T> {
        let path = self.output_dir.join(file_name);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("could not read {}: {e}", path.display());
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("could not parse {}: {e}", path.display());
                None
            }
        }
    }
}

#[async_trait]
impl ResultStore for JsonStore {
    async fn load_records(&self) -> Vec<PageRecord> {
        self.read_json(PathsConfig::CONTENT_FILE)
            .await
            .unwrap_or_default()
    }

    async fn merge_and_save(&self, new_records: &[PageRecord]) -> Result<Vec<PageRecord>> {
        let mut merged = self.load_records().await;
        let mut by_url: HashMap<String, usize> = merged
            .iter()
            .enumerate()
            .map(|(i, record)| (record.url().to_string(), i))
            .collect();

        for record in new_records {
            match by_url.get(record.url()) {
                Some(&i) => {
                    // A completed summary survives re-fetches that do not
                    // carry one.
                    if merged[i].has_summary() && !record.has_summary() {
                        continue;
                    }
                    merged[i] = record.clone();
                }
                None => {
                    by_url.insert(record.url().to_string(), merged.len());
                    merged.push(record.clone());
                }
            }
            // Snapshot after every merged record; a crash loses at most the
            // page in flight.
            self.write_json(PathsConfig::CONTENT_FILE, &merged).await?;
        }

        if new_records.is_empty() {
            self.write_json(PathsConfig::CONTENT_FILE, &merged).await?;
        }

        Ok(merged)
    }

    async fn save_bookmarks(&self, bookmarks: &[BookmarkEntry]) -> Result<()> {
        self.write_json(PathsConfig::FILTERED_FILE, &bookmarks).await
    }

    async fn save_failures(&self, failures: &[FailureRecord]) -> Result<()> {
        self.write_json(PathsConfig::FAILURES_FILE, &failures).await
    }
}
