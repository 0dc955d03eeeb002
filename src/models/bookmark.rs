//! Bookmark export parsing and filtering.
//!
//! Chrome exports bookmarks as a JSON tree: a `roots` map whose nodes carry
//! either `children` (folders) or a `url` leaf. Entries are flattened
//! recursively and filtered before crawling.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// URLs pointing into the excluded private network range.
static PRIVATE_NET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://10\.0\.").expect("valid regex"));

/// Pseudo-bookmark name used by Chrome for the extensions folder entry.
const EXTENSIONS_NAME: &str = "扩展程序";

/// A single bookmark extracted from the export tree.
///
/// Immutable once created; uniquely identified by `url`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookmarkEntry {
    /// Creation timestamp as recorded by the browser
    #[serde(default = "not_available")]
    pub date_added: String,

    /// Last-used timestamp as recorded by the browser
    #[serde(default = "not_available")]
    pub date_last_used: String,

    /// Browser-assigned GUID
    #[serde(default = "not_available")]
    pub guid: String,

    /// Browser-assigned numeric id
    #[serde(default = "not_available")]
    pub id: String,

    /// Display name stored with the bookmark
    #[serde(default = "not_available")]
    pub name: String,

    /// Node type ("url" for leaf bookmarks)
    #[serde(rename = "type", default = "url_type")]
    pub node_type: String,

    /// Bookmark URL
    #[serde(default)]
    pub url: String,
}

fn not_available() -> String {
    "N/A".to_string()
}

fn url_type() -> String {
    "url".to_string()
}

/// Load and flatten a bookmark export file.
///
/// This is the only fatal read in the program: without bookmarks there is
/// nothing to process.
pub fn load_bookmark_file(path: &Path) -> Result<Vec<BookmarkEntry>> {
    let content = std::fs::read_to_string(path)?;
    let tree: Value = serde_json::from_str(&content)?;

    let mut entries = Vec::new();
    if let Some(roots) = tree.get("roots").and_then(Value::as_object) {
        for node in roots.values() {
            extract_entries(node, &mut entries);
        }
    }
    Ok(entries)
}

/// Recursively flatten a bookmark tree node into `out`.
pub fn extract_entries(node: &Value, out: &mut Vec<BookmarkEntry>) {
    if let Some(children) = node.get("children").and_then(Value::as_array) {
        for child in children {
            extract_entries(child, out);
        }
    } else if node.get("url").is_some() {
        let entry = BookmarkEntry {
            date_added: string_field(node, "date_added"),
            date_last_used: string_field(node, "date_last_used"),
            guid: string_field(node, "guid"),
            id: string_field(node, "id"),
            name: string_field(node, "name"),
            node_type: node
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("url")
                .to_string(),
            url: node
                .get("url")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        };
        out.push(entry);
    }
}

fn string_field(node: &Value, key: &str) -> String {
    node.get(key)
        .and_then(Value::as_str)
        .unwrap_or("N/A")
        .to_string()
}

/// Filter extracted entries down to crawlable bookmarks.
///
/// Drops entries with an empty url, non-`url` node types, the browser's
/// extensions pseudo-bookmark, and private-network addresses.
pub fn filter_entries(entries: Vec<BookmarkEntry>) -> Vec<BookmarkEntry> {
    entries
        .into_iter()
        .filter(|entry| {
            !entry.url.is_empty()
                && entry.node_type == "url"
                && entry.name != EXTENSIONS_NAME
                && !PRIVATE_NET_RE.is_match(&entry.url)
        })
        .collect()
}
