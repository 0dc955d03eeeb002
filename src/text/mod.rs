// src/text/mod.rs

//! Text processing utilities: encoding repair and HTML content extraction.

pub mod encoding;
pub mod extract;

pub use encoding::repair_encoding;
pub use extract::{ExtractedPage, UNTITLED, collapse_whitespace, extract_page};
