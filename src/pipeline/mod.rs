// src/pipeline/mod.rs

//! Crawl and summarization pipeline stages.

mod crawl;
mod report;
mod summarize;

pub use crawl::run_crawl;
pub use report::print_report;
pub use summarize::run_summaries;
