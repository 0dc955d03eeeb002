// src/services/mod.rs

//! Fetch strategies, the per-page orchestrator, and the LLM summarizer.

mod direct;
mod page;
mod rendered;
mod summarizer;

pub use direct::DirectFetcher;
pub use page::{FetchOutcome, PageFetcher};
pub use rendered::RenderedFetcher;
pub use summarizer::Summarizer;
