// src/main.rs

//! markdex: crawl a browser bookmark export, extract page content, and
//! optionally summarize every page with an LLM backend.

use std::path::PathBuf;

use clap::Parser;

use markdex::config::Config;
use markdex::error::Result;
use markdex::models::{filter_entries, load_bookmark_file};
use markdex::pipeline::{print_report, run_crawl, run_summaries};
use markdex::services::{PageFetcher, Summarizer};
use markdex::storage::{JsonStore, ResultStore};

/// markdex - bookmark content crawler
#[derive(Parser, Debug)]
#[command(name = "markdex", version, about = "Bookmark content crawler and summarizer")]
struct Cli {
    /// Path to the browser bookmark export file
    #[arg(short, long)]
    bookmarks: Option<PathBuf>,

    /// Output directory for result files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Only process the first N bookmarks
    #[arg(short, long)]
    limit: Option<usize>,

    /// Number of concurrent fetch workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Skip the summarization pass
    #[arg(long)]
    no_summary: bool,

    /// Skip crawling; summarize previously saved content instead
    #[arg(long)]
    from_json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::from_env();
    if let Some(bookmarks) = cli.bookmarks {
        config.paths.bookmarks_file = bookmarks;
    }
    if let Some(output_dir) = cli.output_dir {
        config.paths.output_dir = output_dir;
    }
    if cli.limit.is_some() {
        config.fetch.limit = cli.limit;
    }
    if let Some(workers) = cli.workers {
        config.fetch.max_concurrent = workers;
    }
    if cli.no_summary {
        config.summarize = false;
    }
    config.validate()?;

    log::info!("markdex starting");
    let store = JsonStore::new(&config.paths.output_dir);

    if cli.from_json {
        return summarize_stored(&config, &store).await;
    }

    let entries = load_bookmark_file(&config.paths.bookmarks_file)?;
    let bookmarks = filter_entries(entries);
    log::info!(
        "loaded {} crawlable bookmarks from {}",
        bookmarks.len(),
        config.paths.bookmarks_file.display()
    );
    store.save_bookmarks(&bookmarks).await?;

    let fetcher = PageFetcher::new(&config.fetch)?;
    let outcome = run_crawl(
        &fetcher,
        &bookmarks,
        config.fetch.max_concurrent,
        config.fetch.limit,
    )
    .await;

    let mut records = store.merge_and_save(&outcome.records).await?;
    store.save_failures(&outcome.failures).await?;

    if config.summarize {
        let summarizer = Summarizer::new(config.summary.clone())?;
        if summarizer.test_connection().await {
            records = run_summaries(&summarizer, &store, outcome.records).await;
        } else {
            log::warn!("summarization backend unreachable, skipping summaries");
        }
    }

    print_report(&records, &outcome.failures);
    log::info!(
        "results written to {}",
        store.content_path().display()
    );
    Ok(())
}

/// Summarize records already on disk without re-crawling.
async fn summarize_stored(config: &Config, store: &JsonStore) -> Result<()> {
    let mut records = store.load_records().await;
    if records.is_empty() {
        log::warn!(
            "no stored content found in {}",
            store.content_path().display()
        );
        return Ok(());
    }
    if let Some(limit) = config.fetch.limit {
        records.truncate(limit);
    }

    let summarizer = Summarizer::new(config.summary.clone())?;
    if !summarizer.test_connection().await {
        log::error!("summarization backend unreachable");
        return Ok(());
    }

    let merged = run_summaries(&summarizer, store, records).await;
    print_report(&merged, &[]);
    Ok(())
}
