// src/services/rendered.rs

//! Headless-browser fetch strategy.
//!
//! Launches a fresh headless Chromium per page through the DevTools
//! protocol, waits a fixed settle period for client-side rendering, and
//! pulls the resulting DOM. For sites known to greet visitors with a login
//! modal, the overlay is dismissed before extraction and the article
//! containers are read directly instead of the whole page.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page;
use futures::StreamExt;
use scraper::{Html, Selector};

use crate::config::FetchConfig;
use crate::error::{AppError, Result};
use crate::text::{ExtractedPage, collapse_whitespace, extract_page};
use crate::utils::matches_domain;

/// Domains that show a login overlay and need article-level extraction.
const OVERLAY_DOMAINS: &[&str] = &["zhihu.com"];

/// Candidate close buttons for the login overlay, tried in order.
const OVERLAY_CLOSE_SELECTORS: &[&str] = &[
    ".Modal-closeButton",
    ".Button.Modal-closeButton",
    "button.Button.Modal-closeButton",
    ".close",
];

/// Article containers to prefer over the full page body, tried in order.
const ARTICLE_SELECTORS: &[&str] = &[".Post-RichText", ".RichText", ".AuthorInfo", "article"];

/// Pause after dismissing an overlay so the page can reflow.
const OVERLAY_SETTLE: Duration = Duration::from_secs(1);

/// Rendered pages with fewer visible characters than this never really
/// loaded; treat them as empty so the orchestrator records a failure.
const MIN_CONTENT_CHARS: usize = 5;

/// Slow-path fetcher: full browser rendering for script-dependent pages.
pub struct RenderedFetcher {
    user_agent: String,
    settle: Duration,
}

impl RenderedFetcher {
    /// Create a rendered fetcher from the fetch configuration.
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            settle: Duration::from_secs(config.settle_secs),
        }
    }

    /// Render a URL in a headless browser and extract its visible text.
    ///
    /// The browser is always closed and its event handler stopped, whether
    /// rendering succeeds or fails.
    pub async fn fetch(&self, url: &str) -> Result<ExtractedPage> {
        let browser_config = BrowserConfig::builder()
            .viewport(Some(Viewport {
                width: 1920,
                height: 1080,
                ..Default::default()
            }))
            .args(vec![
                "--disable-gpu".to_string(),
                "--no-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
                "--blink-settings=imagesEnabled=false".to_string(),
                format!("--user-agent={}", self.user_agent),
            ])
            .build()
            .map_err(AppError::browser)?;

        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(AppError::browser)?;
        let handler_task = tokio::spawn(async move {
            while handler.next().await.is_some() {}
        });

        let result = self.render(&browser, url).await;

        if let Err(e) = browser.close().await {
            log::debug!("browser close failed: {e}");
        }
        let _ = browser.wait().await;
        handler_task.abort();

        result
    }

    async fn render(&self, browser: &Browser, url: &str) -> Result<ExtractedPage> {
        let page = browser.new_page(url).await.map_err(AppError::browser)?;

        // Fixed settle time; zhihu and friends keep loading well after the
        // navigation event fires.
        tokio::time::sleep(self.settle).await;

        let overlay_site = is_overlay_site(url);
        if overlay_site {
            self.dismiss_overlay(&page).await;
        }

        let html = page.content().await.map_err(AppError::browser)?;

        let extracted = if overlay_site {
            extract_article(&html)
        } else {
            extract_page(&html)
        };
        Ok(discard_trivial(extracted))
    }

    /// Try each known close button until one click lands.
    async fn dismiss_overlay(&self, page: &Page) {
        for selector in OVERLAY_CLOSE_SELECTORS {
            if let Ok(element) = page.find_element(*selector).await {
                if element.click().await.is_ok() {
                    log::debug!("dismissed overlay via {selector}");
                    tokio::time::sleep(OVERLAY_SETTLE).await;
                    return;
                }
            }
        }
        log::debug!("no overlay close button found");
    }
}

/// Drop text below the minimum content length.
fn discard_trivial(mut page: ExtractedPage) -> ExtractedPage {
    if page.text.trim().chars().count() < MIN_CONTENT_CHARS {
        page.text.clear();
    }
    page
}

fn is_overlay_site(url: &str) -> bool {
    OVERLAY_DOMAINS
        .iter()
        .any(|domain| matches_domain(url, domain))
}

/// Extract text from the first matching article container, falling back to
/// whole-page extraction when none yields text.
fn extract_article(html: &str) -> ExtractedPage {
    let full = extract_page(html);
    let document = Html::parse_document(html);

    for selector_str in ARTICLE_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let raw = element.text().collect::<Vec<_>>().join("\n");
            let text = collapse_whitespace(&raw);
            if !text.is_empty() {
                return ExtractedPage {
                    title: full.title,
                    text,
                };
            }
        }
    }

    full
}
