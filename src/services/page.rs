// src/services/page.rs

//! Per-page fetch orchestrator.
//!
//! Decides which strategy handles a bookmark, applies the rendering
//! fallback, repairs text encoding, and turns the result into either a
//! content record or a failure record. Per-page problems never escape as
//! errors; every bookmark yields exactly one outcome.

use chrono::Utc;

use crate::config::FetchConfig;
use crate::error::{AppError, Result};
use crate::models::{BookmarkEntry, FailureRecord, FetchTier, PageRecord};
use crate::services::{DirectFetcher, RenderedFetcher};
use crate::text::{ExtractedPage, UNTITLED, repair_encoding};
use crate::utils::matches_domain;

/// The result of fetching one bookmark.
pub enum FetchOutcome {
    Fetched(PageRecord),
    Failed(FailureRecord),
}

/// Routes bookmarks between the direct and rendered fetch tiers.
pub struct PageFetcher {
    direct: DirectFetcher,
    rendered: RenderedFetcher,
    render_domains: Vec<String>,
}

impl PageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            direct: DirectFetcher::new(config)?,
            rendered: RenderedFetcher::new(config),
            render_domains: config.render_domains.clone(),
        })
    }

    /// Domains on the render list never go through the direct tier; their
    /// content only exists after script execution.
    fn needs_rendering(&self, url: &str) -> bool {
        self.render_domains
            .iter()
            .any(|domain| matches_domain(url, domain))
    }

    /// Fetch one bookmark, producing either a page record or a failure
    /// record. `index` and `total` only feed progress logging.
    pub async fn fetch_one(
        &self,
        bookmark: &BookmarkEntry,
        index: usize,
        total: usize,
    ) -> FetchOutcome {
        let url = &bookmark.url;
        log::info!("[{index}/{total}] fetching {} - {url}", bookmark.name);

        let (page, tier) = if self.needs_rendering(url) {
            match self.rendered.fetch(url).await {
                Ok(page) if !page.is_empty() => (page, FetchTier::Rendered),
                Ok(_) => {
                    return self.fail(bookmark, "rendered content empty");
                }
                Err(e) => {
                    log::warn!("[{index}/{total}] rendering failed for {url}: {e}");
                    return self.fail(bookmark, &format!("rendering failed: {e}"));
                }
            }
        } else {
            match self.direct.fetch(url).await {
                // A direct failure is final; rendering the same URL would
                // most likely hit the same wall, so no fallback here.
                Err(e) => {
                    return self.fail(bookmark, &failure_reason(&e));
                }
                // Direct succeeded but the page had no visible text; this
                // is the script-rendered-page signature, so fall back.
                Ok(page) if page.is_empty() => {
                    log::info!("[{index}/{total}] direct fetch empty, rendering {url}");
                    match self.rendered.fetch(url).await {
                        Ok(rendered) if !rendered.is_empty() => {
                            let title = rendered.title.or(page.title);
                            (
                                ExtractedPage {
                                    title,
                                    text: rendered.text,
                                },
                                FetchTier::Rendered,
                            )
                        }
                        Ok(_) => {
                            return self.fail(bookmark, "extracted content empty");
                        }
                        Err(e) => {
                            log::warn!("[{index}/{total}] fallback rendering failed for {url}: {e}");
                            return self.fail(bookmark, "extracted content empty");
                        }
                    }
                }
                Ok(page) => (page, FetchTier::Direct),
            }
        };

        let title = repair_encoding(&resolve_title(page.title, &bookmark.name));
        let content = repair_encoding(&page.text);

        if content.trim().is_empty() {
            return self.fail(bookmark, "extracted content empty");
        }

        let content_length = content.chars().count();
        log::info!("[{index}/{total}] done {url} ({content_length} chars, {tier})");

        FetchOutcome::Fetched(PageRecord {
            bookmark: bookmark.clone(),
            title,
            content,
            content_length,
            crawl_time: Utc::now(),
            crawl_method: tier,
            summary: None,
            summary_model: None,
            summary_time: None,
        })
    }

    fn fail(&self, bookmark: &BookmarkEntry, reason: &str) -> FetchOutcome {
        FetchOutcome::Failed(FailureRecord::new(&bookmark.url, &bookmark.name, reason))
    }
}

/// Live page title wins over the stored bookmark name; `untitled` is the
/// sentinel when both are absent.
fn resolve_title(page_title: Option<String>, stored_name: &str) -> String {
    if let Some(title) = page_title {
        return title;
    }
    if !stored_name.is_empty() && stored_name != "N/A" {
        return stored_name.to_string();
    }
    UNTITLED.to_string()
}

/// Per-page failure reasons keep the message only; the URL is already on
/// the failure record.
fn failure_reason(error: &AppError) -> String {
    match error {
        AppError::Fetch { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn bookmark(url: &str, name: &str) -> BookmarkEntry {
        BookmarkEntry {
            date_added: "N/A".to_string(),
            date_last_used: "N/A".to_string(),
            guid: "N/A".to_string(),
            id: "1".to_string(),
            name: name.to_string(),
            node_type: "url".to_string(),
            url: url.to_string(),
        }
    }

    fn fetcher() -> PageFetcher {
        let config = FetchConfig {
            retry_base_delay_ms: 1,
            ..FetchConfig::default()
        };
        PageFetcher::new(&config).unwrap()
    }

    #[test]
    fn render_domains_are_routed() {
        let fetcher = fetcher();
        assert!(fetcher.needs_rendering("https://www.zhihu.com/question/1"));
        assert!(fetcher.needs_rendering("https://zhuanlan.zhihu.com/p/42"));
        assert!(!fetcher.needs_rendering("https://example.com/"));
    }

    #[test]
    fn title_resolution_order() {
        assert_eq!(
            resolve_title(Some("Page".into()), "Stored"),
            "Page".to_string()
        );
        assert_eq!(resolve_title(None, "Stored"), "Stored".to_string());
        assert_eq!(resolve_title(None, ""), UNTITLED.to_string());
        assert_eq!(resolve_title(None, "N/A"), UNTITLED.to_string());
    }

    #[tokio::test]
    async fn direct_success_produces_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "<html><head><title>T</title></head>\
                 <body><h1>Hi</h1><p>World</p></body></html>",
                "text/html",
            ))
            .mount(&server)
            .await;

        let entry = bookmark(&format!("{}/page", server.uri()), "Stored");
        match fetcher().fetch_one(&entry, 1, 1).await {
            FetchOutcome::Fetched(record) => {
                assert_eq!(record.title, "T");
                // Title text is visible text too and stays in the body.
                assert_eq!(record.content, "T\nHi\nWorld");
                assert_eq!(record.content_length, 10);
                assert_eq!(record.crawl_method, FetchTier::Direct);
                assert!(record.summary.is_none());
            }
            FetchOutcome::Failed(f) => panic!("unexpected failure: {}", f.reason),
        }
    }

    #[tokio::test]
    async fn direct_http_error_fails_without_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let entry = bookmark(&format!("{}/gone", server.uri()), "Gone");
        match fetcher().fetch_one(&entry, 1, 1).await {
            FetchOutcome::Failed(failure) => {
                assert!(failure.reason.contains("request failed"));
                assert!(failure.reason.contains("404"));
                assert_eq!(failure.title, "Gone");
            }
            FetchOutcome::Fetched(_) => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn non_text_content_is_recorded_as_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/blob"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(vec![1u8, 2, 3], "application/zip"),
            )
            .mount(&server)
            .await;

        let entry = bookmark(&format!("{}/blob", server.uri()), "Blob");
        match fetcher().fetch_one(&entry, 1, 1).await {
            FetchOutcome::Failed(failure) => {
                assert!(failure.reason.contains("non-text content"));
            }
            FetchOutcome::Fetched(_) => panic!("expected failure"),
        }
    }
}
