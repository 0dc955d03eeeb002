// src/services/direct.rs

//! Direct HTTP fetch strategy.
//!
//! The fast path: a plain GET with browser-like headers, bounded retries for
//! transient upstream failures, byte-level encoding detection, and plain-text
//! extraction. Anything that is not HTML or plain text is rejected with a
//! recorded reason rather than an error.

use std::time::Duration;

use encoding_rs::Encoding;
use reqwest::{Client, Response};

use crate::config::FetchConfig;
use crate::error::{AppError, Result};
use crate::text::{ExtractedPage, extract_page};
use crate::utils::http::create_direct_client;

/// HTTP statuses considered transient and worth retrying.
const RETRY_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

/// Minimum detection confidence before trusting a detected charset over
/// plain UTF-8.
const DETECT_CONFIDENCE: f32 = 0.7;

/// Fast-path fetcher: HTTP GET plus HTML text extraction.
pub struct DirectFetcher {
    client: Client,
    max_retries: u32,
    base_delay: Duration,
}

impl DirectFetcher {
    /// Create a direct fetcher from the fetch configuration.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            client: create_direct_client(config)?,
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        })
    }

    /// Fetch a URL and extract its visible text.
    pub async fn fetch(&self, url: &str) -> Result<ExtractedPage> {
        let response = self.get_with_retry(url).await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();

        if !content_type.contains("text/html") && !content_type.contains("text/plain") {
            return Err(AppError::fetch(
                url,
                format!("non-text content (Content-Type: {content_type})"),
            ));
        }

        let bytes = response.bytes().await.map_err(|e| {
            AppError::fetch(url, format!("request failed: {e}"))
        })?;
        let body = decode_body(&bytes);

        Ok(extract_page(&body))
    }

    /// Issue a GET, retrying transient statuses with exponential backoff.
    ///
    /// This is a connection-level retry, separate from the strategy fallback
    /// the orchestrator performs.
    async fn get_with_retry(&self, url: &str) -> Result<Response> {
        let mut attempt: u32 = 0;

        loop {
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if RETRY_STATUSES.contains(&status.as_u16()) && attempt < self.max_retries {
                        attempt += 1;
                        let delay = self.base_delay * 2u32.pow(attempt - 1);
                        log::debug!(
                            "transient HTTP {} from {}, retry {}/{} in {:?}",
                            status,
                            url,
                            attempt,
                            self.max_retries,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    if !status.is_success() {
                        return Err(AppError::fetch(
                            url,
                            format!("request failed: HTTP {status}"),
                        ));
                    }

                    return Ok(response);
                }
                Err(e) => {
                    return Err(AppError::fetch(url, format!("request failed: {e}")));
                }
            }
        }
    }
}

/// Decode a response body, trusting statistical charset detection only when
/// it is confident; otherwise fall back to lossy UTF-8.
fn decode_body(bytes: &[u8]) -> String {
    let (charset, confidence, _) = chardet::detect(bytes);
    if confidence > DETECT_CONFIDENCE {
        let label = chardet::charset2encoding(&charset);
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            let (decoded, _, _) = encoding.decode(bytes);
            return decoded.into_owned();
        }
    }
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> FetchConfig {
        FetchConfig {
            retry_base_delay_ms: 1,
            ..FetchConfig::default()
        }
    }

    #[tokio::test]
    async fn fetch_extracts_visible_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "<html><script>x</script><body><h1>Hi</h1><p>World</p></body></html>",
                "text/html",
            ))
            .mount(&server)
            .await;

        let fetcher = DirectFetcher::new(&test_config()).unwrap();
        let page = fetcher.fetch(&format!("{}/a", server.uri())).await.unwrap();
        assert_eq!(page.text, "Hi\nWorld");
    }

    #[tokio::test]
    async fn fetch_rejects_non_text_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pdf"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(vec![0u8; 8], "application/pdf"),
            )
            .mount(&server)
            .await;

        let fetcher = DirectFetcher::new(&test_config()).unwrap();
        let err = fetcher
            .fetch(&format!("{}/pdf", server.uri()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("non-text content"));
    }

    #[tokio::test]
    async fn fetch_fails_on_404_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = DirectFetcher::new(&test_config()).unwrap();
        let err = fetcher
            .fetch(&format!("{}/gone", server.uri()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("request failed"));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn fetch_retries_transient_status() {
        let server = MockServer::start().await;
        // First request sees a 503, the retry succeeds.
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html><body><p>ok</p></body></html>", "text/html"),
            )
            .mount(&server)
            .await;

        let fetcher = DirectFetcher::new(&test_config()).unwrap();
        let page = fetcher
            .fetch(&format!("{}/flaky", server.uri()))
            .await
            .unwrap();
        assert_eq!(page.text, "ok");
    }

    #[tokio::test]
    async fn fetch_gives_up_after_max_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503))
            .expect(4) // initial attempt + 3 retries
            .mount(&server)
            .await;

        let fetcher = DirectFetcher::new(&test_config()).unwrap();
        let err = fetcher
            .fetch(&format!("{}/down", server.uri()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn decode_body_handles_utf8() {
        let body = decode_body("héllo wörld — plain utf-8 text".as_bytes());
        assert!(body.contains("héllo"));
    }

    #[test]
    fn decode_body_handles_gbk_bytes() {
        let (encoded, _, _) = encoding_rs::GBK.encode(
            "中文内容需要从字节层面检测编码才能正确解码成文本，\
             这里提供足够长的样本让统计检测得出高置信度的结果。",
        );
        let body = decode_body(&encoded);
        assert!(body.contains("中文内容"));
    }
}
