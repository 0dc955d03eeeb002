// src/services/summarizer.rs

//! LLM summarization backends.
//!
//! One `Summarizer` fronts three API shapes: OpenAI-compatible chat
//! completions (also used for Qwen-style gateways), DeepSeek's variant of
//! the same, and Ollama's local `/api/chat`. The backend string is matched
//! per call, so a bad `MODEL_TYPE` surfaces as a per-page error rather than
//! aborting the run.

use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::error::{AppError, Result};
use crate::utils::http::create_summary_client;

/// Summary generation can take minutes on local models.
const SUMMARY_TIMEOUT_SECS: u64 = 120;

/// Short probe prompt used by the connectivity check.
const PROBE_PROMPT: &str = "Who are you? Answer in one short sentence.";

/// Generates page summaries through a configured LLM backend.
pub struct Summarizer {
    client: reqwest::Client,
    config: ModelConfig,
}

impl Summarizer {
    pub fn new(config: ModelConfig) -> Result<Self> {
        Ok(Self {
            client: create_summary_client(SUMMARY_TIMEOUT_SECS)?,
            config,
        })
    }

    /// Model identifier recorded alongside generated summaries.
    pub fn model_name(&self) -> &str {
        &self.config.model_name
    }

    /// Generate a summary for one page.
    ///
    /// Content beyond the configured input limit is truncated before the
    /// prompt is built.
    pub async fn generate(&self, title: &str, content: &str, url: &str) -> Result<String> {
        let content = truncate_chars(content, self.config.max_input_chars);
        let prompt = build_prompt(title, &content, url);
        self.complete(&prompt).await
    }

    /// Fire a tiny request at the configured backend to verify it responds.
    pub async fn test_connection(&self) -> bool {
        match self.complete(PROBE_PROMPT).await {
            Ok(reply) if !reply.trim().is_empty() => {
                log::info!(
                    "model connection ok: {} ({})",
                    self.config.model_name,
                    self.config.backend
                );
                true
            }
            Ok(_) => {
                log::error!("model connection check returned an empty reply");
                false
            }
            Err(e) => {
                log::error!("model connection check failed: {e}");
                false
            }
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        match self.config.backend.as_str() {
            "openai" | "qwen" => self.call_openai(prompt).await,
            "deepseek" => self.call_deepseek(prompt).await,
            "ollama" => self.call_ollama(prompt).await,
            other => Err(AppError::summary(format!("unsupported backend: {other}"))),
        }
    }

    fn messages(&self, prompt: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.config.system_prompt {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });
        messages
    }

    async fn call_openai(&self, prompt: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.config.model_name.clone(),
            messages: self.messages(prompt),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            top_p: self.config.top_p,
            stream: false,
        };

        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );
        let response = self.send_chat(&url, &request).await?;
        extract_chat_content(response)
    }

    async fn call_deepseek(&self, prompt: &str) -> Result<String> {
        let request = DeepSeekRequest {
            model: self.config.model_name.clone(),
            messages: self.messages(prompt),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            top_p: self.config.top_p,
            top_k: self.config.top_k,
            frequency_penalty: self.config.frequency_penalty,
            n: 1,
            response_format: ResponseFormat {
                format_type: "text".to_string(),
            },
            stream: false,
        };

        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );
        let response = self.send_chat(&url, &request).await?;
        extract_chat_content(response)
    }

    async fn call_ollama(&self, prompt: &str) -> Result<String> {
        let request = OllamaChatRequest {
            model: self.config.model_name.clone(),
            messages: self.messages(prompt),
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                top_k: self.config.top_k,
                num_predict: self.config.max_tokens,
            },
        };

        let url = format!("{}/api/chat", self.config.api_base.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::summary(format!("request failed: {e}")))?;

        let response = check_status(response).await?;
        let body: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::summary(format!("malformed response: {e}")))?;

        body.message
            .map(|m| m.content)
            .or(body.response)
            .map(|s| s.trim().to_string())
            .ok_or_else(|| AppError::summary("malformed response: no message content"))
    }

    async fn send_chat<T: Serialize>(
        &self,
        url: &str,
        request: &T,
    ) -> Result<ChatCompletionResponse> {
        let mut builder = self.client.post(url).json(request);
        if !self.config.api_key.is_empty() {
            builder = builder.bearer_auth(&self.config.api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AppError::summary(format!("request failed: {e}")))?;

        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| AppError::summary(format!("malformed response: {e}")))
    }
}

/// Turn a non-success response into a summary error carrying the status
/// and a body snippet.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let snippet: String = body.chars().take(200).collect();
    Err(AppError::summary(format!("API error ({status}): {snippet}")))
}

fn extract_chat_content(response: ChatCompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.map(|m| m.content).or(choice.text))
        .map(|s| s.trim().to_string())
        .ok_or_else(|| AppError::summary("malformed response: no choices"))
}

/// Build the summarization prompt for one page.
fn build_prompt(title: &str, content: &str, url: &str) -> String {
    format!(
        "Summarize the following web page in 3 to 5 sentences.\n\
         Requirements:\n\
         1. State the main topic first.\n\
         2. Keep key facts, names, and numbers.\n\
         3. Write in the same language as the page content.\n\
         4. Do not add opinions or information not present in the page.\n\
         5. Output plain text only, no headings or lists.\n\n\
         Title: {title}\n\
         URL: {url}\n\
         Content:\n{content}"
    )
}

/// Truncate to at most `max` characters, marking the cut with an ellipsis.
fn truncate_chars(content: &str, max: usize) -> String {
    if content.chars().count() <= max {
        return content.to_string();
    }
    let truncated: String = content.chars().take(max).collect();
    format!("{truncated}...")
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct DeepSeekRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    top_k: u32,
    frequency_penalty: f32,
    n: u32,
    response_format: ResponseFormat,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatMessage>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    message: Option<ChatMessage>,
    #[serde(default)]
    response: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(backend: &str, api_base: &str) -> ModelConfig {
        ModelConfig {
            backend: backend.to_string(),
            api_base: api_base.to_string(),
            api_key: "test-key".to_string(),
            model_name: "test-model".to_string(),
            ..ModelConfig::default()
        }
    }

    #[test]
    fn prompt_carries_title_url_and_content() {
        let prompt = build_prompt("My Title", "some body", "https://example.com");
        assert!(prompt.contains("My Title"));
        assert!(prompt.contains("https://example.com"));
        assert!(prompt.contains("some body"));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "中文字符边界测试内容";
        let out = truncate_chars(text, 4);
        assert_eq!(out, "中文字符...");
    }

    #[test]
    fn truncation_leaves_short_content_alone() {
        assert_eq!(truncate_chars("short", 100), "short");
    }

    #[tokio::test]
    async fn unsupported_backend_is_an_error() {
        let summarizer = Summarizer::new(config("granite", "http://localhost")).unwrap();
        let err = summarizer
            .generate("t", "c", "https://example.com")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unsupported backend"));
    }

    #[tokio::test]
    async fn openai_backend_parses_chat_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({ "model": "test-model" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [
                    { "message": { "role": "assistant", "content": " a summary " } }
                ]
            })))
            .mount(&server)
            .await;

        let summarizer = Summarizer::new(config("openai", &server.uri())).unwrap();
        let summary = summarizer
            .generate("t", "c", "https://example.com")
            .await
            .unwrap();
        assert_eq!(summary, "a summary");
    }

    #[tokio::test]
    async fn ollama_backend_parses_chat_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": { "role": "assistant", "content": "local summary" }
            })))
            .mount(&server)
            .await;

        let summarizer = Summarizer::new(config("ollama", &server.uri())).unwrap();
        let summary = summarizer
            .generate("t", "c", "https://example.com")
            .await
            .unwrap();
        assert_eq!(summary, "local summary");
    }

    #[tokio::test]
    async fn api_error_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let summarizer = Summarizer::new(config("openai", &server.uri())).unwrap();
        let err = summarizer
            .generate("t", "c", "https://example.com")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn connection_probe_reports_failure() {
        let summarizer =
            Summarizer::new(config("openai", "http://127.0.0.1:1")).unwrap();
        assert!(!summarizer.test_connection().await);
    }
}
