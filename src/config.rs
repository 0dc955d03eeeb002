// src/config.rs

//! Application configuration structures.
//!
//! Configuration is sourced from environment variables (a `.env` file is
//! honored when present) and can be overridden per-run by CLI flags. All
//! components receive explicit config structs at construction; there is no
//! global path state.

use std::env;
use std::path::PathBuf;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Input/output file locations
    pub paths: PathsConfig,

    /// Fetch pipeline behavior settings
    pub fetch: FetchConfig,

    /// LLM summarization settings
    pub summary: ModelConfig,

    /// Whether to run the summarization pass after crawling
    pub summarize: bool,
}

impl Config {
    /// Build configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            paths: PathsConfig::from_env(),
            fetch: FetchConfig::from_env(),
            summary: ModelConfig::from_env(),
            summarize: env_bool("GENERATE_SUMMARY", true),
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::config("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::config("fetch.timeout_secs must be > 0"));
        }
        if self.fetch.max_concurrent == 0 {
            return Err(AppError::config("fetch.max_concurrent must be > 0"));
        }
        if self.summarize && self.summary.max_input_chars == 0 {
            return Err(AppError::config("summary.max_input_chars must be > 0"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            fetch: FetchConfig::default(),
            summary: ModelConfig::default(),
            summarize: true,
        }
    }
}

/// Input and output file locations.
#[derive(Debug, Clone)]
pub struct PathsConfig {
    /// Path to the browser bookmark export file
    pub bookmarks_file: PathBuf,

    /// Directory for all output files
    pub output_dir: PathBuf,
}

impl PathsConfig {
    fn from_env() -> Self {
        Self {
            bookmarks_file: PathBuf::from(env_or("BOOKMARK_FILE", defaults::BOOKMARK_FILE)),
            output_dir: PathBuf::from(env_or("OUTPUT_DIR", ".")),
        }
    }

    /// File name for the filtered bookmark list.
    pub const FILTERED_FILE: &'static str = "bookmarks.json";

    /// File name for fetched content merged with summaries.
    pub const CONTENT_FILE: &'static str = "bookmarks_with_content.json";

    /// File name for the failure records.
    pub const FAILURES_FILE: &'static str = "failed_urls.json";
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            bookmarks_file: PathBuf::from(defaults::BOOKMARK_FILE),
            output_dir: PathBuf::from("."),
        }
    }
}

/// Fetch pipeline behavior settings.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User-Agent header for direct HTTP requests
    pub user_agent: String,

    /// Direct request timeout in seconds
    pub timeout_secs: u64,

    /// Additional retry attempts for transient HTTP failures
    pub max_retries: u32,

    /// Base delay for exponential retry backoff, in milliseconds
    pub retry_base_delay_ms: u64,

    /// Maximum concurrent fetch workers
    pub max_concurrent: usize,

    /// Optional prefix limit on the bookmark set (None = no limit)
    pub limit: Option<usize>,

    /// Fixed settle time after headless-browser navigation, in seconds
    pub settle_secs: u64,

    /// Domains that skip the direct tier and go straight to rendering
    pub render_domains: Vec<String>,
}

impl FetchConfig {
    fn from_env() -> Self {
        let limit = env_parse_or("BOOKMARK_LIMIT", 0usize);
        Self {
            user_agent: env_or("FETCH_USER_AGENT", defaults::USER_AGENT),
            timeout_secs: env_parse_or("FETCH_TIMEOUT_SECS", defaults::TIMEOUT_SECS),
            max_retries: env_parse_or("FETCH_MAX_RETRIES", defaults::MAX_RETRIES),
            retry_base_delay_ms: env_parse_or("FETCH_RETRY_DELAY_MS", defaults::RETRY_DELAY_MS),
            max_concurrent: env_parse_or("MAX_WORKERS", defaults::MAX_WORKERS),
            limit: if limit > 0 { Some(limit) } else { None },
            settle_secs: env_parse_or("RENDER_SETTLE_SECS", defaults::SETTLE_SECS),
            render_domains: defaults::render_domains(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            timeout_secs: defaults::TIMEOUT_SECS,
            max_retries: defaults::MAX_RETRIES,
            retry_base_delay_ms: defaults::RETRY_DELAY_MS,
            max_concurrent: defaults::MAX_WORKERS,
            limit: None,
            settle_secs: defaults::SETTLE_SECS,
            render_domains: defaults::render_domains(),
        }
    }
}

/// LLM summarization settings.
///
/// `backend` selects the API shape: `openai` (OpenAI-compatible chat
/// completions, also used for Qwen-style gateways), `deepseek` (vendor
/// completion endpoint), or `ollama` (local `/api/chat` endpoint).
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Backend API shape selector
    pub backend: String,

    /// API base URL
    pub api_base: String,

    /// API credential (may be empty for local endpoints)
    pub api_key: String,

    /// Model identifier sent to the backend
    pub model_name: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Maximum input content length in characters before truncation
    pub max_input_chars: usize,

    /// Sampling temperature
    pub temperature: f32,

    /// Nucleus sampling parameter
    pub top_p: f32,

    /// Top-k sampling parameter
    pub top_k: u32,

    /// Frequency penalty
    pub frequency_penalty: f32,

    /// Optional system prompt prepended to requests
    pub system_prompt: Option<String>,
}

impl ModelConfig {
    fn from_env() -> Self {
        let system_prompt = env::var("SYSTEM_PROMPT").ok().filter(|s| !s.is_empty());
        Self {
            backend: env_or("MODEL_TYPE", "openai"),
            api_base: env_or("API_BASE", "https://api.openai.com/v1"),
            api_key: env_or("API_KEY", ""),
            model_name: env_or("MODEL_NAME", "gpt-3.5-turbo"),
            max_tokens: env_parse_or("MAX_TOKENS", 1000),
            max_input_chars: env_parse_or("MAX_INPUT_CONTENT_LENGTH", 6000),
            temperature: env_parse_or("TEMPERATURE", 0.3),
            top_p: env_parse_or("TOP_P", 0.7),
            top_k: env_parse_or("TOP_K", 50),
            frequency_penalty: env_parse_or("FREQUENCY_PENALTY", 0.5),
            system_prompt,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: "openai".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model_name: "gpt-3.5-turbo".to_string(),
            max_tokens: 1000,
            max_input_chars: 6000,
            temperature: 0.3,
            top_p: 0.7,
            top_k: 50,
            frequency_penalty: 0.5,
            system_prompt: None,
        }
    }
}

/// Read an environment variable with a string default.
fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read and parse an environment variable, falling back on missing or
/// unparseable values.
fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read a boolean environment variable ("true"/"1"/"yes" are truthy).
fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"),
        Err(_) => default,
    }
}

mod defaults {
    pub const BOOKMARK_FILE: &str = "Bookmarks";
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
    pub const TIMEOUT_SECS: u64 = 15;
    pub const MAX_RETRIES: u32 = 3;
    pub const RETRY_DELAY_MS: u64 = 500;
    pub const MAX_WORKERS: usize = 20;
    pub const SETTLE_SECS: u64 = 5;

    pub fn render_domains() -> Vec<String> {
        vec!["zhihu.com".to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.fetch.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.fetch.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_limit_is_unbounded() {
        let config = FetchConfig::default();
        assert!(config.limit.is_none());
    }
}
