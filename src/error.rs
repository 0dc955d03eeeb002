// src/error.rs

//! Unified error handling for the bookmark crawler.

use std::fmt;

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Headless browser launch/navigation failed
    #[error("Browser error: {0}")]
    Browser(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Page fetch failed with a recorded reason
    #[error("Fetch error for {context}: {message}")]
    Fetch { context: String, message: String },

    /// Summary generation failed
    #[error("Summary error: {0}")]
    Summary(String),
}

impl AppError {
    /// Create a browser error.
    pub fn browser(message: impl fmt::Display) -> Self {
        Self::Browser(message.to_string())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a fetch error with context.
    pub fn fetch(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a summary error.
    pub fn summary(message: impl fmt::Display) -> Self {
        Self::Summary(message.to_string())
    }
}
