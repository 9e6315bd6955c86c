//! Custom error types for rustselfcite.
//!
//! All fallible functions return `Result<T, SelfCiteError>` instead of using `unwrap()`.
//! Record-level failures are reported through [`SelfCiteError::Extraction`] and are
//! never fatal to a profile traversal.

use thiserror::Error;

/// Main error type for rustselfcite operations.
#[derive(Debug, Error)]
pub enum SelfCiteError {
    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTML parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Rate limited by Google Scholar
    #[error("Rate limited, retry after {0}s")]
    RateLimited(u64),

    /// Non-success HTTP status
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code
        code: i32,
        /// Error message
        message: String,
    },

    /// CAPTCHA or block page detected
    #[error("CAPTCHA detected, please refresh cookies")]
    Captcha,

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// One publication or citation record could not be extracted
    #[error("Extraction error: {0}")]
    Extraction(String),
}

/// Result type alias using `SelfCiteError`
pub type Result<T> = std::result::Result<T, SelfCiteError>;

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with an extraction error message
    fn ok_or_extract(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_extract(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| SelfCiteError::Extraction(msg.to_string()))
    }
}
