use thiserror::Error;

/// Custom error types for the rule export
#[derive(Error, Debug)]
pub enum ExportError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Transport or decoding failure while talking to the Cloudflare API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Cloudflare API answered with something other than 200 OK
    #[error("Unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The Cloudflare API reported an unsuccessful call in its response body
    #[error("Cloudflare API error: {0}")]
    Cloudflare(String),

    /// A response arrived but did not satisfy the caller's acceptance check
    #[error("Response rejected for {0}")]
    Rejected(String),

    /// CSV report errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;
