//! Application error types

use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Request rejected: {0}")]
    Request(String),

    #[error("Transient fetch failure: {0}")]
    Transient(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the fetcher should retry after this error.
    ///
    /// Transient failures are timeouts, connection errors and 5xx/429
    /// responses. Auth and Request errors are final and must never be
    /// retried.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Transient(_) => true,
            AppError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
