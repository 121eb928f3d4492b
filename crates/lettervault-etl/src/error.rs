//! Pipeline error types

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, EtlError>;

/// Main error type for the lettervault pipeline
///
/// Errors raised before any bulk copy (fetch, configuration) abort the whole
/// batch. A `Database` error during a table load is fatal for that table
/// only. `DuplicateLoad` is recovered by the loader and surfaced as a
/// warning event, never as a process failure.
#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Fetching {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Source returned {status} for {url}")]
    FetchStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Duplicate load into {table}: batch keys already present")]
    DuplicateLoad { table: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EtlError {
    /// Wrap a transport-level failure against the source feed
    pub fn fetch(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Fetch {
            url: url.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
