//! Error types for the list synchronizer.

use thiserror::Error;

/// Result type for list operations.
pub type ListResult<T> = Result<T, ListError>;

/// Errors that can occur while loading rows.
///
/// None of these are fatal: a failed load leaves the row set in its last
/// known-good state.
#[derive(Error, Debug)]
pub enum ListError {
    /// The query source failed to produce a page.
    #[error("query failed: {message}")]
    Query {
        /// Error message.
        message: String,
        /// Whether the query can be retried.
        retryable: bool,
    },

    /// The query did not complete within the configured timeout.
    #[error("query timed out")]
    Timeout,

    /// The load was superseded before it completed.
    #[error("load cancelled")]
    Cancelled,

    /// The query source went away before answering.
    #[error("query source closed")]
    SourceClosed,

    /// A scenario or row file could not be interpreted.
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    /// JSON error while reading rows or filters.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ListError {
    /// Creates a retryable query error.
    pub fn query_retryable(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable query error.
    pub fn query_fatal(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ListError::Query { retryable, .. } => *retryable,
            ListError::Timeout => true,
            _ => false,
        }
    }
}
