//! Error types for the outline reconciler.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Errors that can occur during outline reconciliation.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The index file does not exist.
    #[error("Index file not found at '{0}'")]
    IndexNotFound(PathBuf),

    /// An outline entry has no usable page number after normalization.
    #[error("Outline entry '{title}' has no usable physical page index")]
    MissingPageIndex { title: String },

    /// A node's resolved page range falls outside the supplied document.
    ///
    /// Signals an upstream range-resolution defect; never recovered locally.
    #[error(
        "Section '{title}' spans pages {start_index}-{end_index} but the document has {page_count} pages"
    )]
    PageOutOfBounds {
        title: String,
        start_index: usize,
        end_index: usize,
        page_count: usize,
    },

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// LLM API error.
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// LLM response parsing error.
    #[error("Failed to parse LLM response: {0}")]
    LlmParse(String),

    /// HTTP request error.
    #[error("HTTP request failed: {0}")]
    Http(String),
}

impl ReconcileError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<reqwest::Error> for ReconcileError {
    fn from(err: reqwest::Error) -> Self {
        ReconcileError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for ReconcileError {
    fn from(err: serde_json::Error) -> Self {
        ReconcileError::Serialization(err.to_string())
    }
}
