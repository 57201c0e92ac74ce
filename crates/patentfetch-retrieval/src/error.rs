//! Error types for the retrieval pipeline.

use std::path::PathBuf;
use thiserror::Error;
use patentfetch_common::PatentFetchError;

use crate::models::FailureKind;

/// Per-identifier failure. Always caught by the pipeline and turned into a
/// [`crate::RetrievalResult::Failure`]; never aborts a batch.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("invalid identifier {original:?}: nothing left after normalisation")]
    InvalidIdentifier { original: String },

    #[error("patent not found at {url}: {cause}")]
    NotFound { url: String, cause: String },

    #[error("failed to save {url} to {}: {message}", .path.display())]
    Io { url: String, path: PathBuf, message: String },

    #[error("retrieval cancelled")]
    Cancelled,
}

impl RetrievalError {
    pub fn not_found(url: &str, cause: impl ToString) -> Self {
        RetrievalError::NotFound { url: url.to_string(), cause: cause.to_string() }
    }

    pub fn io(url: &str, path: impl Into<PathBuf>, message: impl ToString) -> Self {
        RetrievalError::Io { url: url.to_string(), path: path.into(), message: message.to_string() }
    }

    /// `None` for `Cancelled`, which is not a failure.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            RetrievalError::InvalidIdentifier { .. } => Some(FailureKind::InvalidIdentifier),
            RetrievalError::NotFound { .. }          => Some(FailureKind::NotFound),
            RetrievalError::Io { .. }                => Some(FailureKind::Io),
            RetrievalError::Cancelled                => None,
        }
    }

    pub fn attempted_url(&self) -> Option<&str> {
        match self {
            RetrievalError::NotFound { url, .. } | RetrievalError::Io { url, .. } => Some(url),
            _ => None,
        }
    }
}

/// Failure to produce the identifier list. Fatal for the whole batch.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read input file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV input: {0}")]
    Csv(#[from] csv::Error),

    #[error("Column {column:?} not found. Available columns: {available:?}")]
    MissingColumn { column: String, available: Vec<String> },

    #[error("No patent identifiers found in {}", .path.display())]
    Empty { path: PathBuf },
}

/// Failure to set up a batch. Raised before any network activity.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Failed to create output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Client(#[from] PatentFetchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_url_per_variant() {
        let e = RetrievalError::not_found("https://patents.google.com/patent/X", "HTTP 404");
        assert_eq!(e.kind(), Some(FailureKind::NotFound));
        assert_eq!(e.attempted_url(), Some("https://patents.google.com/patent/X"));

        let e = RetrievalError::InvalidIdentifier { original: " ".into() };
        assert_eq!(e.kind(), Some(FailureKind::InvalidIdentifier));
        assert_eq!(e.attempted_url(), None);

        assert_eq!(RetrievalError::Cancelled.kind(), None);
    }

    #[test]
    fn test_io_message_includes_path() {
        let e = RetrievalError::io("https://x/y.pdf", "/tmp/out/US1.pdf", "disk full");
        let msg = e.to_string();
        assert!(msg.contains("/tmp/out/US1.pdf"));
        assert!(msg.contains("disk full"));
    }
}
