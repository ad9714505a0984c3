//! Error types for dependents lookups.
//!
//! Errors are split into two families:
//!
//! - **`Error`**: build-halting failures (bad arguments, unreadable alias
//!   config, a worker dying, a scheduler accounting mismatch)
//! - **`IndexError`**: per-file failures that are logged and collected but
//!   never stop the build
//!
//! A single malformed source file contributes zero edges; every other file is
//! still indexed. Only infrastructure problems end the build early.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for dependents operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
///
/// When one of these is returned the build produced no usable index.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid arguments. Raised before any I/O happens.
    #[error("configuration error: {0}")]
    Config(String),

    /// File system operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The module alias config exists but could not be understood
    #[error("invalid alias config {}: {message}", path.display())]
    AliasConfig {
        /// Config file that failed to parse
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// A worker reported a fatal failure while indexing its chunk
    #[error("worker {worker} failed: {message}")]
    Worker {
        /// Index of the failing worker
        worker: usize,
        /// Failure reported by the worker
        message: String,
    },

    /// The scheduler handed out a different number of files than it was given
    #[error("scheduler dispatched {dispatched} files but {expected} were queued")]
    Accounting {
        /// Files actually sent to workers
        dispatched: usize,
        /// Candidate files the build started with
        expected: usize,
    },

    /// Coordinator-side invariant failure
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error encountered while indexing a specific file.
///
/// Collected in [`BuildStats::errors`](crate::BuildStats) and logged, never
/// returned as `Err` from a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexError {
    /// Path to the file that failed
    pub path: PathBuf,
    /// Category of the error
    pub kind: IndexErrorKind,
    /// Human-readable error message
    pub message: String,
}

impl std::fmt::Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} ({})",
            self.path.display(),
            self.message,
            self.kind
        )
    }
}

impl std::error::Error for IndexError {}

/// Categorization of per-file errors.
///
/// Input problems are issues with the source files themselves; internal
/// problems come from the environment we read them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexErrorKind {
    // === Input Problems (analogous to HTTP 4xx) ===
    /// Import extraction hit syntax it could not get through
    ParseFailed,

    /// File content is not valid UTF-8
    EncodingError,

    // === Internal Problems (analogous to HTTP 5xx) ===
    /// Could not read the file from disk
    IoError,
}

impl std::fmt::Display for IndexErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParseFailed => write!(f, "parse failed"),
            Self::EncodingError => write!(f, "encoding error"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl IndexErrorKind {
    /// Returns `true` if this is an input problem (4xx-style).
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::ParseFailed | Self::EncodingError)
    }

    /// Returns `true` if this is an internal problem (5xx-style).
    #[must_use]
    pub fn is_internal_error(&self) -> bool {
        matches!(self, Self::IoError)
    }
}

impl IndexError {
    /// Create a new per-file error.
    #[must_use]
    pub fn new(path: PathBuf, kind: IndexErrorKind, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
        }
    }

    /// Create a parse error for a file.
    #[must_use]
    pub fn parse_failed(path: PathBuf, message: impl Into<String>) -> Self {
        Self::new(path, IndexErrorKind::ParseFailed, message)
    }

    /// Create an encoding error for a file.
    #[must_use]
    pub fn encoding_error(path: PathBuf) -> Self {
        Self::new(path, IndexErrorKind::EncodingError, "file is not valid UTF-8")
    }

    /// Create an I/O error for a file.
    #[must_use]
    pub fn io_error(path: PathBuf, error: &std::io::Error) -> Self {
        Self::new(path, IndexErrorKind::IoError, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_error_kind_categorization() {
        assert!(IndexErrorKind::ParseFailed.is_input_error());
        assert!(IndexErrorKind::EncodingError.is_input_error());
        assert!(!IndexErrorKind::ParseFailed.is_internal_error());

        assert!(IndexErrorKind::IoError.is_internal_error());
        assert!(!IndexErrorKind::IoError.is_input_error());
    }

    #[test]
    fn index_error_display_includes_path_and_kind() {
        let error = IndexError::parse_failed(PathBuf::from("lib/main.js"), "unterminated string");

        let display = error.to_string();
        assert!(display.contains("lib/main.js"));
        assert!(display.contains("unterminated string"));
        assert!(display.contains("parse failed"));
    }

    #[test]
    fn accounting_error_names_both_counts() {
        let error = Error::Accounting {
            dispatched: 1199,
            expected: 1200,
        };

        let display = error.to_string();
        assert!(display.contains("1199"));
        assert!(display.contains("1200"));
    }

    #[test]
    fn worker_error_names_worker() {
        let error = Error::Worker {
            worker: 3,
            message: "boom".to_string(),
        };

        assert_eq!(error.to_string(), "worker 3 failed: boom");
    }
}
