//! Error types for parsing, repository access and job processing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, editing or writing a policy tree.
///
/// Every variant is fatal to a worker run: the caller aborts before any
/// file is written.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Malformed policy source or malformed inline fragment.
    #[error("{file}:{line}:{column}: {message}")]
    Parse {
        file: String,
        line: usize,
        column: usize,
        message: String,
    },

    /// Named definition, element or rule is absent.
    #[error("Can't find {0}")]
    NotFound(String),

    /// A definition with this name is already present.
    #[error("Duplicate definition of {0}")]
    AlreadyExists(String),

    /// Definition exists but has the wrong variant for the operation.
    #[error("{name} is {found}, expected {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Malformed job, missing field, unknown method or invalid address.
    #[error("{0}")]
    InvalidArgument(String),

    /// JSON decoding error.
    #[error("{context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO error during read/write.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid repository configuration.
    #[error("Invalid config: {0}")]
    Config(String),
}

impl PolicyError {
    /// Create a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create an invalid-argument error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create an IO error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PolicyError>;
