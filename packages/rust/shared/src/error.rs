//! Error types for the Blackstar client.
//!
//! Library crates use [`BlackstarError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Blackstar client operations.
#[derive(Debug, thiserror::Error)]
pub enum BlackstarError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The query does not select exactly one retrieval mode.
    #[error("invalid query: must contain exactly one of ids, names, tags")]
    AmbiguousQuery,

    /// Transport failure (connect, timeout, body read).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered 401.
    #[error("unauthorized: {url}")]
    Unauthorized { url: String },

    /// Any other non-success status.
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// Response body did not match the expected JSON shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid input outside of query classification.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BlackstarError>;

impl BlackstarError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// HTTP status code carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
