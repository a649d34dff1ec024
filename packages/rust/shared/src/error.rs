//! Error types for Flowsmith.
//!
//! Library crates use [`FlowsmithError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for Flowsmith operations.
#[derive(Debug, thiserror::Error)]
pub enum FlowsmithError {
    /// Caller input is missing or malformed; the user must resupply it.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Server credentials or settings are missing; the operator must fix the deployment.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network failure or non-2xx response from a third-party service.
    #[error("transport error: {0}")]
    Transport(String),

    /// Malformed JSON or content from a third-party service.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// No usable insertion surface (neither a native API nor a preview host).
    #[error("insertion failed: {message}")]
    InsertionFailed { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FlowsmithError>;

impl FlowsmithError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create an insertion error from any displayable message.
    pub fn insertion(msg: impl Into<String>) -> Self {
        Self::InsertionFailed {
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

    /// The bare message, without the category prefix used by `Display`.
    pub fn message(&self) -> String {
        match self {
            Self::Validation { message }
            | Self::Config { message }
            | Self::Parse { message }
            | Self::InsertionFailed { message } => message.clone(),
            Self::Transport(message) => message.clone(),
            Self::Io { path, source } => format!("{}: {source}", path.display()),
        }
    }
}
