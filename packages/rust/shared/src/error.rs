//! Error types for jobwatch.
//!
//! Library crates use [`JobwatchError`] via `thiserror`.
//! The `jobwatch` binary wraps this with `color-eyre` for rich diagnostics,
//! and the HTTP layer maps it to a JSON error body by [`ErrorKind`].

use std::path::PathBuf;

use serde::Serialize;

/// Top-level error type for all jobwatch operations.
#[derive(Debug, thiserror::Error)]
pub enum JobwatchError {
    /// Network/HTTP error while fetching the listing index or a detail page.
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// Markup or attribute could not be interpreted.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Database or storage layer error.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// An extracted record failed a shape check.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, JobwatchError>;

/// Failure category, for branching without matching on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    Parse,
    Persistence,
    Config,
    Validation,
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Parse => "parse",
            Self::Persistence => "persistence",
            Self::Config => "config",
            Self::Validation => "validation",
            Self::Io => "io",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl JobwatchError {
    /// The failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Persistence(_) => ErrorKind::Persistence,
            Self::Config { .. } => ErrorKind::Config,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Create a transport error for the given URL.
    pub fn transport(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

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
}
