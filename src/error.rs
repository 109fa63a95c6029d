//! Error taxonomy for the logging facility
//!
//! Configuration errors are returned to the caller; runtime I/O errors inside
//! `emit` are absorbed by the fallback sinks and only surface through
//! `force_sync` and the lifecycle calls.

use std::io;
use std::path::PathBuf;

/// Errors returned by the logging facility
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Unrecognized level or rotation cycle name, or an empty path component
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation not allowed in the current lifecycle state
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// File open/write/sync failure
    #[error("{context} ({path}): {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The write buffer could not grow to hold a record
    #[error("could not reserve {0} bytes for the log buffer")]
    ResourceExhausted(usize),
}

impl LogError {
    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        LogError::Io {
            context,
            path: path.into(),
            source,
        }
    }

    /// Numeric status for callers that work with exit-code style results
    ///
    /// Success is `0`; every error maps to a distinct non-zero code.
    pub fn status_code(&self) -> i32 {
        match self {
            LogError::InvalidArgument(_) => 1,
            LogError::InvalidState(_) => 2,
            LogError::Io { .. } => 3,
            LogError::ResourceExhausted(_) => 4,
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, LogError>;

/// Collapse a result into the `0` / non-zero status convention
pub fn status<T>(result: &Result<T>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(e) => e.status_code(),
    }
}
