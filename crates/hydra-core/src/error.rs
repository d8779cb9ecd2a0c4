//! Error types for the hydra core library.

use std::path::PathBuf;

use thiserror::Error;

use crate::dispatch::QueueError;

/// Result type alias using hydra Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for hydra operations.
///
/// Every variant is fatal for the run it occurs in. Failures of individual
/// tasks are never surfaced here; they are carried by
/// [`ExecutionResult`](crate::dispatch::ExecutionResult) instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid run configuration (non-positive worker count, bad log level, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The submodule declaration file could not be read
    #[error("Failed to read {}: {source}. Are you in a folder that has submodules?", .path.display())]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The submodule declaration file declares nothing to work on
    #[error("No submodules declared in {}", .path.display())]
    NoItems { path: PathBuf },

    /// A worker task terminated abnormally
    #[error("Worker {worker_id} terminated abnormally: {reason}")]
    WorkerPanicked { worker_id: usize, reason: String },

    /// Task queue misuse
    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl Error {
    /// Whether this error was raised before any work was attempted.
    pub const fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::ReadSource { .. } | Self::NoItems { .. }
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn read_source_message_names_the_file() {
        let err = Error::ReadSource {
            path: PathBuf::from("/tmp/.gitmodules"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/.gitmodules"), "message: {msg}");
        assert!(err.is_config());
    }

    #[test]
    fn queue_errors_are_not_config_errors() {
        let err = Error::from(QueueError::Closed);
        assert!(!err.is_config());
        assert_eq!(err.to_string(), QueueError::Closed.to_string());
    }
}
