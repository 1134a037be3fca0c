//! Runtime error types.

use thiserror::Error;

use crate::RunSummary;

/// Failure of the capture source. Opaque to the dispatch loop, which logs it
/// and keeps reading.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Source could not deliver the next payload
    #[error("capture failed: {reason}")]
    Source {
        /// Source-specific description
        reason: String,
    },
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        Self::Source { reason: err.to_string() }
    }
}

/// Errors that stop the dispatch loop.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Handshake failure that makes further processing pointless
    #[error("fatal handshake error: {message}")]
    Fatal {
        /// Reported failure
        message: String,
        /// Counters up to the failure
        summary: RunSummary,
    },
}
