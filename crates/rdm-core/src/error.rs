//! Transfer error type delivered to failure listeners.

use thiserror::Error;

/// Error produced by a transfer executor.
///
/// Opaque to the scheduler, which only propagates it to the failing
/// request's listeners. Cloneable so each registered listener receives
/// its own copy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    /// Connection-level failure (DNS, TLS, reset, timeout).
    #[error("connection: {0}")]
    Connection(String),
    /// Non-success HTTP status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Local I/O failure while writing the artifact.
    #[error("storage: {0}")]
    Storage(String),
    /// Transfer ended before the advertised length was received
    /// (e.g. server closed early).
    #[error("partial transfer: expected {expected} bytes, got {received}")]
    Partial { expected: u64, received: u64 },
}

impl DownloadError {
    pub(crate) fn connection(err: impl std::fmt::Display) -> Self {
        DownloadError::Connection(err.to_string())
    }

    pub(crate) fn storage(err: impl std::fmt::Display) -> Self {
        DownloadError::Storage(err.to_string())
    }
}
