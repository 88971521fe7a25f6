//! Transfer executor seam.
//!
//! The queue hands admitted requests to a [`TransferExecutor`]; the
//! executor performs the byte transfer and reports back through
//! [`DownloadRequest::on_transfer_done`]. Interruption is advisory: the
//! caller sets the authoritative state (cancelled/paused) on the request
//! first, then trips the handle, and the transfer stops when it notices.
//!
//! [`DownloadRequest::on_transfer_done`]: crate::request::DownloadRequest::on_transfer_done

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::DownloadError;
use crate::request::DownloadRequest;

/// How a transfer stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// All bytes received and the artifact moved into place.
    Completed,
    /// The transfer failed; the error is propagated to failure listeners.
    Failed(DownloadError),
    /// The transfer noticed its interrupt token and stopped early.
    /// The request's status (paused or cancelled) says why.
    Interrupted,
}

/// Advisory interrupt token for one in-flight transfer.
#[derive(Debug, Clone, Default)]
pub struct TransferHandle {
    interrupted: Arc<AtomicBool>,
}

impl TransferHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the transfer to stop. The write loop checks the token and
    /// aborts; bytes already written stay on disk for resume.
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::Relaxed);
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::Relaxed)
    }
}

/// Runs transfers for the queue and for the synchronous adapter.
pub trait TransferExecutor: Send + Sync {
    /// Begins running `request` on a worker. The executor must call
    /// `request.on_transfer_done(outcome)` exactly once when the transfer
    /// stops, and should watch `handle` for interruption.
    fn start(&self, request: Arc<DownloadRequest>, handle: TransferHandle);

    /// Runs the transfer to completion on the calling thread and returns
    /// the outcome. Used by the synchronous adapter; fires no listeners.
    fn run(&self, request: &DownloadRequest) -> TransferOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_starts_clear_and_latches() {
        let handle = TransferHandle::new();
        assert!(!handle.is_interrupted());
        let clone = handle.clone();
        handle.interrupt();
        assert!(clone.is_interrupted());
    }
}
