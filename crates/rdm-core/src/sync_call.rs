//! Blocking single-shot execution, outside the queue.

use std::sync::Arc;

use crate::executor::{TransferExecutor, TransferOutcome};
use crate::request::DownloadRequest;

/// Wraps one request and runs its transfer to completion on the calling
/// thread, returning the terminal outcome instead of firing listeners.
///
/// The call never touches the queue: no slot is held, no admission
/// happens, and queued downloads run unaffected alongside it.
pub struct SynchronousCall {
    pub request: Arc<DownloadRequest>,
}

impl SynchronousCall {
    pub fn new(request: Arc<DownloadRequest>) -> Self {
        Self { request }
    }

    /// Blocks until the transfer stops. The defining contract of this
    /// path is that it blocks the caller for the full duration.
    pub fn execute(&self, executor: &dyn TransferExecutor) -> TransferOutcome {
        executor.run(&self.request)
    }
}
