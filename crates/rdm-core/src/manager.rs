//! Download manager: an explicit instance wiring the queue to its
//! collaborators.
//!
//! Owns the configuration, the transfer executor, the event delivery
//! context, and the artifact cleaner, and hands them to every request it
//! builds. Multiple independent managers can coexist; nothing here is
//! process-global.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cleanup::{ArtifactCleaner, TempFileCleaner};
use crate::config::RdmConfig;
use crate::delivery::{EventDelivery, WorkerDelivery};
use crate::downloader::CurlDownloader;
use crate::executor::{TransferExecutor, TransferOutcome};
use crate::queue::DownloadQueue;
use crate::request::{DownloadRequest, DownloadRequestBuilder};
use crate::sync_call::SynchronousCall;
use crate::types::{DownloadId, Status};

#[derive(Clone)]
pub struct DownloadManager {
    config: RdmConfig,
    queue: DownloadQueue,
    executor: Arc<dyn TransferExecutor>,
    delivery: Arc<dyn EventDelivery>,
    cleaner: Arc<dyn ArtifactCleaner>,
}

impl DownloadManager {
    /// Manager with the default collaborators: curl transfers on blocking
    /// threads, ordered event delivery on a worker task, background
    /// `.part` cleanup. Must be called from within a tokio runtime.
    pub fn new(config: RdmConfig) -> Self {
        Self::with_collaborators(
            config,
            Arc::new(CurlDownloader::new()),
            Arc::new(WorkerDelivery::spawn()),
            Arc::new(TempFileCleaner),
        )
    }

    /// Manager with explicit collaborators; tests inject scriptable ones.
    pub fn with_collaborators(
        config: RdmConfig,
        executor: Arc<dyn TransferExecutor>,
        delivery: Arc<dyn EventDelivery>,
        cleaner: Arc<dyn ArtifactCleaner>,
    ) -> Self {
        let queue = DownloadQueue::new(config.running_limit, Arc::clone(&executor));
        Self {
            config,
            queue,
            executor,
            delivery,
            cleaner,
        }
    }

    pub fn config(&self) -> &RdmConfig {
        &self.config
    }

    pub fn queue(&self) -> &DownloadQueue {
        &self.queue
    }

    /// Starts building a request for `url` saved under `dir_path`.
    pub fn download(
        &self,
        url: impl Into<String>,
        dir_path: impl Into<PathBuf>,
    ) -> DownloadRequestBuilder {
        DownloadRequestBuilder::new(
            url.into(),
            dir_path.into(),
            self.config.clone(),
            Arc::clone(&self.delivery),
            Arc::clone(&self.cleaner),
        )
    }

    /// Submits a request to the queue. Duplicate identities are no-ops;
    /// paused requests are resubmitted and resume from their partial
    /// artifact.
    pub fn enqueue(&self, request: Arc<DownloadRequest>) -> DownloadId {
        self.queue.submit(request)
    }

    /// Request with this identity, if it is waiting or running. Used to
    /// attach late listeners or poll progress.
    pub fn get(&self, id: DownloadId) -> Option<Arc<DownloadRequest>> {
        self.queue.get(id)
    }

    pub fn status(&self, id: DownloadId) -> Option<Status> {
        self.queue.get(id).map(|request| request.status())
    }

    /// Cancels the request with this identity: latches it, interrupts the
    /// transfer, fires cancel listeners, discards the partial artifact,
    /// and frees its queue slot. Unknown ids are silently ignored.
    pub fn cancel(&self, id: DownloadId) {
        if let Some(request) = self.queue.get(id) {
            request.cancel();
        }
    }

    /// Pauses the running request with this identity. No-op unless it is
    /// currently running.
    pub fn pause(&self, id: DownloadId) {
        if let Some(request) = self.queue.get(id) {
            request.pause();
        }
    }

    pub fn set_running_limit(&self, limit: usize) {
        self.queue.set_running_limit(limit);
    }

    /// Runs `request` synchronously through the same executor, bypassing
    /// the queue entirely. Blocks the calling thread.
    pub fn execute_sync(&self, request: &Arc<DownloadRequest>) -> TransferOutcome {
        SynchronousCall::new(Arc::clone(request)).execute(self.executor.as_ref())
    }
}
