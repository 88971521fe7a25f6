//! Download request: configuration, lifecycle state machine, event fan-out.
//!
//! A request owns its own transitions. The queue decides *when* a request
//! runs; the request decides *what* each transition means: which listeners
//! fire, whether the cancellation latch suppresses them, and when the
//! listener sets are torn down.

mod builder;

pub use builder::DownloadRequestBuilder;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use crate::cleanup::{self, ArtifactCleaner};
use crate::delivery::EventDelivery;
use crate::error::DownloadError;
use crate::executor::{TransferHandle, TransferOutcome};
use crate::id;
use crate::queue::DownloadQueue;
use crate::types::{DownloadId, Priority, Progress, Status};

/// Completion/error listener. One registration covers both outcomes, so a
/// caller that only cares about one overrides a single method.
pub trait DownloadListener: Send + Sync {
    fn on_complete(&self) {}
    fn on_error(&self, error: DownloadError) {
        let _ = error;
    }
}

type EventFn = Arc<dyn Fn() + Send + Sync>;
type ProgressFn = Arc<dyn Fn(Progress) + Send + Sync>;

/// Everything guarded by the request's own lock: status, the in-flight
/// handle, the owning queue, and the listener sets.
struct RequestState {
    status: Status,
    handle: Option<TransferHandle>,
    queue: Option<DownloadQueue>,
    on_progress: Vec<ProgressFn>,
    on_download: Vec<Arc<dyn DownloadListener>>,
    on_start_or_resume: Vec<EventFn>,
    on_pause: Vec<EventFn>,
    on_cancel: Vec<EventFn>,
}

pub struct DownloadRequest {
    url: String,
    dir_path: PathBuf,
    file_name: String,
    priority: Priority,
    tag: Option<String>,
    headers: HashMap<String, String>,
    connect_timeout: Duration,
    read_timeout: Duration,
    user_agent: String,
    downloaded_bytes: AtomicU64,
    total_bytes: AtomicU64,
    id: OnceLock<DownloadId>,
    state: Mutex<RequestState>,
    delivery: Arc<dyn EventDelivery>,
    cleaner: Arc<dyn ArtifactCleaner>,
}

impl DownloadRequest {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        url: String,
        dir_path: PathBuf,
        file_name: String,
        priority: Priority,
        tag: Option<String>,
        headers: HashMap<String, String>,
        connect_timeout: Duration,
        read_timeout: Duration,
        user_agent: String,
        delivery: Arc<dyn EventDelivery>,
        cleaner: Arc<dyn ArtifactCleaner>,
    ) -> Arc<Self> {
        Arc::new(Self {
            url,
            dir_path,
            file_name,
            priority,
            tag,
            headers,
            connect_timeout,
            read_timeout,
            user_agent,
            downloaded_bytes: AtomicU64::new(0),
            total_bytes: AtomicU64::new(0),
            id: OnceLock::new(),
            state: Mutex::new(RequestState {
                status: Status::Created,
                handle: None,
                queue: None,
                on_progress: Vec::new(),
                on_download: Vec::new(),
                on_start_or_resume: Vec::new(),
                on_pause: Vec::new(),
                on_cancel: Vec::new(),
            }),
            delivery,
            cleaner,
        })
    }

    /// Identity of this request, memoized on first access.
    pub fn id(&self) -> DownloadId {
        *self
            .id
            .get_or_init(|| id::download_id(&self.url, &self.dir_path, &self.file_name))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn dir_path(&self) -> &Path {
        &self.dir_path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Final destination path (dir + file name).
    pub fn target_path(&self) -> PathBuf {
        self.dir_path.join(&self.file_name)
    }

    /// Path of the in-progress artifact next to the destination.
    pub fn temp_path(&self) -> PathBuf {
        cleanup::temp_path(&self.target_path())
    }

    pub fn status(&self) -> Status {
        self.state.lock().unwrap().status
    }

    pub fn progress(&self) -> Progress {
        Progress {
            downloaded_bytes: self.downloaded_bytes.load(Ordering::Relaxed),
            total_bytes: self.total_bytes.load(Ordering::Relaxed),
        }
    }

    // ---- listener registration (order of registration = delivery order) ----

    pub fn add_on_progress(&self, listener: impl Fn(Progress) + Send + Sync + 'static) -> &Self {
        self.state.lock().unwrap().on_progress.push(Arc::new(listener));
        self
    }

    pub fn add_download_listener(&self, listener: Arc<dyn DownloadListener>) -> &Self {
        self.state.lock().unwrap().on_download.push(listener);
        self
    }

    pub fn add_on_start_or_resume(&self, listener: impl Fn() + Send + Sync + 'static) -> &Self {
        self.state
            .lock()
            .unwrap()
            .on_start_or_resume
            .push(Arc::new(listener));
        self
    }

    pub fn add_on_pause(&self, listener: impl Fn() + Send + Sync + 'static) -> &Self {
        self.state.lock().unwrap().on_pause.push(Arc::new(listener));
        self
    }

    pub fn add_on_cancel(&self, listener: impl Fn() + Send + Sync + 'static) -> &Self {
        self.state.lock().unwrap().on_cancel.push(Arc::new(listener));
        self
    }

    // ---- progress reporting (called by the transfer executor) ----

    pub fn set_downloaded(&self, bytes: u64) {
        self.downloaded_bytes.store(bytes, Ordering::Relaxed);
    }

    pub fn set_total(&self, bytes: u64) {
        self.total_bytes.store(bytes, Ordering::Relaxed);
    }

    /// Fans the current progress out to progress listeners. Suppressed
    /// unless the request is running, so a paused or cancelled request
    /// never emits a late progress tick.
    pub fn report_progress(&self) {
        let listeners = {
            let state = self.state.lock().unwrap();
            if state.status != Status::Running {
                return;
            }
            state.on_progress.clone()
        };
        if listeners.is_empty() {
            return;
        }
        let progress = self.progress();
        self.delivery.dispatch(Box::new(move || {
            for listener in &listeners {
                listener(progress);
            }
        }));
    }

    // ---- lifecycle transitions ----

    /// `CREATED`/`PAUSED` → `QUEUED`. False if the request is in any other
    /// state (the queue then refuses the submission).
    pub(crate) fn mark_queued(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        match state.status {
            Status::Created | Status::Paused => {
                state.status = Status::Queued;
                true
            }
            _ => false,
        }
    }

    /// `QUEUED` → `RUNNING`, under the queue lock during admission. False
    /// if the request was cancelled while waiting; the queue drops it
    /// without occupying a slot.
    pub(crate) fn mark_running(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.status != Status::Queued {
            return false;
        }
        state.status = Status::Running;
        true
    }

    pub(crate) fn attach_queue(&self, queue: DownloadQueue) {
        self.state.lock().unwrap().queue = Some(queue);
    }

    pub(crate) fn attach_handle(&self, handle: TransferHandle) {
        self.state.lock().unwrap().handle = Some(handle);
    }

    /// Entry point for the executor when a transfer stops.
    pub fn on_transfer_done(&self, outcome: TransferOutcome) {
        match outcome {
            TransferOutcome::Completed => self.deliver_success(),
            TransferOutcome::Failed(error) => self.deliver_error(error),
            TransferOutcome::Interrupted => {
                // The interrupt was requested by pause() or cancel(); only
                // pause still owes an event and a queue slot.
                if self.status() == Status::Paused {
                    self.deliver_pause_event();
                    let queue = self.state.lock().unwrap().queue.take();
                    if let Some(queue) = queue {
                        queue.on_finished(self);
                    }
                }
            }
        }
    }

    /// Pauses a running transfer: marks `PAUSED`, then trips the interrupt.
    /// The executor notices, stops, and the pause event is delivered from
    /// `on_transfer_done`. Resuming is resubmission to the queue.
    pub fn pause(&self) {
        let mut state = self.state.lock().unwrap();
        if state.status != Status::Running {
            return;
        }
        state.status = Status::Paused;
        if let Some(handle) = &state.handle {
            handle.interrupt();
        }
    }

    /// Cancels the request. The status latches to `CANCELLED` before the
    /// in-flight transfer is even asked to stop, so no success, failure,
    /// start, or pause event can be observed afterwards. Cancel listeners
    /// fire; the other listener sets stay registered but silent. The
    /// partial artifact is discarded in the background.
    pub fn cancel(&self) {
        let (listeners, queue) = {
            let mut state = self.state.lock().unwrap();
            if state.status.is_terminal() {
                return;
            }
            state.status = Status::Cancelled;
            if let Some(handle) = &state.handle {
                handle.interrupt();
            }
            (state.on_cancel.clone(), state.queue.take())
        };
        tracing::debug!(id = self.id(), url = %self.url, "download cancelled");
        if !listeners.is_empty() {
            self.delivery.dispatch(Box::new(move || {
                for listener in &listeners {
                    listener();
                }
            }));
        }
        self.cleaner.discard(&self.temp_path(), self.id());
        if let Some(queue) = queue {
            queue.remove(self.id());
        }
    }

    pub(crate) fn deliver_start_event(&self) {
        let listeners = {
            let state = self.state.lock().unwrap();
            if state.status == Status::Cancelled {
                return;
            }
            state.on_start_or_resume.clone()
        };
        if listeners.is_empty() {
            return;
        }
        self.delivery.dispatch(Box::new(move || {
            for listener in &listeners {
                listener();
            }
        }));
    }

    fn deliver_pause_event(&self) {
        let listeners = {
            let state = self.state.lock().unwrap();
            if state.status == Status::Cancelled {
                return;
            }
            state.on_pause.clone()
        };
        if listeners.is_empty() {
            return;
        }
        self.delivery.dispatch(Box::new(move || {
            for listener in &listeners {
                listener();
            }
        }));
    }

    fn deliver_success(&self) {
        let (listeners, queue) = {
            let mut state = self.state.lock().unwrap();
            if state.status == Status::Cancelled {
                return;
            }
            state.status = Status::Completed;
            let listeners = std::mem::take(&mut state.on_download);
            Self::destroy(&mut state);
            (listeners, state.queue.take())
        };
        tracing::debug!(id = self.id(), url = %self.url, "download completed");
        // Slot is freed before the fan-out runs.
        if let Some(queue) = queue {
            queue.on_finished(self);
        }
        if !listeners.is_empty() {
            self.delivery.dispatch(Box::new(move || {
                for listener in &listeners {
                    listener.on_complete();
                }
            }));
        }
    }

    fn deliver_error(&self, error: DownloadError) {
        let (listeners, queue) = {
            let mut state = self.state.lock().unwrap();
            if state.status == Status::Cancelled {
                return;
            }
            state.status = Status::Failed;
            let listeners = std::mem::take(&mut state.on_download);
            Self::destroy(&mut state);
            (listeners, state.queue.take())
        };
        tracing::debug!(id = self.id(), url = %self.url, "download failed: {}", error);
        if let Some(queue) = queue {
            queue.on_finished(self);
        }
        if !listeners.is_empty() {
            self.delivery.dispatch(Box::new(move || {
                for listener in &listeners {
                    listener.on_error(error.clone());
                }
            }));
        }
    }

    /// Terminal teardown: drop every listener reference and the transfer
    /// handle, so nothing can be delivered twice and no callback outlives
    /// the download.
    fn destroy(state: &mut RequestState) {
        state.on_progress.clear();
        state.on_download.clear();
        state.on_start_or_resume.clear();
        state.on_pause.clear();
        state.on_cancel.clear();
        state.handle = None;
    }
}

impl std::fmt::Debug for DownloadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadRequest")
            .field("id", &self.id())
            .field("url", &self.url)
            .field("file_name", &self.file_name)
            .field("status", &self.status())
            .finish()
    }
}
