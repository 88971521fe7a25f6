//! Bounded-concurrency FIFO queue of download requests.
//!
//! One queue owns two ordered collections: `waiting` (submitted, not yet
//! started, in submission order) and `running` (handed to the executor,
//! at most `running_limit` entries). Every mutation runs under a single
//! lock, so the concurrency bound and the one-instance-per-identity
//! invariant hold under concurrent submits, cancels, and finish
//! callbacks from executor threads.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::executor::{TransferExecutor, TransferHandle};
use crate::request::DownloadRequest;
use crate::types::DownloadId;

struct QueueState {
    waiting: VecDeque<Arc<DownloadRequest>>,
    running: Vec<Arc<DownloadRequest>>,
    running_limit: usize,
}

/// Handle to the shared queue. Cheap to clone; every clone sees the same
/// state.
#[derive(Clone)]
pub struct DownloadQueue {
    state: Arc<Mutex<QueueState>>,
    executor: Arc<dyn TransferExecutor>,
}

impl DownloadQueue {
    pub fn new(running_limit: usize, executor: Arc<dyn TransferExecutor>) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                waiting: VecDeque::new(),
                running: Vec::new(),
                running_limit: running_limit.max(1),
            })),
            executor,
        }
    }

    /// Sets the concurrency limit for subsequent admissions. Raising the
    /// limit admits waiting requests immediately; lowering it never
    /// preempts requests already running.
    pub fn set_running_limit(&self, limit: usize) {
        let started = {
            let mut state = self.state.lock().unwrap();
            state.running_limit = limit.max(1);
            Self::admit_locked(&mut state)
        };
        self.launch(started);
    }

    /// Adds a request and admits as capacity allows. If a request with
    /// the same identity is already waiting or running, this is a no-op
    /// and the existing instance stays authoritative; re-submission is
    /// idempotent. Returns the request's id either way.
    pub fn submit(&self, request: Arc<DownloadRequest>) -> DownloadId {
        let id = request.id();
        let started = {
            let mut state = self.state.lock().unwrap();
            let duplicate = state.waiting.iter().any(|r| r.id() == id)
                || state.running.iter().any(|r| r.id() == id);
            if duplicate {
                tracing::debug!(id, "duplicate submission ignored");
                return id;
            }
            // Refuses requests in a state with no path back to QUEUED
            // (completed, failed, cancelled, or already queued elsewhere).
            if !request.mark_queued() {
                return id;
            }
            request.attach_queue(self.clone());
            state.waiting.push_back(request);
            Self::admit_locked(&mut state)
        };
        self.launch(started);
        id
    }

    /// Finds the waiting or running request with this identity. A miss is
    /// a normal outcome, not an error.
    pub fn get(&self, id: DownloadId) -> Option<Arc<DownloadRequest>> {
        let state = self.state.lock().unwrap();
        state
            .waiting
            .iter()
            .chain(state.running.iter())
            .find(|r| r.id() == id)
            .cloned()
    }

    /// Drops the request with this identity from whichever collection
    /// holds it, then admits the next waiting request into any freed
    /// slot. Removal is pure bookkeeping: cancellation side effects are
    /// the request's own job (see [`DownloadRequest::cancel`]).
    pub fn remove(&self, id: DownloadId) {
        let started = {
            let mut state = self.state.lock().unwrap();
            if let Some(pos) = state.waiting.iter().position(|r| r.id() == id) {
                state.waiting.remove(pos);
            }
            if let Some(pos) = state.running.iter().position(|r| r.id() == id) {
                state.running.remove(pos);
            }
            Self::admit_locked(&mut state)
        };
        self.launch(started);
    }

    /// Called when a running request stops executing (terminal outcome or
    /// pause): frees its slot and advances the queue.
    pub fn on_finished(&self, request: &DownloadRequest) {
        self.remove(request.id());
    }

    pub fn running_count(&self) -> usize {
        self.state.lock().unwrap().running.len()
    }

    pub fn waiting_count(&self) -> usize {
        self.state.lock().unwrap().waiting.len()
    }

    /// Admission: move waiting heads into `running` while capacity
    /// allows. Runs under the queue lock so the check-and-pop is atomic
    /// with respect to concurrent submits and removals; the returned
    /// requests are launched after the lock is released.
    fn admit_locked(state: &mut QueueState) -> Vec<Arc<DownloadRequest>> {
        let mut started = Vec::new();
        while state.running.len() < state.running_limit {
            let Some(request) = state.waiting.pop_front() else {
                break;
            };
            // Cancelled while waiting: drop without occupying a slot.
            if !request.mark_running() {
                continue;
            }
            state.running.push(Arc::clone(&request));
            started.push(request);
        }
        started
    }

    /// Fires the start-or-resume event and hands each admitted request to
    /// the executor. The start event is latch-guarded, and the executor
    /// re-checks status before the first byte, so a cancel landing
    /// between admission and launch stays silent.
    fn launch(&self, started: Vec<Arc<DownloadRequest>>) {
        for request in started {
            tracing::debug!(id = request.id(), url = %request.url(), "starting download");
            let handle = TransferHandle::new();
            request.attach_handle(handle.clone());
            request.deliver_start_event();
            self.executor.start(request, handle);
        }
    }
}
