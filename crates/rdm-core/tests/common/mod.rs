//! Shared test fixtures: a scriptable executor and recording collaborators.
#![allow(dead_code)]

pub mod range_server;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rdm_core::cleanup::ArtifactCleaner;
use rdm_core::config::RdmConfig;
use rdm_core::delivery::InlineDelivery;
use rdm_core::error::DownloadError;
use rdm_core::executor::{TransferExecutor, TransferHandle, TransferOutcome};
use rdm_core::manager::DownloadManager;
use rdm_core::request::{DownloadListener, DownloadRequest};
use rdm_core::types::DownloadId;

/// Executor that records what the queue hands it and finishes transfers
/// only when the test says so.
#[derive(Default)]
pub struct ManualExecutor {
    started: Mutex<Vec<Arc<DownloadRequest>>>,
    ran_sync: Mutex<Vec<DownloadId>>,
}

impl ManualExecutor {
    pub fn started_ids(&self) -> Vec<DownloadId> {
        self.started.lock().unwrap().iter().map(|r| r.id()).collect()
    }

    pub fn started_count(&self) -> usize {
        self.started.lock().unwrap().len()
    }

    pub fn ran_sync_ids(&self) -> Vec<DownloadId> {
        self.ran_sync.lock().unwrap().clone()
    }

    /// Reports `outcome` for a started request, as the transfer worker
    /// would when its transfer stops.
    pub fn finish(&self, id: DownloadId, outcome: TransferOutcome) {
        let request = self
            .started
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .expect("finish: request was never started");
        request.on_transfer_done(outcome);
    }

    /// Simulates a progress tick from the transfer worker.
    pub fn progress(&self, id: DownloadId, downloaded: u64, total: u64) {
        let request = self
            .started
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .expect("progress: request was never started");
        request.set_downloaded(downloaded);
        request.set_total(total);
        request.report_progress();
    }
}

impl TransferExecutor for ManualExecutor {
    fn start(&self, request: Arc<DownloadRequest>, _handle: TransferHandle) {
        self.started.lock().unwrap().push(request);
    }

    fn run(&self, request: &DownloadRequest) -> TransferOutcome {
        self.ran_sync.lock().unwrap().push(request.id());
        TransferOutcome::Completed
    }
}

/// Cleaner that records discard calls instead of touching the filesystem.
#[derive(Default)]
pub struct RecordingCleaner {
    discarded: Mutex<Vec<(PathBuf, DownloadId)>>,
}

impl RecordingCleaner {
    pub fn discarded_ids(&self) -> Vec<DownloadId> {
        self.discarded.lock().unwrap().iter().map(|(_, id)| *id).collect()
    }
}

impl ArtifactCleaner for RecordingCleaner {
    fn discard(&self, temp_path: &Path, id: DownloadId) {
        self.discarded
            .lock()
            .unwrap()
            .push((temp_path.to_path_buf(), id));
    }
}

pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn log_contents(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Completion/error listener that appends labelled entries to a log.
pub struct Recorder {
    label: String,
    log: EventLog,
}

pub fn recorder(label: &str, log: &EventLog) -> Arc<Recorder> {
    Arc::new(Recorder {
        label: label.to_string(),
        log: Arc::clone(log),
    })
}

impl DownloadListener for Recorder {
    fn on_complete(&self) {
        self.log
            .lock()
            .unwrap()
            .push(format!("complete:{}", self.label));
    }

    fn on_error(&self, error: DownloadError) {
        self.log
            .lock()
            .unwrap()
            .push(format!("error:{}:{}", self.label, error));
    }
}

/// Manager wired to a manual executor, inline delivery, and a recording
/// cleaner, so every event is observable and synchronous.
pub fn manager_with(limit: usize) -> (DownloadManager, Arc<ManualExecutor>, Arc<RecordingCleaner>) {
    let executor = Arc::new(ManualExecutor::default());
    let cleaner = Arc::new(RecordingCleaner::default());
    let mut cfg = RdmConfig::default();
    cfg.running_limit = limit;
    let manager = DownloadManager::with_collaborators(
        cfg,
        executor.clone(),
        Arc::new(InlineDelivery),
        cleaner.clone(),
    );
    (manager, executor, cleaner)
}

/// Request for a unique test URL under a fixed destination dir.
pub fn request(manager: &DownloadManager, name: &str) -> Arc<DownloadRequest> {
    manager
        .download(format!("http://test.invalid/{name}"), "/tmp/rdm-test")
        .build()
}
