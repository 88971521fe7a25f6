//! Default transfer executor built on the curl crate (libcurl).
//!
//! Writes to a `.part` file next to the destination and resumes from its
//! length with a `Range` request. Transfers run on blocking threads via
//! `tokio::task::spawn_blocking`; the synchronous path runs on the
//! calling thread.

use std::cell::Cell;
use std::fs;
use std::io::Write;
use std::str;
use std::sync::Arc;

use crate::error::DownloadError;
use crate::executor::{TransferExecutor, TransferHandle, TransferOutcome};
use crate::request::DownloadRequest;
use crate::types::Status;

/// Curl-backed [`TransferExecutor`].
#[derive(Clone)]
pub struct CurlDownloader {
    runtime: tokio::runtime::Handle,
}

impl CurlDownloader {
    /// Captures the current tokio runtime for transfer threads. Must be
    /// called from within a runtime.
    pub fn new() -> Self {
        Self {
            runtime: tokio::runtime::Handle::current(),
        }
    }

    pub fn with_handle(runtime: tokio::runtime::Handle) -> Self {
        Self { runtime }
    }
}

impl Default for CurlDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferExecutor for CurlDownloader {
    fn start(&self, request: Arc<DownloadRequest>, handle: TransferHandle) {
        self.runtime.spawn_blocking(move || {
            let outcome = transfer(&request, Some(&handle));
            request.on_transfer_done(outcome);
        });
    }

    fn run(&self, request: &DownloadRequest) -> TransferOutcome {
        transfer(request, None)
    }
}

fn transfer(request: &DownloadRequest, handle: Option<&TransferHandle>) -> TransferOutcome {
    // Cancelled before the transfer thread picked it up: nothing to do.
    let interrupted = handle.map(TransferHandle::is_interrupted).unwrap_or(false);
    if request.status() == Status::Cancelled || interrupted {
        return TransferOutcome::Interrupted;
    }
    match run_curl(request, handle) {
        Ok(()) => TransferOutcome::Completed,
        Err(error) => {
            if handle.map(TransferHandle::is_interrupted).unwrap_or(false) {
                // The write loop aborted on purpose; the partial artifact
                // stays on disk for resume.
                TransferOutcome::Interrupted
            } else {
                TransferOutcome::Failed(error)
            }
        }
    }
}

fn run_curl(
    request: &DownloadRequest,
    handle: Option<&TransferHandle>,
) -> Result<(), DownloadError> {
    fs::create_dir_all(request.dir_path()).map_err(DownloadError::storage)?;

    let target = request.target_path();
    let temp = request.temp_path();
    let offset = fs::metadata(&temp).map(|m| m.len()).unwrap_or(0);
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&temp)
        .map_err(DownloadError::storage)?;
    request.set_downloaded(offset);

    let mut easy = curl::easy::Easy::new();
    easy.url(request.url()).map_err(DownloadError::connection)?;
    easy.follow_location(true).map_err(DownloadError::connection)?;
    easy.max_redirections(10).map_err(DownloadError::connection)?;
    easy.connect_timeout(request.connect_timeout())
        .map_err(DownloadError::connection)?;
    easy.low_speed_limit(1).map_err(DownloadError::connection)?;
    easy.low_speed_time(request.read_timeout())
        .map_err(DownloadError::connection)?;
    easy.useragent(request.user_agent())
        .map_err(DownloadError::connection)?;
    if offset > 0 {
        easy.range(&format!("{}-", offset))
            .map_err(DownloadError::connection)?;
    }

    let mut list = curl::easy::List::new();
    for (name, value) in request.headers() {
        list.append(&format!("{}: {}", name.trim(), value.trim()))
            .map_err(DownloadError::connection)?;
    }
    if !request.headers().is_empty() {
        easy.http_headers(list).map_err(DownloadError::connection)?;
    }

    // Shared between the header and write callbacks.
    let status_206 = Cell::new(false);
    let content_length = Cell::new(None::<u64>);
    let pos = Cell::new(offset);
    let first_chunk = Cell::new(true);
    let io_error = Cell::new(None::<std::io::Error>);

    {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(line) = str::from_utf8(data) {
                    let line = line.trim();
                    if let Some(rest) = line.strip_prefix("HTTP/") {
                        // New hop: forget the previous hop's headers.
                        content_length.set(None);
                        let code = rest
                            .split_whitespace()
                            .nth(1)
                            .and_then(|c| c.parse::<u32>().ok());
                        status_206.set(code == Some(206));
                    } else if let Some((name, value)) = line.split_once(':') {
                        if name.trim().eq_ignore_ascii_case("content-length") {
                            content_length.set(value.trim().parse::<u64>().ok());
                        }
                    }
                }
                true
            })
            .map_err(DownloadError::connection)?;

        transfer
            .write_function(|data| {
                if let Some(handle) = handle {
                    if handle.is_interrupted() {
                        return Ok(0); // abort transfer
                    }
                }
                if first_chunk.get() {
                    first_chunk.set(false);
                    // Server ignored the Range request: restart from zero
                    // instead of appending a second copy.
                    if pos.get() > 0 && !status_206.get() {
                        if let Err(e) = file.set_len(0) {
                            io_error.set(Some(e));
                            return Ok(0);
                        }
                        pos.set(0);
                        request.set_downloaded(0);
                    }
                    if let Some(len) = content_length.get() {
                        request.set_total(pos.get() + len);
                    }
                }
                match (&file).write_all(data) {
                    Ok(()) => {
                        pos.set(pos.get() + data.len() as u64);
                        request.set_downloaded(pos.get());
                        request.report_progress();
                        Ok(data.len())
                    }
                    Err(e) => {
                        tracing::warn!("download write failed: {}", e);
                        io_error.set(Some(e));
                        Ok(0)
                    }
                }
            })
            .map_err(DownloadError::connection)?;

        if let Err(e) = transfer.perform() {
            if let Some(io_err) = io_error.take() {
                return Err(DownloadError::storage(io_err));
            }
            return Err(DownloadError::connection(e));
        }
    }

    let code = easy.response_code().map_err(DownloadError::connection)?;
    if !(200..300).contains(&code) {
        return Err(DownloadError::Http(code));
    }

    file.sync_all().map_err(DownloadError::storage)?;
    drop(file);

    let expected = request.progress().total_bytes;
    let received = pos.get();
    if expected > 0 && received != expected {
        return Err(DownloadError::Partial { expected, received });
    }

    fs::rename(&temp, &target).map_err(DownloadError::storage)?;
    tracing::debug!(id = request.id(), path = %target.display(), "transfer finished");
    Ok(())
}
