//! `rdm get <url>...` – download URLs through the bounded queue.

use anyhow::Result;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use rdm_core::config::RdmConfig;
use rdm_core::error::DownloadError;
use rdm_core::manager::DownloadManager;
use rdm_core::request::DownloadListener;
use rdm_core::types::DownloadId;

/// Completion listener that reports each download back to the command loop.
struct Done {
    url: String,
    tx: tokio::sync::mpsc::UnboundedSender<(String, Result<(), DownloadError>)>,
}

impl DownloadListener for Done {
    fn on_complete(&self) {
        let _ = self.tx.send((self.url.clone(), Ok(())));
    }

    fn on_error(&self, error: DownloadError) {
        let _ = self.tx.send((self.url.clone(), Err(error)));
    }
}

pub async fn run_get(
    mut cfg: RdmConfig,
    urls: Vec<String>,
    dir: PathBuf,
    jobs: Option<usize>,
) -> Result<()> {
    if let Some(jobs) = jobs {
        cfg.running_limit = jobs;
    }
    let manager = DownloadManager::new(cfg);
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let mut seen: HashSet<DownloadId> = HashSet::new();
    let mut pending = 0usize;
    for url in urls {
        let request = manager.download(url.as_str(), &dir).build();
        if !seen.insert(request.id()) {
            println!("skipping duplicate: {url}");
            continue;
        }
        request.add_download_listener(Arc::new(Done {
            url: url.clone(),
            tx: tx.clone(),
        }));
        {
            let url = url.clone();
            request.add_on_start_or_resume(move || tracing::info!("started {}", url));
        }
        manager.enqueue(request);
        pending += 1;
    }
    drop(tx);

    let mut failed = 0usize;
    while pending > 0 {
        let Some((url, result)) = rx.recv().await else {
            break;
        };
        pending -= 1;
        match result {
            Ok(()) => println!("done: {url}"),
            Err(error) => {
                failed += 1;
                eprintln!("failed: {url}: {error}");
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} download(s) failed", failed);
    }
    Ok(())
}
