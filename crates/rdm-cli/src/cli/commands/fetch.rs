//! `rdm fetch <url>` – blocking single download, bypassing the queue.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use rdm_core::config::RdmConfig;
use rdm_core::executor::TransferOutcome;
use rdm_core::manager::DownloadManager;

pub async fn run_fetch(cfg: RdmConfig, url: String, dir: PathBuf) -> Result<()> {
    let manager = DownloadManager::new(cfg);
    let request = manager.download(url.as_str(), &dir).build();
    let target = request.target_path();

    // The synchronous call blocks for the whole transfer; keep it off the
    // async workers.
    let outcome = {
        let manager = manager.clone();
        let request = Arc::clone(&request);
        tokio::task::spawn_blocking(move || manager.execute_sync(&request)).await?
    };

    match outcome {
        TransferOutcome::Completed => {
            println!("saved: {}", target.display());
            Ok(())
        }
        TransferOutcome::Failed(error) => anyhow::bail!("{}: {}", url, error),
        TransferOutcome::Interrupted => anyhow::bail!("{}: interrupted", url),
    }
}
