use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Process-wide defaults loaded from `~/.config/rdm/config.toml`.
///
/// Every field can be overridden per request through the builder; these
/// values apply when a request leaves the corresponding option unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RdmConfig {
    /// Maximum number of concurrently running downloads.
    pub running_limit: usize,
    /// Default connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Default read timeout in seconds: a transfer stalled for longer
    /// than this is treated as failed.
    pub read_timeout_secs: u64,
    /// Default User-Agent header.
    pub user_agent: String,
}

impl Default for RdmConfig {
    fn default() -> Self {
        Self {
            running_limit: 3,
            connect_timeout_secs: 20,
            read_timeout_secs: 20,
            user_agent: "rdm/0.1".to_string(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rdm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<RdmConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = RdmConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: RdmConfig = toml::from_str(&data)?;
    Ok(cfg)
}
