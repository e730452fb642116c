use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::schedule::TimeWindow;

/// Smallest accepted transfer chunk.
pub const MIN_CHUNK_SIZE: usize = 4096;

/// Largest receive buffer libcurl accepts (`CURL_MAX_READ_SIZE`).
pub const MAX_CHUNK_SIZE: usize = 10 * 1024 * 1024;

/// What to do with the partially written file when a transfer is aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartialFilePolicy {
    #[default]
    Keep,
    Delete,
}

/// Transfer tuning (optional `[transfer]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Bytes requested per read from the stream (curl receive buffer).
    pub chunk_size: usize,
    /// How often a paused transfer re-checks the control flags, in seconds.
    pub pause_poll_secs: f64,
    /// TCP/TLS connect timeout for every remote call.
    pub connect_timeout_secs: u64,
    /// How often the timing loop re-evaluates the download window, in seconds.
    pub window_check_secs: f64,
    /// Keep or delete the partial file of an aborted transfer.
    pub partial_files: PartialFilePolicy,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: 8192,
            pause_poll_secs: 1.0,
            connect_timeout_secs: 30,
            window_check_secs: 60.0,
            partial_files: PartialFilePolicy::Keep,
        }
    }
}

impl TransferConfig {
    pub fn pause_poll(&self) -> Duration {
        Duration::from_secs_f64(self.pause_poll_secs)
    }

    pub fn window_check_interval(&self) -> Duration {
        Duration::from_secs_f64(self.window_check_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Global configuration loaded from `~/.config/jfd/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JfdConfig {
    /// Base URL of the catalog server, e.g. `https://jellyfin.example.com` (or `.../emby`).
    pub server_url: String,
    /// API token sent as `X-Emby-Token` and `api_key`.
    pub api_token: String,
    /// Root directory under which start requests choose a destination subpath.
    pub media_root: PathBuf,
    /// Daily hours during which transfers may run unpaused.
    pub window: TimeWindow,
    #[serde(default)]
    pub transfer: TransferConfig,
}

impl Default for JfdConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8096".to_string(),
            api_token: String::new(),
            media_root: PathBuf::from("/media"),
            window: TimeWindow::new(23, 5),
            transfer: TransferConfig::default(),
        }
    }
}

impl JfdConfig {
    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.server_url)
            .with_context(|| format!("invalid server_url: {}", self.server_url))?;
        if self.window.start_hour > 23 || self.window.end_hour > 23 {
            anyhow::bail!(
                "window hours must be 0-23 (got {}-{})",
                self.window.start_hour,
                self.window.end_hour
            );
        }
        if self.transfer.chunk_size < MIN_CHUNK_SIZE {
            anyhow::bail!(
                "transfer.chunk_size must be at least {} (got {})",
                MIN_CHUNK_SIZE,
                self.transfer.chunk_size
            );
        }
        if self.transfer.chunk_size > MAX_CHUNK_SIZE {
            anyhow::bail!(
                "transfer.chunk_size must be at most {} (got {})",
                MAX_CHUNK_SIZE,
                self.transfer.chunk_size
            );
        }
        for (name, secs) in [
            ("transfer.pause_poll_secs", self.transfer.pause_poll_secs),
            ("transfer.window_check_secs", self.transfer.window_check_secs),
        ] {
            if !secs.is_finite() || secs <= 0.0 {
                anyhow::bail!("{} must be a positive number of seconds", name);
            }
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("jfd")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load and validate configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<JfdConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: JfdConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<JfdConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = JfdConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from_path(&path)
}
