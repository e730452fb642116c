//! `jfd serve` – run the download service behind the control socket.

use anyhow::Result;
use jfd_core::config::JfdConfig;
use jfd_core::orchestrator::DownloadManager;
use std::sync::Arc;

use crate::cli::control_socket;

pub async fn run_serve(cfg: &JfdConfig) -> Result<()> {
    let manager = Arc::new(DownloadManager::from_config(cfg)?);
    let socket_path = jfd_core::control::default_control_socket_path()?;
    let listener = control_socket::spawn_control_listener(Arc::clone(&manager), &socket_path)?;
    tracing::info!(path = %socket_path.display(), "control socket listening");
    println!(
        "jfd serving on {} (media root {}, window {:02}:00-{:02}:00)",
        socket_path.display(),
        manager.media_root().display(),
        cfg.window.start_hour,
        cfg.window.end_hour
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");
    listener.abort();
    manager.abort();
    let waiter = Arc::clone(&manager);
    if let Some(phase) = tokio::task::spawn_blocking(move || waiter.wait()).await? {
        tracing::info!(phase = phase.as_str(), "last run ended");
    }
    let _ = std::fs::remove_file(&socket_path);
    Ok(())
}
