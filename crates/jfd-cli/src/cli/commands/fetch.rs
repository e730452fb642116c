//! `jfd fetch <url>` – download a series in the foreground with a progress line.

use anyhow::Result;
use jfd_core::config::JfdConfig;
use jfd_core::orchestrator::DownloadManager;
use jfd_core::session::RunPhase;
use std::sync::Arc;
use std::time::Duration;

use super::status::progress_line;
use crate::cli::control_socket;

const PROGRESS_INTERVAL_MS: u64 = 500;

pub async fn run_fetch(cfg: &JfdConfig, url: &str, subdir: &str) -> Result<()> {
    let manager = Arc::new(DownloadManager::from_config(cfg)?);
    // Lets `jfd pause`/`resume`/`abort` reach this foreground run too. A live
    // `jfd serve` owning the socket means another session is running: refuse.
    let socket_path = jfd_core::control::default_control_socket_path().ok();
    let listener = match &socket_path {
        Some(path) => {
            let handle = control_socket::spawn_control_listener(Arc::clone(&manager), path)?;
            tracing::debug!(path = %path.display(), "control socket listening");
            Some(handle)
        }
        None => {
            tracing::warn!("no state directory; control socket disabled");
            None
        }
    };

    let receipt = manager.start(url, subdir);
    if !receipt.accepted {
        anyhow::bail!(
            "start rejected: {}",
            receipt.reason.unwrap_or_else(|| "unknown reason".to_string())
        );
    }
    println!("Downloading into {}", receipt.effective_directory.display());
    if receipt.paused {
        println!("Outside the download window; transfers will wait for it.");
    }

    let mut ticker = tokio::time::interval(Duration::from_millis(PROGRESS_INTERVAL_MS));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let status = manager.status();
                print!("\r{}    ", progress_line(&status));
                let _ = std::io::Write::flush(&mut std::io::stdout());
                if status.phase.is_terminal() {
                    break;
                }
            }
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                println!();
                println!("Aborting...");
                manager.abort();
            }
        }
    }
    println!();

    let waiter = Arc::clone(&manager);
    let phase = tokio::task::spawn_blocking(move || waiter.wait()).await?;
    if let Some(handle) = listener {
        handle.abort();
        if let Some(path) = &socket_path {
            let _ = std::fs::remove_file(path);
        }
    }
    let status = manager.status();
    match phase {
        Some(RunPhase::Completed) => {
            println!("Downloaded {} episode(s).", status.completed_items);
            Ok(())
        }
        Some(RunPhase::Aborted) => {
            println!(
                "Aborted after {} of {} episode(s).",
                status.completed_items, status.total_items
            );
            Ok(())
        }
        _ => match status.error {
            Some(err) => anyhow::bail!("{:?}: {}", err.kind, err.message),
            None => anyhow::bail!("download did not complete"),
        },
    }
}
