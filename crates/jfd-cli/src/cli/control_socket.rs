//! Control socket: server (during `jfd serve`) and client (for `jfd pause` etc.).
//! Protocol: one request line in, one JSON reply line out.

use anyhow::{Context, Result};
use jfd_core::control::{self, ControlReply, ControlRequest};
use jfd_core::orchestrator::DownloadManager;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

/// Removes a socket file left behind by a dead process. Fails if another
/// instance still accepts connections on it.
fn clear_stale_socket(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    if std::os::unix::net::UnixStream::connect(path).is_ok() {
        anyhow::bail!(
            "another jfd instance owns the control socket {}",
            path.display()
        );
    }
    tracing::debug!(path = %path.display(), "removing stale control socket");
    std::fs::remove_file(path)
        .with_context(|| format!("remove stale socket {}", path.display()))
}

/// Binds `path` (replacing a stale socket file) and spawns a task that answers
/// every request line through `control::handle_line`.
pub fn spawn_control_listener(
    manager: Arc<DownloadManager>,
    path: impl AsRef<Path>,
) -> Result<tokio::task::JoinHandle<()>> {
    let path = path.as_ref().to_path_buf();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create socket dir {}", dir.display()))?;
    }
    clear_stale_socket(&path)?;
    let listener = UnixListener::bind(&path)
        .with_context(|| format!("bind control socket {}", path.display()))?;

    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let manager = Arc::clone(&manager);
                    tokio::spawn(async move {
                        let (read, mut write) = stream.into_split();
                        let mut lines = BufReader::new(read).lines();
                        while let Ok(Some(line)) = lines.next_line().await {
                            if line.trim().is_empty() {
                                continue;
                            }
                            let reply = control::handle_line(&manager, &line);
                            if let Err(e) = write.write_all(reply.to_line().as_bytes()).await {
                                tracing::debug!("control socket write: {}", e);
                                break;
                            }
                        }
                    });
                }
                Err(e) => tracing::debug!("control socket accept: {}", e),
            }
        }
    });
    Ok(handle)
}

/// Sends one request and waits for its reply.
pub async fn send_request(socket_path: &Path, request: &ControlRequest) -> Result<ControlReply> {
    if !socket_path.exists() {
        anyhow::bail!(
            "no running `jfd serve` (control socket {} not found)",
            socket_path.display()
        );
    }
    let stream = UnixStream::connect(socket_path)
        .await
        .with_context(|| format!("connect {}", socket_path.display()))?;
    let (read, mut write) = stream.into_split();
    write.write_all(request.to_line().as_bytes()).await?;

    let mut line = String::new();
    let n = BufReader::new(read).read_line(&mut line).await?;
    if n == 0 {
        anyhow::bail!("control socket closed without a reply");
    }
    ControlReply::from_line(&line)
}

/// `send_request` on the default socket path.
pub async fn request(request: &ControlRequest) -> Result<ControlReply> {
    let path = control::default_control_socket_path()?;
    send_request(&path, request).await
}
