//! Streams one remote file to local storage, chunk by chunk.
//!
//! After each received chunk the session is consulted: an abort stops the
//! transfer and leaves the partial file; a pause holds the chunk (the stream is
//! not consumed further) and polls until resumed or aborted. Abort wins over pause.

use std::cell::{Cell, RefCell};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::str;
use std::time::Duration;

use crate::catalog::TOKEN_HEADER;
use crate::config::{JfdConfig, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};
use crate::error::FetchError;
use crate::session::SessionState;

/// How a transfer that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Whole body written.
    Completed { bytes: u64 },
    /// Stopped by an abort request; `bytes` were written before stopping.
    Aborted { bytes: u64 },
}

#[derive(Debug, Clone)]
pub struct TransferEngine {
    token: String,
    chunk_size: usize,
    pause_poll: Duration,
    connect_timeout: Duration,
}

fn failed(url: &str, e: impl std::fmt::Display) -> FetchError {
    FetchError::TransferFailed(format!("GET {}: {}", url, e))
}

/// Blocks while the session is paused. Returns false if it was aborted.
fn wait_while_paused(session: &SessionState, poll: Duration) -> bool {
    let mut logged = false;
    loop {
        if session.is_aborted() {
            return false;
        }
        if !session.is_paused() {
            if logged {
                tracing::debug!("transfer resumed");
            }
            return true;
        }
        if !logged {
            tracing::debug!("transfer paused");
            logged = true;
        }
        std::thread::sleep(poll);
    }
}

/// Parses one raw header line; a status line resets the per-response state
/// (redirects produce several header blocks).
fn observe_header(line: &[u8], status: &Cell<u32>, content_length: &Cell<Option<u64>>) {
    let Ok(line) = str::from_utf8(line) else {
        return;
    };
    let line = line.trim_end();
    if line.starts_with("HTTP/") {
        let code = line
            .split_whitespace()
            .nth(1)
            .and_then(|c| c.parse::<u32>().ok())
            .unwrap_or(0);
        status.set(code);
        content_length.set(None);
    } else if let Some((name, value)) = line.split_once(':') {
        if name.trim().eq_ignore_ascii_case("content-length") {
            content_length.set(value.trim().parse::<u64>().ok());
        }
    }
}

impl TransferEngine {
    pub fn new(
        token: &str,
        chunk_size: usize,
        pause_poll: Duration,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            token: token.to_string(),
            chunk_size: chunk_size.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE),
            pause_poll,
            connect_timeout,
        }
    }

    pub fn from_config(cfg: &JfdConfig) -> Self {
        Self::new(
            &cfg.api_token,
            cfg.transfer.chunk_size,
            cfg.transfer.pause_poll(),
            cfg.transfer.connect_timeout(),
        )
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Downloads `url` into a new file at `destination`, creating parent directories.
    ///
    /// Progress is published to `session` as bytes written over `Content-Length`
    /// (0 when the length is not advertised). A non-2xx status, transport error,
    /// local write error or a body shorter than advertised is `TransferFailed`.
    /// No overall timeout is set: a pause may hold the connection for hours.
    pub fn transfer(
        &self,
        url: &str,
        destination: &Path,
        session: &SessionState,
    ) -> Result<TransferOutcome, FetchError> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                failed(url, format!("create directory {}: {}", parent.display(), e))
            })?;
        }
        let mut file = File::create(destination)
            .map_err(|e| failed(url, format!("create {}: {}", destination.display(), e)))?;
        tracing::debug!(url, path = %destination.display(), "transfer started");

        let status = Cell::new(0u32);
        let content_length = Cell::new(None::<u64>);
        let written = Cell::new(0u64);
        let stopped_by_abort = Cell::new(false);
        let write_error = RefCell::new(None::<std::io::Error>);

        let mut easy = curl::easy::Easy::new();
        easy.url(url).map_err(|e| failed(url, e))?;
        easy.get(true).map_err(|e| failed(url, e))?;
        easy.follow_location(true).map_err(|e| failed(url, e))?;
        easy.max_redirections(10).map_err(|e| failed(url, e))?;
        easy.connect_timeout(self.connect_timeout)
            .map_err(|e| failed(url, e))?;
        easy.buffer_size(self.chunk_size)
            .map_err(|e| failed(url, e))?;
        easy.progress(true).map_err(|e| failed(url, e))?;

        let mut list = curl::easy::List::new();
        list.append(&format!("{}: {}", TOKEN_HEADER, self.token.trim()))
            .map_err(|e| failed(url, e))?;
        easy.http_headers(list).map_err(|e| failed(url, e))?;

        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    observe_header(data, &status, &content_length);
                    true
                })
                .map_err(|e| failed(url, e))?;
            transfer
                .write_function(|data| {
                    // Error and redirect bodies are not part of the file.
                    if !(200..300).contains(&status.get()) {
                        return Ok(data.len());
                    }
                    if !wait_while_paused(session, self.pause_poll) {
                        stopped_by_abort.set(true);
                        return Ok(0);
                    }
                    if let Err(e) = file.write_all(data) {
                        *write_error.borrow_mut() = Some(e);
                        return Ok(0);
                    }
                    let done = written.get() + data.len() as u64;
                    written.set(done);
                    session.record_file_progress(done, content_length.get());
                    Ok(data.len())
                })
                .map_err(|e| failed(url, e))?;
            // Lets an abort interrupt a stalled connection between chunks.
            transfer
                .progress_function(|_, _, _, _| {
                    if session.is_aborted() {
                        stopped_by_abort.set(true);
                        return false;
                    }
                    true
                })
                .map_err(|e| failed(url, e))?;
            transfer.perform()
        };

        let bytes = written.get();
        if stopped_by_abort.get() {
            tracing::info!(url, bytes, "transfer aborted; partial file left on disk");
            return Ok(TransferOutcome::Aborted { bytes });
        }
        if let Some(e) = write_error.borrow_mut().take() {
            return Err(failed(
                url,
                format!("write {}: {}", destination.display(), e),
            ));
        }
        if let Err(e) = performed {
            tracing::error!(url, bytes, "transfer failed: {}", e);
            return Err(failed(url, e));
        }

        let code = easy.response_code().map_err(|e| failed(url, e))?;
        if !(200..300).contains(&code) {
            tracing::error!(url, code, "transfer returned error status");
            return Err(failed(url, format!("HTTP {}", code)));
        }
        if let Some(expected) = content_length.get() {
            if bytes != expected {
                return Err(failed(
                    url,
                    format!("partial transfer: wrote {} of {} bytes", bytes, expected),
                ));
            }
        }
        file.flush()
            .map_err(|e| failed(url, format!("flush {}: {}", destination.display(), e)))?;

        tracing::debug!(url, bytes, "transfer completed");
        Ok(TransferOutcome::Completed { bytes })
    }
}
