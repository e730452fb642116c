//! Control protocol between a running `jfd serve` and its clients.
//!
//! Requests are single text lines: `start <url> [subdir]`, `pause`, `resume`,
//! `abort` or `status`. Every request gets exactly one reply line holding a JSON
//! `ControlReply`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::orchestrator::{DownloadManager, StartReceipt};
use crate::session::StatusSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlRequest {
    Start { url: String, subdir: String },
    Pause,
    Resume,
    Abort,
    Status,
}

impl ControlRequest {
    /// Parses one request line. Keywords are case-insensitive; the subdir is the
    /// rest of the line after the URL and may contain spaces.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((k, r)) => (k, r.trim()),
            None => (line, ""),
        };
        let no_args = |req: ControlRequest| {
            if rest.is_empty() {
                Ok(req)
            } else {
                Err(format!("{} takes no arguments", keyword))
            }
        };
        match keyword.to_ascii_lowercase().as_str() {
            "start" => {
                let (url, subdir) = match rest.split_once(char::is_whitespace) {
                    Some((u, s)) => (u, s.trim()),
                    None => (rest, ""),
                };
                if url.is_empty() {
                    return Err("start requires a URL".into());
                }
                Ok(ControlRequest::Start {
                    url: url.to_string(),
                    subdir: subdir.to_string(),
                })
            }
            "pause" => no_args(ControlRequest::Pause),
            "resume" => no_args(ControlRequest::Resume),
            "abort" => no_args(ControlRequest::Abort),
            "status" => no_args(ControlRequest::Status),
            "" => Err("empty request".into()),
            other => Err(format!("unknown command: {}", other)),
        }
    }

    /// Wire form, newline-terminated.
    pub fn to_line(&self) -> String {
        match self {
            ControlRequest::Start { url, subdir } if subdir.is_empty() => {
                format!("start {}\n", url)
            }
            ControlRequest::Start { url, subdir } => format!("start {} {}\n", url, subdir),
            ControlRequest::Pause => "pause\n".into(),
            ControlRequest::Resume => "resume\n".into(),
            ControlRequest::Abort => "abort\n".into(),
            ControlRequest::Status => "status\n".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum ControlReply {
    Ack { message: String },
    Started(StartReceipt),
    Status(StatusSnapshot),
    Error { message: String },
}

impl ControlReply {
    pub fn to_line(&self) -> String {
        match serde_json::to_string(self) {
            Ok(mut s) => {
                s.push('\n');
                s
            }
            Err(e) => format!(
                "{{\"reply\":\"error\",\"message\":\"encode reply: {}\"}}\n",
                e.to_string().replace('"', "'")
            ),
        }
    }

    pub fn from_line(line: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(line.trim())?)
    }
}

/// Applies one request to the manager.
pub fn dispatch(manager: &DownloadManager, request: ControlRequest) -> ControlReply {
    match request {
        ControlRequest::Start { url, subdir } => ControlReply::Started(manager.start(&url, &subdir)),
        ControlRequest::Pause => {
            manager.pause();
            ControlReply::Ack {
                message: "paused".into(),
            }
        }
        ControlRequest::Resume => {
            manager.resume();
            ControlReply::Ack {
                message: "resumed".into(),
            }
        }
        ControlRequest::Abort => {
            manager.abort();
            ControlReply::Ack {
                message: "abort requested".into(),
            }
        }
        ControlRequest::Status => ControlReply::Status(manager.status()),
    }
}

/// Parses and applies one raw line; parse failures become an `Error` reply.
pub fn handle_line(manager: &DownloadManager, line: &str) -> ControlReply {
    match ControlRequest::parse(line) {
        Ok(request) => dispatch(manager, request),
        Err(message) => {
            tracing::debug!(line, "bad control request: {}", message);
            ControlReply::Error { message }
        }
    }
}

/// Default path for the control socket (XDG state dir, next to the log).
pub fn default_control_socket_path() -> std::io::Result<PathBuf> {
    let dir = xdg::BaseDirectories::with_prefix("jfd")?.get_state_home();
    Ok(dir.join("control.sock"))
}
