//! `jfd status` – show the current download.

use anyhow::Result;
use jfd_core::control::{ControlReply, ControlRequest};
use jfd_core::session::StatusSnapshot;

use crate::cli::control_socket;

pub async fn run_status(json: bool) -> Result<()> {
    match control_socket::request(&ControlRequest::Status).await? {
        ControlReply::Status(snapshot) if json => {
            print!("{}", ControlReply::Status(snapshot).to_line());
        }
        ControlReply::Status(snapshot) => print_status(&snapshot),
        ControlReply::Error { message } => anyhow::bail!(message),
        other => anyhow::bail!("unexpected reply: {:?}", other),
    }
    Ok(())
}

fn print_status(s: &StatusSnapshot) {
    println!("{:<10} {}", "STATE", state_label(s));
    println!("{:<10} {}", "SHOW", or_dash(&s.current_target.show_name));
    println!("{:<10} {}", "SEASON", or_dash(&s.current_target.season_label));
    println!("{:<10} {}", "EPISODE", or_dash(&s.current_target.episode_name));
    println!("{:<10} {}/{}", "EPISODES", s.completed_items, s.total_items);
    println!("{:<10} {:.1}%", "FILE", s.current_file_fraction * 100.0);
    if let Some(err) = &s.error {
        println!("{:<10} {:?}: {}", "ERROR", err.kind, err.message);
    }
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

/// Phase name, with `paused` appended while a transfer is held.
pub(crate) fn state_label(s: &StatusSnapshot) -> String {
    if s.control.paused && !s.phase.is_terminal() {
        format!("{} (paused)", s.phase.as_str())
    } else {
        s.phase.as_str().to_string()
    }
}

/// One-line progress summary used by `jfd fetch`.
pub(crate) fn progress_line(s: &StatusSnapshot) -> String {
    let target = [
        s.current_target.show_name.as_str(),
        s.current_target.season_label.as_str(),
        s.current_target.episode_name.as_str(),
    ]
    .iter()
    .filter(|p| !p.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join(" / ");
    format!(
        "[{}] {}/{} episodes  file {:.1}%  {}",
        state_label(s),
        s.completed_items,
        s.total_items,
        s.current_file_fraction * 100.0,
        target
    )
    .trim_end()
    .to_string()
}
