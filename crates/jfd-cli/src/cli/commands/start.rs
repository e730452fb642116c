//! `jfd start <url>` – hand a series to the running service.

use anyhow::Result;
use jfd_core::control::{ControlReply, ControlRequest};

use crate::cli::control_socket;

pub async fn run_start(url: &str, subdir: &str) -> Result<()> {
    let request = ControlRequest::Start {
        url: url.to_string(),
        subdir: subdir.to_string(),
    };
    match control_socket::request(&request).await? {
        ControlReply::Started(receipt) if receipt.accepted => {
            println!("Downloading into {}", receipt.effective_directory.display());
            if receipt.paused {
                println!("Outside the download window; transfers will wait for it.");
            }
            Ok(())
        }
        ControlReply::Started(receipt) => anyhow::bail!(
            "start rejected: {}",
            receipt.reason.unwrap_or_else(|| "unknown reason".to_string())
        ),
        ControlReply::Error { message } => anyhow::bail!(message),
        other => anyhow::bail!("unexpected reply: {:?}", other),
    }
}
