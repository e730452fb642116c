//! `jfd resume` – continue a paused download.
//!
//! Outside the download window the service pauses it again on its next window check.

use anyhow::Result;
use jfd_core::control::ControlRequest;

pub async fn run_resume() -> Result<()> {
    super::send_flag(ControlRequest::Resume).await
}
