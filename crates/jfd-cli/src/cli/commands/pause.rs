//! `jfd pause` – hold the running download at its current chunk.

use anyhow::Result;
use jfd_core::control::ControlRequest;

pub async fn run_pause() -> Result<()> {
    super::send_flag(ControlRequest::Pause).await
}
