//! `jfd abort` – stop the running download.

use anyhow::Result;
use jfd_core::control::ControlRequest;

pub async fn run_abort() -> Result<()> {
    super::send_flag(ControlRequest::Abort).await
}
