//! CLI command handlers. Each command is in its own file.

mod abort;
mod fetch;
mod pause;
mod resume;
mod serve;
mod start;
mod status;

pub use abort::run_abort;
pub use fetch::run_fetch;
pub use pause::run_pause;
pub use resume::run_resume;
pub use serve::run_serve;
pub use start::run_start;
pub use status::run_status;

use anyhow::Result;
use jfd_core::control::{ControlReply, ControlRequest};

use crate::cli::control_socket;

/// Sends a flag request (pause/resume/abort) and prints the acknowledgement.
async fn send_flag(request: ControlRequest) -> Result<()> {
    match control_socket::request(&request).await? {
        ControlReply::Ack { message } => {
            println!("{}", message);
            Ok(())
        }
        ControlReply::Error { message } => anyhow::bail!(message),
        other => anyhow::bail!("unexpected reply: {:?}", other),
    }
}
