//! Error taxonomy shared by the catalog client, the transfer engine and the orchestrator.
//!
//! Every failure a run can hit maps to one `FetchError`; the orchestrator turns it
//! into a terminal `Failed` session with an `ErrorReport` instead of unwinding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Typed failure of a catalog call or a transfer.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Remote call failed at the transport level or returned an error status.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
    /// An expected field or resource is absent (no users, no media source path).
    #[error("not found: {0}")]
    NotFound(String),
    /// The catalog URL did not carry a container id.
    #[error("malformed input: {0}")]
    MalformedInput(String),
    /// Stream error, non-2xx status or local write error during a download.
    #[error("transfer failed: {0}")]
    TransferFailed(String),
    /// Local resource failure outside a transfer (e.g. a worker thread could not start).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Serializable discriminant of `FetchError`, reported through session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unavailable,
    NotFound,
    MalformedInput,
    TransferFailed,
    Internal,
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Unavailable(_) => ErrorKind::Unavailable,
            FetchError::NotFound(_) => ErrorKind::NotFound,
            FetchError::MalformedInput(_) => ErrorKind::MalformedInput,
            FetchError::TransferFailed(_) => ErrorKind::TransferFailed,
            FetchError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Terminal error as exposed to status readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&FetchError> for ErrorReport {
    fn from(e: &FetchError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_carries_kind_and_message() {
        let e = FetchError::MalformedInput("no id in fragment".into());
        let report = ErrorReport::from(&e);
        assert_eq!(report.kind, ErrorKind::MalformedInput);
        assert_eq!(report.message, "malformed input: no id in fragment");
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::TransferFailed).unwrap();
        assert_eq!(json, "\"transfer_failed\"");
    }
}
