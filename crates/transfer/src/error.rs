use std::time::Duration;

use crate::server::SessionState;

/// Errors produced by transfer targets.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object storage error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("FTP error: {0}")]
    Ftp(#[from] suppaftp::FtpError),

    #[error("SSH error: {0}")]
    Ssh(#[from] ssh2::Error),

    #[error("session error: {0}")]
    Session(String),

    #[error("no ready signal within {0:?}")]
    Timeout(Duration),

    #[error("session closed unexpectedly")]
    Closed,

    #[error("session not ready ({0:?})")]
    NotReady(SessionState),

    #[error("invalid remote path: {0}")]
    InvalidPath(String),
}
