//! The capability set shared by every transfer target.

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use sitepub_config::Protocol;

use crate::error::TransferError;

/// Boxed future returned by [`TransferTarget`] operations.
pub type TransferFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransferError>> + Send + 'a>>;

/// Identity of a target, used in events, logs and failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    ObjectStorage,
    RemoteServer(Protocol),
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ObjectStorage => f.write_str("object storage"),
            Self::RemoteServer(protocol) => write!(f, "{protocol} server"),
        }
    }
}

/// A remote destination for build files.
///
/// The publisher owns each target exclusively for one run and calls the
/// operations in order: `connect`, any number of `upload_file`, `close`.
/// Implementations must tolerate `close` being called more than once.
pub trait TransferTarget: Send {
    fn kind(&self) -> TargetKind;

    /// Makes the target ready for uploads.
    fn connect(&mut self) -> TransferFuture<'_, ()>;

    /// Uploads one local file to `remote_path`, overwriting any existing copy.
    fn upload_file<'a>(&'a mut self, remote_path: &'a str, local_path: &'a Path)
    -> TransferFuture<'a, ()>;

    /// Releases the connection.
    fn close(&mut self) -> TransferFuture<'_, ()>;
}
