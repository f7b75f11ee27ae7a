//! Transfer targets for published build files.
//!
//! Both targets implement [`TransferTarget`] (connect, upload one file,
//! close) so the publisher drives them the same way:
//!
//! - [`ObjectStorageTarget`]: stateless S3-compatible puts.
//! - [`RemoteServerTarget`]: one FTP or SFTP session, owned by a blocking
//!   worker that executes uploads strictly one at a time.

mod error;
mod object_storage;
pub mod server;
mod target;
mod validation;

pub use error::TransferError;
pub use object_storage::{DEFAULT_MULTIPART_THRESHOLD, ObjectStorageTarget, storage_endpoint};
pub use server::{RemoteServerTarget, ServerSession, SessionOpener, SessionState};
pub use target::{TargetKind, TransferFuture, TransferTarget};
pub use validation::validate_remote_path;
