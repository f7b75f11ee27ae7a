//! Blocking session seam between the target and a protocol library.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use sitepub_config::RemoteServerConfig;

use crate::error::TransferError;

/// Opens protocol sessions. Called on the worker thread.
pub trait SessionOpener: Send + Sync + 'static {
    /// Connects and authenticates. Returning `Ok` is the ready signal.
    fn open(
        &self,
        server: &RemoteServerConfig,
        timeout: Duration,
    ) -> Result<Box<dyn ServerSession>, TransferError>;
}

/// An authenticated session. Never leaves the worker thread, so it need
/// not be `Send`.
pub trait ServerSession {
    /// Ensures a single directory exists; its parent already does.
    fn make_dir(&mut self, dir: &str) -> Result<(), TransferError>;

    /// Streams `local` to `remote`, returning the bytes written.
    fn put(&mut self, remote: &str, local: &Path) -> Result<u64, TransferError>;

    /// Ends the session.
    fn quit(&mut self) -> Result<(), TransferError>;
}

/// Resolves `host:port` to the first socket address.
pub(crate) fn resolve_addr(server: &RemoteServerConfig) -> Result<SocketAddr, TransferError> {
    (server.host.as_str(), server.port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| TransferError::Session(format!("cannot resolve {}", server.address())))
}

/// Every directory that must exist before `remote_path` can be written,
/// outermost first. `/var/www/a/b.html` gives `/var`, `/var/www`, `/var/www/a`.
pub(crate) fn parent_dirs(remote_path: &str) -> Vec<String> {
    let Some((parent, _)) = remote_path.rsplit_once('/') else {
        return Vec::new();
    };

    let absolute = parent.starts_with('/');
    let mut dirs = Vec::new();
    let mut acc = String::new();
    for part in parent.split('/').filter(|p| !p.is_empty() && *p != ".") {
        if !acc.is_empty() || absolute {
            acc.push('/');
        }
        acc.push_str(part);
        dirs.push(acc.clone());
    }
    dirs
}
