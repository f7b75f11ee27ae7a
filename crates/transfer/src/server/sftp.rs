//! SFTP sessions via `ssh2`.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::Path;
use std::time::Duration;

use sitepub_config::RemoteServerConfig;
use ssh2::{Session, Sftp};
use tracing::{debug, info};

use super::session::{ServerSession, SessionOpener, resolve_addr};
use crate::error::TransferError;

/// Permission bits for directories created on the server.
const DIR_MODE: i32 = 0o755;

/// Opens password-authenticated SFTP sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SftpOpener;

impl SessionOpener for SftpOpener {
    fn open(
        &self,
        server: &RemoteServerConfig,
        timeout: Duration,
    ) -> Result<Box<dyn ServerSession>, TransferError> {
        let addr = resolve_addr(server)?;
        debug!(%addr, "connecting to SFTP server");

        let tcp = TcpStream::connect_timeout(&addr, timeout)?;
        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        session.set_timeout(u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX));

        debug!(%addr, "session handshake");
        session.handshake()?;
        session.userauth_password(&server.user, &server.password)?;
        if !session.authenticated() {
            return Err(TransferError::Session(format!(
                "authentication to {addr} failed"
            )));
        }

        let sftp = session.sftp()?;
        info!(%addr, user = %server.user, "SFTP session established");
        Ok(Box::new(SftpSession { session, sftp }))
    }
}

struct SftpSession {
    session: Session,
    sftp: Sftp,
}

impl ServerSession for SftpSession {
    fn make_dir(&mut self, dir: &str) -> Result<(), TransferError> {
        let path = Path::new(dir);
        if self.sftp.stat(path).is_ok() {
            return Ok(());
        }
        debug!(dir, "creating remote directory");
        self.sftp.mkdir(path, DIR_MODE)?;
        Ok(())
    }

    fn put(&mut self, remote: &str, local: &Path) -> Result<u64, TransferError> {
        let mut file = std::fs::File::open(local)?;
        let mut remote_file = self.sftp.create(Path::new(remote))?;
        let bytes = copy_flushed(&mut file, &mut remote_file)?;
        // Dropping the handle would discard a failed close.
        remote_file.close()?;
        Ok(bytes)
    }

    fn quit(&mut self) -> Result<(), TransferError> {
        self.session.disconnect(None, "publish complete", None)?;
        Ok(())
    }
}

/// Copies `src` into `dst` and flushes, so buffered write errors surface.
fn copy_flushed(src: &mut impl Read, dst: &mut impl Write) -> Result<u64, TransferError> {
    let bytes = std::io::copy(src, dst)?;
    dst.flush()?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Accepts writes but fails the final flush, like a remote handle
    /// whose last buffered write is rejected.
    struct FailingFlush(Vec<u8>);

    impl Write for FailingFlush {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::other("quota exceeded"))
        }
    }

    #[test]
    fn copy_reports_bytes() {
        let mut dst = Vec::new();
        let bytes = copy_flushed(&mut &b"<html>"[..], &mut dst).unwrap();
        assert_eq!(bytes, 6);
        assert_eq!(dst, b"<html>");
    }

    #[test]
    fn failed_flush_is_an_upload_error() {
        let mut dst = FailingFlush(Vec::new());
        let result = copy_flushed(&mut &b"<html>"[..], &mut dst);
        assert!(matches!(result, Err(TransferError::Io(_))));
    }
}
