//! FTP sessions via `suppaftp`.

use std::net::TcpStream;
use std::path::Path;
use std::time::Duration;

use sitepub_config::RemoteServerConfig;
use suppaftp::FtpStream;
use suppaftp::types::FileType;
use tracing::{debug, info};

use super::session::{ServerSession, SessionOpener, resolve_addr};
use crate::error::TransferError;

/// Opens plain FTP sessions in binary mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct FtpOpener;

impl SessionOpener for FtpOpener {
    fn open(
        &self,
        server: &RemoteServerConfig,
        timeout: Duration,
    ) -> Result<Box<dyn ServerSession>, TransferError> {
        let addr = resolve_addr(server)?;
        debug!(%addr, "connecting to FTP server");

        // Every read and write on the control connection is bounded, so a
        // server that goes silent cannot pin the worker thread.
        let tcp = TcpStream::connect_timeout(&addr, timeout)?;
        let io_timeout = Some(timeout).filter(|t| !t.is_zero());
        tcp.set_read_timeout(io_timeout)?;
        tcp.set_write_timeout(io_timeout)?;

        let mut stream = FtpStream::connect_with_stream(tcp)?;
        stream.login(server.user.as_str(), server.password.as_str())?;
        stream.transfer_type(FileType::Binary)?;

        info!(%addr, user = %server.user, "FTP login succeeded");
        Ok(Box::new(FtpSession { stream, io_timeout }))
    }
}

struct FtpSession {
    stream: FtpStream,
    io_timeout: Option<Duration>,
}

impl ServerSession for FtpSession {
    fn make_dir(&mut self, dir: &str) -> Result<(), TransferError> {
        // FTP has no portable "exists" query; MKD on an existing directory
        // fails, and a genuinely missing one surfaces on the following STOR.
        if let Err(e) = self.stream.mkdir(dir) {
            debug!(dir, error = %e, "MKD refused");
        }
        Ok(())
    }

    fn put(&mut self, remote: &str, local: &Path) -> Result<u64, TransferError> {
        let mut file = std::fs::File::open(local)?;
        let mut data = self.stream.put_with_stream(remote)?;
        data.get_ref().set_write_timeout(self.io_timeout)?;
        let bytes = std::io::copy(&mut file, &mut data)?;
        self.stream.finalize_put_stream(data)?;
        Ok(bytes)
    }

    fn quit(&mut self) -> Result<(), TransferError> {
        Ok(self.stream.quit()?)
    }
}
