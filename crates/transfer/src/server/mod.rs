//! FTP/SFTP file-server target.
//!
//! Protocol libraries here are blocking and their sessions are not safe
//! for concurrent use, so each target owns one worker on the blocking
//! pool. The worker opens the session, reports readiness exactly once,
//! then executes commands one at a time until told to quit.
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──ready──▶ Ready ◀──▶ Uploading
//!                               │                   │
//!                      error / closed / timeout    close
//!                               ▼                   ▼
//!                             Failed              Closed
//! ```

mod ftp;
mod session;
mod sftp;

pub use ftp::FtpOpener;
pub use session::{ServerSession, SessionOpener};
pub use sftp::SftpOpener;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use sitepub_config::{Protocol, RemoteServerConfig};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::error::TransferError;
use crate::target::{TargetKind, TransferFuture, TransferTarget};

/// Lifecycle of a file-server session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Ready,
    Uploading,
    Closed,
    Failed,
}

enum Command {
    Put {
        remote: String,
        local: PathBuf,
        reply: oneshot::Sender<Result<u64, TransferError>>,
    },
    Quit {
        reply: oneshot::Sender<Result<(), TransferError>>,
    },
}

/// Uploads build files over one FTP or SFTP session.
pub struct RemoteServerTarget {
    config: RemoteServerConfig,
    opener: Arc<dyn SessionOpener>,
    connect_timeout: Duration,
    state: SessionState,
    commands: Option<mpsc::Sender<Command>>,
}

impl RemoteServerTarget {
    /// Target using the session library for the configured protocol.
    pub fn new(config: RemoteServerConfig, connect_timeout: Duration) -> Self {
        let opener: Arc<dyn SessionOpener> = match config.protocol {
            Protocol::Ftp => Arc::new(FtpOpener),
            Protocol::Sftp => Arc::new(SftpOpener),
        };
        Self::with_opener(config, connect_timeout, opener)
    }

    /// Target using a caller-supplied opener.
    pub fn with_opener(
        config: RemoteServerConfig,
        connect_timeout: Duration,
        opener: Arc<dyn SessionOpener>,
    ) -> Self {
        Self {
            config,
            opener,
            connect_timeout,
            state: SessionState::Disconnected,
            commands: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    async fn do_connect(&mut self) -> Result<(), TransferError> {
        match self.state {
            SessionState::Ready => return Ok(()),
            SessionState::Disconnected => {}
            other => return Err(TransferError::NotReady(other)),
        }

        self.state = SessionState::Connecting;
        let address = self.config.address();
        info!(%address, protocol = %self.config.protocol, "waiting for server session");

        let (ready_tx, ready_rx) = oneshot::channel();
        let (cmd_tx, cmd_rx) = mpsc::channel(1);
        let opener = self.opener.clone();
        let config = self.config.clone();
        let timeout = self.connect_timeout;
        tokio::task::spawn_blocking(move || run_worker(opener, config, timeout, ready_tx, cmd_rx));

        // Exactly one of: ready, error, premature close, or the deadline.
        // On any failure `cmd_tx` is dropped here, which stops a worker
        // that becomes ready late.
        match tokio::time::timeout(self.connect_timeout, ready_rx).await {
            Ok(Ok(Ok(()))) => {
                self.commands = Some(cmd_tx);
                self.state = SessionState::Ready;
                info!(%address, "server session ready");
                Ok(())
            }
            Ok(Ok(Err(e))) => {
                self.state = SessionState::Failed;
                warn!(%address, error = %e, "server session error");
                Err(e)
            }
            Ok(Err(_)) => {
                self.state = SessionState::Failed;
                warn!(%address, "server session closed before ready");
                Err(TransferError::Closed)
            }
            Err(_) => {
                self.state = SessionState::Failed;
                warn!(%address, timeout = ?self.connect_timeout, "server session not ready in time");
                Err(TransferError::Timeout(self.connect_timeout))
            }
        }
    }

    async fn do_upload(&mut self, remote_path: &str, local_path: &Path) -> Result<(), TransferError> {
        if self.state != SessionState::Ready {
            return Err(TransferError::NotReady(self.state));
        }
        crate::validate_remote_path(remote_path)?;
        let Some(commands) = self.commands.as_ref() else {
            return Err(TransferError::NotReady(self.state));
        };

        self.state = SessionState::Uploading;
        let (reply_tx, reply_rx) = oneshot::channel();
        let cmd = Command::Put {
            remote: remote_path.to_string(),
            local: local_path.to_path_buf(),
            reply: reply_tx,
        };

        if commands.send(cmd).await.is_err() {
            return Err(self.fail_closed());
        }
        let Ok(result) = reply_rx.await else {
            return Err(self.fail_closed());
        };

        self.state = SessionState::Ready;
        let bytes = result?;
        debug!(remote = %remote_path, bytes, "file stored on server");
        Ok(())
    }

    async fn do_close(&mut self) -> Result<(), TransferError> {
        let commands = self.commands.take();
        if matches!(self.state, SessionState::Closed | SessionState::Disconnected) {
            return Ok(());
        }
        self.state = SessionState::Closed;

        let Some(commands) = commands else {
            return Ok(());
        };
        let (reply_tx, reply_rx) = oneshot::channel();
        if commands.send(Command::Quit { reply: reply_tx }).await.is_err() {
            return Ok(());
        }

        match tokio::time::timeout(self.connect_timeout, reply_rx).await {
            Ok(Ok(result)) => {
                debug!(address = %self.config.address(), "server session closed");
                result
            }
            // Worker already gone: nothing left to release.
            Ok(Err(_)) => Ok(()),
            Err(_) => Err(TransferError::Timeout(self.connect_timeout)),
        }
    }

    /// Marks the session dead after the worker went away mid-operation.
    fn fail_closed(&mut self) -> TransferError {
        warn!(address = %self.config.address(), "server session closed unexpectedly");
        self.state = SessionState::Failed;
        self.commands = None;
        TransferError::Closed
    }
}

impl TransferTarget for RemoteServerTarget {
    fn kind(&self) -> TargetKind {
        TargetKind::RemoteServer(self.config.protocol)
    }

    fn connect(&mut self) -> TransferFuture<'_, ()> {
        Box::pin(self.do_connect())
    }

    fn upload_file<'a>(
        &'a mut self,
        remote_path: &'a str,
        local_path: &'a Path,
    ) -> TransferFuture<'a, ()> {
        Box::pin(self.do_upload(remote_path, local_path))
    }

    fn close(&mut self) -> TransferFuture<'_, ()> {
        Box::pin(self.do_close())
    }
}

fn run_worker(
    opener: Arc<dyn SessionOpener>,
    config: RemoteServerConfig,
    timeout: Duration,
    ready: oneshot::Sender<Result<(), TransferError>>,
    mut commands: mpsc::Receiver<Command>,
) {
    let mut session = match opener.open(&config, timeout) {
        Ok(session) => session,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    if ready.send(Ok(())).is_err() {
        // The target stopped waiting; release the session we just opened.
        let _ = session.quit();
        return;
    }

    let mut known_dirs = HashSet::new();
    while let Some(cmd) = commands.blocking_recv() {
        match cmd {
            Command::Put {
                remote,
                local,
                reply,
            } => {
                let result = put_with_dirs(session.as_mut(), &mut known_dirs, &remote, &local);
                let _ = reply.send(result);
            }
            Command::Quit { reply } => {
                let _ = reply.send(session.quit());
                return;
            }
        }
    }

    // Target dropped without closing.
    let _ = session.quit();
}

fn put_with_dirs(
    session: &mut dyn ServerSession,
    known_dirs: &mut HashSet<String>,
    remote: &str,
    local: &Path,
) -> Result<u64, TransferError> {
    for dir in session::parent_dirs(remote) {
        if known_dirs.contains(&dir) {
            continue;
        }
        session.make_dir(&dir)?;
        known_dirs.insert(dir);
    }
    session.put(remote, local)
}
