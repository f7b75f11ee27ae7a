//! Progress reporting.
//!
//! The publisher emits an ordered stream of [`ProgressEvent`]s. Reporting
//! is fire-and-forget: a reporter cannot fail the run.

use std::fmt;

use sitepub_transfer::TargetKind;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Lifecycle event of a publish run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    CheckingConfig,
    Connecting(TargetKind),
    Ready(TargetKind),
    Uploaded {
        file: String,
        target: TargetKind,
        remote_path: String,
        /// Public URL, for files served from object storage.
        url: Option<String>,
    },
    Warning(String),
    Failed(String),
    Succeeded,
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CheckingConfig => f.write_str("checking publish configuration"),
            Self::Connecting(target) => write!(f, "connecting to {target}"),
            Self::Ready(target) => write!(f, "{target} ready"),
            Self::Uploaded {
                file,
                target,
                remote_path,
                url,
            } => {
                write!(f, "uploaded {file} to {target} at {remote_path}")?;
                if let Some(url) = url {
                    write!(f, " ({url})")?;
                }
                Ok(())
            }
            Self::Warning(msg) => write!(f, "warning: {msg}"),
            Self::Failed(reason) => write!(f, "publish failed: {reason}"),
            Self::Succeeded => f.write_str("publish succeeded"),
        }
    }
}

/// Receives lifecycle events.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Forwards events to a channel. A full or closed channel drops the event.
impl ProgressReporter for mpsc::Sender<ProgressEvent> {
    fn report(&self, event: ProgressEvent) {
        let _ = self.try_send(event);
    }
}

/// Renders each event as one log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, event: ProgressEvent) {
        match &event {
            ProgressEvent::Warning(_) => warn!("{event}"),
            ProgressEvent::Failed(_) => error!("{event}"),
            _ => info!("{event}"),
        }
    }
}
