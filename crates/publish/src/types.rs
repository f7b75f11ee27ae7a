//! Data types for the publish flow.

use std::fmt;

use sitepub_transfer::TargetKind;

use crate::error::PublishError;

/// One file that could not be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFailure {
    /// Path relative to the output root.
    pub file: String,
    pub target: TargetKind,
    pub cause: String,
}

impl fmt::Display for UploadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: {}", self.file, self.target, self.cause)
    }
}

/// Terminal result of an enabled publish run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Every routed file reached its target.
    Success { uploaded: usize },
    /// Required fields are missing; nothing was contacted.
    ConfigInvalid(String),
    /// The build output could not be read; nothing was contacted.
    EnumerationFailed(String),
    /// A target never became ready. Targets already connected were closed.
    ConnectionFailed { target: TargetKind, cause: String },
    /// All targets connected but some files failed.
    PartialFailure(Vec<UploadFailure>),
}

impl PublishOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl From<PublishError> for PublishOutcome {
    fn from(err: PublishError) -> Self {
        match err {
            PublishError::Config(e) => Self::ConfigInvalid(e.to_string()),
            PublishError::Artifacts(e) => Self::EnumerationFailed(e.to_string()),
            PublishError::Connection { target, source } => Self::ConnectionFailed {
                target,
                cause: source.to_string(),
            },
        }
    }
}

impl fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { uploaded } => write!(f, "published {uploaded} file(s)"),
            Self::ConfigInvalid(cause) => f.write_str(cause),
            Self::EnumerationFailed(cause) => f.write_str(cause),
            Self::ConnectionFailed { target, cause } => {
                write!(f, "cannot connect to {target}: {cause}")
            }
            Self::PartialFailure(failures) => {
                write!(f, "{} file(s) failed to upload", failures.len())
            }
        }
    }
}
