//! Publish error types.

use sitepub_artifacts::ArtifactError;
use sitepub_config::ConfigError;
use sitepub_transfer::{TargetKind, TransferError};

/// Errors that end a publish run before or while connecting.
///
/// Per-file upload errors never become a `PublishError`; they are
/// collected into [`crate::PublishOutcome::PartialFailure`].
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot read build output: {0}")]
    Artifacts(#[from] ArtifactError),

    #[error("cannot connect to {target}: {source}")]
    Connection {
        target: TargetKind,
        #[source]
        source: TransferError,
    },
}
