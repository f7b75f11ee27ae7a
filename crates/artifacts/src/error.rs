//! Artifact error types.

use std::path::PathBuf;

/// Errors produced while reading the build output.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("output directory not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("output path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("{} is outside the output root {}", file.display(), root.display())]
    OutsideRoot { file: PathBuf, root: PathBuf },
}
