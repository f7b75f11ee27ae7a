//! Build context handed over when the build finishes.

use std::path::{Path, PathBuf};

use crate::error::ArtifactError;

/// What the build tool reports once its output is complete.
///
/// Built once per build and passed by value into the publisher; nothing
/// about it changes for the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    /// Public base of the site, usually a URL such as `https://cdn.example.com/app/`.
    pub base_path: String,
    /// Output directory, absolute or relative to the working directory.
    pub output_dir: PathBuf,
}

impl BuildContext {
    pub fn new(base_path: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Resolves the output directory to an absolute path.
    pub fn output_root(&self) -> Result<PathBuf, ArtifactError> {
        absolute(&self.output_dir)
    }
}

fn absolute(path: &Path) -> Result<PathBuf, ArtifactError> {
    Ok(std::path::absolute(path)?)
}
