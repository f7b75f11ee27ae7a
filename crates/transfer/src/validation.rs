use std::path::{Component, Path};

use crate::TransferError;

/// Validates a remote path before it is sent to a target.
///
/// Rejects:
/// - Empty paths
/// - Parent directory traversal (`..`)
/// - Windows prefix components (`C:`, `\\server`)
///
/// Absolute paths are fine: remote roots usually are.
pub fn validate_remote_path(remote_path: &str) -> Result<(), TransferError> {
    if remote_path.trim().is_empty() {
        return Err(TransferError::InvalidPath("empty path".into()));
    }

    for component in Path::new(remote_path).components() {
        match component {
            Component::ParentDir => {
                return Err(TransferError::InvalidPath(format!(
                    "parent directory traversal not allowed: {remote_path}"
                )));
            }
            Component::Prefix(_) => {
                return Err(TransferError::InvalidPath(format!(
                    "path prefix not allowed: {remote_path}"
                )));
            }
            Component::RootDir | Component::CurDir | Component::Normal(_) => {}
        }
    }

    Ok(())
}
