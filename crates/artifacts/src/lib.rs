//! Build artifacts: what the build produced and where each file goes.
//!
//! - [`BuildContext`] is handed over once the build has finished.
//! - [`enumerate`] scans the output directory into a [`BuildArtifactSet`].
//! - [`paths`] derives object keys and server paths from relative paths.

pub mod context;
pub mod error;
pub mod paths;
pub mod scanner;

pub use context::BuildContext;
pub use error::ArtifactError;
pub use paths::{base_dir, base_origin, join_remote, public_url, relative_path};
pub use scanner::{BuildArtifactSet, enumerate};
