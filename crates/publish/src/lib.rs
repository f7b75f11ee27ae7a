//! Publish flow for sitepub.
//!
//! Runs once the build has finished and its output is complete.
//!
//! # Pipeline
//!
//! 1. **Check**: validate the resolved configuration
//! 2. **Scan**: enumerate the build output
//! 3. **Route**: everything to object storage and HTML to the file
//!    server, or everything to the file server alone
//! 4. **Connect**: storage first, then the file server
//! 5. **Upload**: sequentially, recording per-file failures
//! 6. **Close**: every connected target, on every path

pub mod error;
pub mod factory;
pub mod orchestrator;
pub mod reporter;
pub mod routing;
pub mod types;

pub use error::PublishError;
pub use factory::{DefaultTargetFactory, TargetFactory};
pub use orchestrator::Publisher;
pub use reporter::{ProgressEvent, ProgressReporter, TracingReporter};
pub use routing::{Destination, Route, route};
pub use types::{PublishOutcome, UploadFailure};
